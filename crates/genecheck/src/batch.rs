//! Batch input loading and the sequential batch driver.

use crate::cascade::{CascadeController, ItemOutcome};
use crate::config::InputConfig;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use gene_shared::WorkItem;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

// ============================================================================
// Input
// ============================================================================

/// Read `(id, subjects)` rows from CSV with a header row.
///
/// Rows with an empty id are skipped. `limit` caps the number of items.
pub fn read_items<R: Read>(input: R, columns: &InputConfig, limit: Option<usize>) -> Result<Vec<WorkItem>> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers().context("Failed to read CSV header")?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("Column '{}' not found in header {:?}", name, headers))
    };
    let id_at = column(&columns.id_column)?;
    let subjects_at = column(&columns.subjects_column)?;

    let mut items = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        if limit.is_some_and(|limit| items.len() >= limit) {
            break;
        }
        let row = row.with_context(|| format!("Failed to read row {}", idx + 1))?;
        let id = row.get(id_at).unwrap_or_default().trim();
        if id.is_empty() {
            warn!("Skipping row {}: empty id", idx + 1);
            continue;
        }
        let item = WorkItem::from_raw(id, row.get(subjects_at).unwrap_or_default());
        if item.is_empty() {
            warn!("Row {} ({}) has no subjects", idx + 1, id);
        }
        items.push(item);
    }

    Ok(items)
}

/// Load work items from a CSV file.
pub fn load_csv(path: &Path, columns: &InputConfig, limit: Option<usize>) -> Result<Vec<WorkItem>> {
    let file = File::open(path).with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let items = read_items(file, columns, limit)?;
    if items.is_empty() {
        bail!("No work items in {}", path.display());
    }
    info!("Loaded {} items from {}", items.len(), path.display());
    Ok(items)
}

// ============================================================================
// Driver
// ============================================================================

/// Result of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub completed: usize,
    /// Ids of failed items, in input order
    pub failed: Vec<String>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.completed + self.failed.len()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "run {}: {}/{} items completed in {}s",
            self.run_id,
            self.completed,
            self.total(),
            self.elapsed().num_seconds()
        )?;
        if !self.failed.is_empty() {
            write!(f, ", failed: {}", self.failed.join(", "))?;
        }
        Ok(())
    }
}

/// Runs items through the cascade one at a time.
pub struct BatchDriver {
    controller: CascadeController,
    progress: Option<ProgressBar>,
}

impl BatchDriver {
    pub fn new(controller: CascadeController) -> Self {
        Self {
            controller,
            progress: None,
        }
    }

    /// Show a progress bar while running.
    pub fn with_progress(mut self) -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{elapsed_precise} [{bar:40}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        self.progress = Some(bar);
        self
    }

    /// Process every item in order. Item failures never stop the batch.
    pub async fn run(&self, items: &[WorkItem]) -> BatchSummary {
        let run_id = Uuid::new_v4();
        let span = info_span!("batch", run_id = %run_id);
        self.run_items(run_id, items).instrument(span).await
    }

    async fn run_items(&self, run_id: Uuid, items: &[WorkItem]) -> BatchSummary {
        let started_at = Utc::now();
        info!("Starting batch of {} items", items.len());
        if let Some(bar) = &self.progress {
            bar.set_length(items.len() as u64);
        }

        let mut completed = 0;
        let mut failed = Vec::new();
        for item in items {
            if let Some(bar) = &self.progress {
                bar.set_message(item.id.clone());
            }

            let outcome = self
                .controller
                .run_item(item)
                .instrument(info_span!("item", id = %item.id))
                .await;
            match outcome {
                ItemOutcome::Completed(_) => completed += 1,
                ItemOutcome::Failed(_) => failed.push(outcome.item_id().to_string()),
            }

            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
        }

        if let Some(bar) = &self.progress {
            bar.finish_with_message("done");
        }

        let summary = BatchSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            completed,
            failed,
        };
        info!("{}", summary);
        summary
    }
}
