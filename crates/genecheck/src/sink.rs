//! Append-only audit logs.
//!
//! Three channels, each a plain text file:
//! - baseline: `{narrative}\n//\n` per item
//! - verification: `{claims}\n&&\n` per round, `{claim}\n{report}\n&&\n` per
//!   claim, `////\n` after a completed item
//! - final: `{text}\n//\n` per completed item, or an error line per failure
//!
//! A record is rendered in full and written with one `write_all` while the
//! channel lock is held, so concurrent writers never interleave records.

use crate::config::OutputConfig;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Baseline,
    Verification,
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkRecord {
    Baseline { text: String },
    /// Claims of one extraction round, as the model returned them
    ClaimList { claims: Vec<String> },
    ClaimCheck { claim: String, report: String },
    ItemEnd,
    Final { text: String },
    Failure { item_id: String, message: String },
}

impl SinkRecord {
    pub fn channel(&self) -> Channel {
        match self {
            SinkRecord::Baseline { .. } => Channel::Baseline,
            SinkRecord::ClaimList { .. } | SinkRecord::ClaimCheck { .. } | SinkRecord::ItemEnd => {
                Channel::Verification
            }
            SinkRecord::Final { .. } | SinkRecord::Failure { .. } => Channel::Final,
        }
    }

    pub fn render(&self) -> String {
        match self {
            SinkRecord::Baseline { text } | SinkRecord::Final { text } => format!("{}\n//\n", text),
            SinkRecord::ClaimList { claims } => {
                format!("{}\n&&\n", serde_json::Value::from(claims.clone()))
            }
            SinkRecord::ClaimCheck { claim, report } => format!("{}\n{}\n&&\n", claim, report),
            SinkRecord::ItemEnd => "////\n".to_string(),
            SinkRecord::Failure { item_id, message } => {
                format!("{}\t==== error: {} ====\n//\n", item_id, message)
            }
        }
    }
}

/// Destination for audit records
pub trait ArtifactSink: Send + Sync {
    fn append(&self, record: &SinkRecord) -> io::Result<()>;
}

// ============================================================================
// File sink
// ============================================================================

/// Writes each channel to its own append-mode file.
pub struct FileSink {
    baseline: Mutex<File>,
    verification: Mutex<File>,
    final_log: Mutex<File>,
}

impl FileSink {
    /// Open (creating parents) the three configured logs.
    pub fn from_config(config: &OutputConfig) -> io::Result<Self> {
        Ok(Self {
            baseline: Mutex::new(open_append(&config.baseline_log)?),
            verification: Mutex::new(open_append(&config.verification_log)?),
            final_log: Mutex::new(open_append(&config.final_log)?),
        })
    }

    fn file(&self, channel: Channel) -> &Mutex<File> {
        match channel {
            Channel::Baseline => &self.baseline,
            Channel::Verification => &self.verification,
            Channel::Final => &self.final_log,
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    debug!("Opening log {}", path.display());
    OpenOptions::new().create(true).append(true).open(path)
}

impl ArtifactSink for FileSink {
    fn append(&self, record: &SinkRecord) -> io::Result<()> {
        let rendered = record.render();
        let mut file = self
            .file(record.channel())
            .lock()
            .map_err(|_| io::Error::other("log lock poisoned"))?;
        file.write_all(rendered.as_bytes())?;
        file.flush()
    }
}

// ============================================================================
// Memory sink
// ============================================================================

/// Keeps records in memory, for tests.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<SinkRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SinkRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Everything written to `channel`, as it would appear on disk.
    pub fn contents(&self, channel: Channel) -> String {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.channel() == channel)
            .map(SinkRecord::render)
            .collect()
    }
}

impl ArtifactSink for MemorySink {
    fn append(&self, record: &SinkRecord) -> io::Result<()> {
        self.records
            .lock()
            .map_err(|_| io::Error::other("memory sink lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}
