//! Batch work items.

use serde::{Deserialize, Serialize};

/// Canonical delimiter between subjects.
pub const SUBJECT_DELIMITER: char = ',';

/// Split a raw subject string on `/`, whitespace and commas.
///
/// Empty segments are dropped; order and duplicates are kept.
pub fn normalize_subjects(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == '/' || c == SUBJECT_DELIMITER || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// One unit of batch input: an id plus its ordered subject set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub subject_set: Vec<String>,
}

impl WorkItem {
    pub fn new(id: impl Into<String>, subject_set: Vec<String>) -> Self {
        Self {
            id: id.into(),
            subject_set,
        }
    }

    /// Build from a raw `(id, subjects)` input row.
    pub fn from_raw(id: impl Into<String>, raw_subjects: &str) -> Self {
        Self::new(id, normalize_subjects(raw_subjects))
    }

    /// Subjects joined with the canonical delimiter, e.g. `A,B,C`.
    pub fn joined(&self) -> String {
        self.subject_set.join(&SUBJECT_DELIMITER.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.subject_set.is_empty()
    }
}
