// ============================================================
// Layer 3 — Record Domain Types
// ============================================================
// A Record is one training example: the transcription text
// (model input) and the free-text keyword list (model target).
//
// RawRow is what comes straight out of the tabular source.
// Either column may be missing; the cleaner turns RawRows into
// Records and guarantees both fields are non-empty.

use serde::{Deserialize, Serialize};

/// One row as read from the tabular source, before cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// The transcription column, `None` when the cell is absent
    pub source: Option<String>,

    /// The keywords column, `None` when the cell is absent
    pub target: Option<String>,
}

impl RawRow {
    pub fn new(source: Option<&str>, target: Option<&str>) -> Self {
        Self {
            source: source.map(str::to_string),
            target: target.map(str::to_string),
        }
    }
}

/// A cleaned (transcription, keywords) pair.
///
/// Invariant: both fields contain at least one non-whitespace
/// character. Records are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Medical transcription text fed to the encoder
    pub source: String,

    /// Comma-separated keywords the decoder learns to produce
    pub target: String,
}

impl Record {
    /// Create a new Record.
    /// Uses impl Into<String> so callers can pass &str or String.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Whitespace-separated word count of the transcription
    pub fn source_words(&self) -> usize {
        self.source.split_whitespace().count()
    }

    /// Whitespace-separated word count of the keyword list
    pub fn target_words(&self) -> usize {
        self.target.split_whitespace().count()
    }
}
