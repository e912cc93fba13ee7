// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Summarises how long transcriptions and keyword lists are,
// counted in whitespace-separated words, after cleaning.
// Nothing here affects training; it only informs the choice of
// --max-source-len / --max-target-len.

use anyhow::{ensure, Result};
use serde::Serialize;

use crate::application::load_clean;
use crate::data::stats::LengthReport;

/// What `inspect` found.
#[derive(Debug, Clone, Serialize)]
pub struct InspectOutcome {
    pub rows_kept:      usize,
    pub missing_source: usize,
    pub missing_target: usize,
    pub lengths:        LengthReport,
}

pub struct InspectUseCase {
    location:      String,
    source_column: String,
    target_column: String,
    bins:          usize,
}

impl InspectUseCase {
    pub fn new(
        location:      impl Into<String>,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
        bins:          usize,
    ) -> Self {
        Self {
            location:      location.into(),
            source_column: source_column.into(),
            target_column: target_column.into(),
            bins,
        }
    }

    pub fn execute(&self) -> Result<InspectOutcome> {
        ensure!(self.bins > 0, "Histogram needs at least one bin");

        let cleaned = load_clean(&self.location, &self.source_column, &self.target_column)?;
        let lengths = LengthReport::from_records(&cleaned.records, self.bins)
            .ok_or_else(|| anyhow::anyhow!("No usable rows in '{}' after cleaning", self.location))?;

        tracing::info!(
            "Transcription words: p95={:.1}, max={} | keyword words: p95={:.1}, max={}",
            lengths.source.p95, lengths.source.max,
            lengths.target.p95, lengths.target.max,
        );

        Ok(InspectOutcome {
            rows_kept:      cleaned.records.len(),
            missing_source: cleaned.missing_source,
            missing_target: cleaned.missing_target,
            lengths,
        })
    }
}
