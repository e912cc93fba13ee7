// ============================================================
// Layer 4 — Record Cleaner
// ============================================================
// Drops every row where the transcription or the keyword list
// is missing. A cell counts as missing when it is absent, empty
// or whitespace-only.
//
// Surviving values are passed through untouched: no trimming,
// no case folding. Normalisation is the tokenizer's job.

use crate::domain::record::{RawRow, Record};

/// Outcome of a cleaning pass.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    /// Rows where both fields were present
    pub records: Vec<Record>,
    /// Rows with no usable transcription
    pub missing_source: usize,
    /// Rows with no usable keyword list
    pub missing_target: usize,
    /// Rows removed (a row missing both counts once here)
    pub dropped: usize,
}

fn present(cell: Option<String>) -> Option<String> {
    cell.filter(|v| !v.trim().is_empty())
}

/// Keep only rows with both fields present.
pub fn clean(rows: Vec<RawRow>) -> CleanReport {
    let mut report = CleanReport::default();

    for row in rows {
        let source = present(row.source);
        let target = present(row.target);

        if source.is_none() {
            report.missing_source += 1;
        }
        if target.is_none() {
            report.missing_target += 1;
        }

        match (source, target) {
            (Some(source), Some(target)) => report.records.push(Record::new(source, target)),
            _ => report.dropped += 1,
        }
    }

    tracing::info!(
        "Cleaning kept {} rows, dropped {} (missing transcription: {}, missing keywords: {})",
        report.records.len(),
        report.dropped,
        report.missing_source,
        report.missing_target,
    );

    report
}
