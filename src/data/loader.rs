// ============================================================
// Layer 4 — CSV Record Loader
// ============================================================
// Reads the tabular dataset and pulls out the two text columns
// the model works with (by default `transcription` and
// `keywords`).
//
// The location may be a local path or an http(s) URL. Remote
// files are fetched once, in full, with ureq and then parsed
// exactly like a local file.
//
// An empty cell is reported as `None` so the cleaner can drop
// the row. Columns other than the two selected are ignored.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, Read},
};

use crate::domain::record::RawRow;
use crate::domain::traits::RecordSource;

/// Loads (source, target) columns from a CSV file or URL.
/// Implements the RecordSource trait from Layer 3.
pub struct CsvSource {
    /// Local path or http(s) URL of the CSV file
    location: String,
    /// Header name of the transcription column
    source_column: String,
    /// Header name of the keywords column
    target_column: String,
}

impl CsvSource {
    pub fn new(
        location:      impl Into<String>,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            location:      location.into(),
            source_column: source_column.into(),
            target_column: target_column.into(),
        }
    }

    fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }

    /// Fetch the whole file as text.
    fn read_location(&self) -> Result<String> {
        if self.is_remote() {
            tracing::info!("Downloading dataset from '{}'", self.location);
            let response = ureq::get(&self.location)
                .call()
                .with_context(|| format!("HTTP request to '{}' failed", self.location))?;

            // into_string() caps the body at 10 MB; read the stream instead
            let mut body = String::new();
            response
                .into_reader()
                .read_to_string(&mut body)
                .with_context(|| format!("Cannot read response body from '{}'", self.location))?;
            Ok(body)
        } else {
            fs::read_to_string(&self.location)
                .with_context(|| format!("Cannot read '{}'", self.location))
        }
    }
}

impl RecordSource for CsvSource {
    fn load_all(&self) -> Result<Vec<RawRow>> {
        let text = self.read_location()?;
        let rows = parse_rows(text.as_bytes(), &self.source_column, &self.target_column)
            .with_context(|| format!("Cannot parse CSV from '{}'", self.location))?;

        tracing::info!("Loaded {} rows from '{}'", rows.len(), self.location);
        Ok(rows)
    }
}

/// Parse CSV text with a header row, selecting two named columns.
///
/// Fails if either column is absent from the header. Cells that are
/// missing (short rows) or empty become `None`.
pub fn parse_rows<R: io::Read>(
    reader:        R,
    source_column: &str,
    target_column: &str,
) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("Cannot read CSV header row")?.clone();
    let column_index = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| {
                let available: Vec<&str> = headers.iter().collect();
                format!("Column '{name}' not found; available columns: {available:?}")
            })
    };
    let source_idx = column_index(source_column)?;
    let target_idx = column_index(target_column)?;

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record #{}", line + 1))?;

        let cell = |idx: usize| record.get(idx).filter(|v| !v.is_empty());
        rows.push(RawRow::new(cell(source_idx), cell(target_idx)));
    }

    Ok(rows)
}
