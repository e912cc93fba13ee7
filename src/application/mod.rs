// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
//
//   train   — load, clean, split, fine-tune, generate keywords
//   inspect — load, clean, summarise field lengths
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

use anyhow::Result;

use crate::data::{cleaner::{clean, CleanReport}, loader::CsvSource};
use crate::domain::traits::RecordSource;

/// The fine-tuning workflow
pub mod train_use_case;

/// The dataset length report
pub mod inspect_use_case;

/// Read the CSV at `location` and drop rows with a missing field.
fn load_clean(location: &str, source_column: &str, target_column: &str) -> Result<CleanReport> {
    let source = CsvSource::new(location, source_column, target_column);
    Ok(clean(source.load_all()?))
}
