// ============================================================
// Layer 6 — Pretrained Weights
// ============================================================
// Restores the starting point for fine-tuning:
//
//   model_config.json  → KeywordTransformerConfig (architecture)
//   <name>.mpk.gz      → parameter record from Burn's
//                        CompactRecorder
//
// Nothing is written back: the fine-tuned weights live only for
// the duration of the run.
//
// Burn's CompactRecorder:
//   - MessagePack records, gzip compressed, half precision
//   - Type-safe: loading fails if the architecture differs
//
// Reference: Burn Book §5 (Records)

use anyhow::{Context, Result};
use std::path::Path;
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::ml::model::{KeywordTransformer, KeywordTransformerConfig};

pub struct WeightStore;

impl WeightStore {
    /// Read an architecture config saved as JSON.
    pub fn load_config(path: &Path) -> Result<KeywordTransformerConfig> {
        KeywordTransformerConfig::load(path).map_err(|e| {
            anyhow::anyhow!("Cannot read model config '{}': {e}", path.display())
        })
    }

    /// Load pretrained parameters into a freshly initialised model.
    ///
    /// `path` is given without the `.mpk.gz` extension, as Burn's
    /// recorders append it themselves.
    pub fn load_weights<B: Backend>(
        model:  KeywordTransformer<B>,
        path:   &Path,
        device: &B::Device,
    ) -> Result<KeywordTransformer<B>> {
        tracing::info!("Loading pretrained weights from '{}'", path.display());

        let record = CompactRecorder::new()
            .load(path.to_path_buf(), device)
            .with_context(|| {
                format!("Cannot load weights '{}'. Does the architecture match?", path.display())
            })?;

        Ok(model.load_record(record))
    }
}
