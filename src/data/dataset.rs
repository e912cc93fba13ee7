use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::record::Record;
use crate::domain::sequence::SequencePolicy;
use crate::domain::traits::TextCodec;

/// One record encoded to fixed-length id sequences.
/// `source_ids.len() == L_in`, `target_ids.len() == L_out`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPair {
    /// Position of the record inside its dataset
    pub index:      usize,
    pub source_ids: Vec<u32>,
    pub target_ids: Vec<u32>,
}

/// Wraps cleaned records and tokenizes them on access.
///
/// Nothing is cached: every `encode_pair` runs the codec again.
pub struct KeywordDataset {
    records:       Vec<Record>,
    codec:         Arc<dyn TextCodec>,
    source_policy: SequencePolicy,
    target_policy: SequencePolicy,
}

impl KeywordDataset {
    pub fn new(
        records:       Vec<Record>,
        codec:         Arc<dyn TextCodec>,
        source_policy: SequencePolicy,
        target_policy: SequencePolicy,
    ) -> Self {
        Self { records, codec, source_policy, target_policy }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Encode the record at `index`, surfacing tokenizer failures.
    pub fn encode_pair(&self, index: usize) -> Result<EncodedPair> {
        let record = self
            .records
            .get(index)
            .with_context(|| format!("Record index {index} out of range ({} records)", self.records.len()))?;

        let source_ids = self
            .codec
            .encode(&record.source, &self.source_policy)
            .with_context(|| format!("Cannot encode transcription of record {index}"))?;
        let target_ids = self
            .codec
            .encode(&record.target, &self.target_policy)
            .with_context(|| format!("Cannot encode keywords of record {index}"))?;

        Ok(EncodedPair { index, source_ids, target_ids })
    }
}
