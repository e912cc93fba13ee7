// ============================================================
// Layer 5 — Keyword Generator
// ============================================================
// Runs the fine-tuned model over held-out records:
//
//   transcription → ids (same length/padding policy as training)
//                 → greedy decoding, min/max length constrained
//                 → text with special tokens stripped
//
// Each record comes back paired with its generated keywords so
// the CLI can print them next to the ground truth.

use anyhow::{ensure, Result};
use burn::prelude::*;
use serde::Serialize;

use crate::data::batcher::stack_ids;
use crate::domain::record::Record;
use crate::domain::sequence::SequencePolicy;
use crate::domain::traits::TextCodec;
use crate::ml::seq2seq::{GenerationOptions, Seq2SeqModel};

/// A held-out record with the model's keywords attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub record:    Record,
    pub generated: String,
}

pub struct KeywordGenerator<'a> {
    codec:      &'a dyn TextCodec,
    policy:     SequencePolicy,
    options:    GenerationOptions,
    batch_size: usize,
}

impl<'a> KeywordGenerator<'a> {
    pub fn new(
        codec:      &'a dyn TextCodec,
        policy:     SequencePolicy,
        options:    GenerationOptions,
        batch_size: usize,
    ) -> Result<Self> {
        ensure!(batch_size > 0, "Generation batch size must be at least 1");
        Ok(Self { codec, policy, options, batch_size })
    }

    /// Generate keywords for every record, in input order.
    pub fn generate<B, M>(&self, model: &M, records: &[Record], device: &B::Device) -> Result<Vec<Prediction>>
    where
        B: Backend,
        M: Seq2SeqModel<B>,
    {
        let mut predictions = Vec::with_capacity(records.len());

        for (chunk_idx, chunk) in records.chunks(self.batch_size).enumerate() {
            let encoded = chunk
                .iter()
                .map(|r| self.codec.encode(&r.source, &self.policy))
                .collect::<Result<Vec<_>>>()?;
            let rows: Vec<&[u32]> = encoded.iter().map(Vec::as_slice).collect();
            let inputs = stack_ids::<B>(&rows, device);

            let output_ids = model.generate(inputs, &self.options)?;
            let texts = self.codec.decode_batch(&output_ids, true)?;

            tracing::debug!(
                "Generated batch {} ({} rows, {} ids in longest output)",
                chunk_idx,
                chunk.len(),
                output_ids.iter().map(Vec::len).max().unwrap_or(0),
            );

            predictions.extend(
                chunk
                    .iter()
                    .cloned()
                    .zip(texts)
                    .map(|(record, generated)| Prediction { record, generated }),
            );
        }

        tracing::info!("Generated keywords for {} held-out rows", predictions.len());
        Ok(predictions)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sequence::{PadSide, TruncateSide};
    use crate::test_support::{sample_records, tiny_codec, tiny_model_config};
    use burn::backend::NdArray;

    #[test]
    fn test_one_prediction_per_record_in_order() {
        let records = sample_records(5);
        let codec = tiny_codec(&records);
        let device = Default::default();
        let model = tiny_model_config(codec.vocab_size()).init::<NdArray>(&device);

        let generator = KeywordGenerator::new(
            codec.as_ref(),
            SequencePolicy::new(16, PadSide::Left, TruncateSide::Right),
            GenerationOptions { min_length: 3, max_length: 6 },
            2,
        )
        .unwrap();

        let predictions = generator.generate::<NdArray, _>(&model, &records, &device).unwrap();
        assert_eq!(predictions.len(), 5);
        for (p, r) in predictions.iter().zip(&records) {
            assert_eq!(&p.record, r);
            assert!(!p.generated.contains("<s>"));
            assert!(!p.generated.contains("</s>"));
            assert!(!p.generated.contains("<pad>"));
        }
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let records = sample_records(1);
        let codec = tiny_codec(&records);
        let result = KeywordGenerator::new(
            codec.as_ref(),
            SequencePolicy::new(16, PadSide::Left, TruncateSide::Right),
            GenerationOptions::default(),
            0,
        );
        assert!(result.is_err());
    }
}
