// ============================================================
// Layer 4 — Seq2Seq Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<EncodedPair>
// into two integer tensors:
//
//   inputs: [batch, L_in]    — transcription ids
//   labels: [batch, L_out]   — keyword ids
//
// Every pair is already padded to the same lengths, so batching
// is a flatten + reshape, no dynamic padding needed.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::EncodedPair;

/// A batch of aligned (source, target) sequences.
#[derive(Debug, Clone)]
pub struct Seq2SeqBatch<B: Backend> {
    /// Transcription ids, shape: [batch_size, L_in]
    pub inputs: Tensor<B, 2, Int>,

    /// Keyword ids used as supervision, shape: [batch_size, L_out]
    pub labels: Tensor<B, 2, Int>,

    /// Dataset indices of the rows, in batch order
    pub indices: Vec<usize>,
}

/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct Seq2SeqBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> Seq2SeqBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Stack `rows` (all of equal length) into a [rows, len] tensor.
pub fn stack_ids<B: Backend>(rows: &[&[u32]], device: &B::Device) -> Tensor<B, 2, Int> {
    let batch_size = rows.len();
    let seq_len    = rows.first().map(|r| r.len()).unwrap_or(0);

    // Burn Int tensors are built from i32 here; token ids fit comfortably
    let flat: Vec<i32> = rows
        .iter()
        .flat_map(|r| r.iter().map(|&x| x as i32))
        .collect();

    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape([batch_size, seq_len])
}

impl<B: Backend> Batcher<EncodedPair, Seq2SeqBatch<B>> for Seq2SeqBatcher<B> {
    fn batch(&self, items: Vec<EncodedPair>) -> Seq2SeqBatch<B> {
        let sources: Vec<&[u32]> = items.iter().map(|p| p.source_ids.as_slice()).collect();
        let targets: Vec<&[u32]> = items.iter().map(|p| p.target_ids.as_slice()).collect();

        Seq2SeqBatch {
            inputs:  stack_ids::<B>(&sources, &self.device),
            labels:  stack_ids::<B>(&targets, &self.device),
            indices: items.iter().map(|p| p.index).collect(),
        }
    }
}
