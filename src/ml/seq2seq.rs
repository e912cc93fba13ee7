// ============================================================
// Layer 5 — Seq2Seq Model Capability
// ============================================================
// The training loop and the generator only need two things from
// a model:
//
//   forward_loss(inputs, labels) → scalar loss + per-position
//                                  logits over the vocabulary
//   generate(inputs, options)    → output token ids
//
// Parameter updates go through Burn's Module/Optimizer machinery,
// so any `Module` that implements this trait can be fine-tuned.

use anyhow::Result;
use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Result of a teacher-forced forward pass.
pub struct Seq2SeqOutput<B: Backend> {
    /// Mean token-level cross entropy, shape: [1]
    pub loss: Tensor<B, 1>,

    /// Unnormalised scores, shape: [batch, L_out, vocab]
    pub logits: Tensor<B, 3>,
}

/// Length limits for autoregressive decoding.
///
/// Lengths count every emitted id, the decoder start token included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// End-of-sequence is suppressed until the output is this long
    pub min_length: usize,
    /// Decoding stops once the output reaches this length
    pub max_length: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self { min_length: 20, max_length: 100 }
    }
}

pub trait Seq2SeqModel<B: Backend> {
    /// inputs: [batch, L_in], labels: [batch, L_out]
    fn forward_loss(&self, inputs: Tensor<B, 2, Int>, labels: Tensor<B, 2, Int>) -> Seq2SeqOutput<B>;

    /// inputs: [batch, L_in] → one id sequence per row, each between
    /// `min_length` and `max_length` ids long
    fn generate(&self, inputs: Tensor<B, 2, Int>, options: &GenerationOptions) -> Result<Vec<Vec<u32>>>;
}

/// Build decoder inputs for teacher forcing: drop the last label
/// and prepend the decoder start id.
///
/// [[a, b, c]] → [[start, a, b]]
pub fn shift_right<B: Backend>(labels: Tensor<B, 2, Int>, start_id: usize) -> Tensor<B, 2, Int> {
    let [batch, len] = labels.dims();
    let start = Tensor::<B, 2, Int>::full([batch, 1], start_id as i64, &labels.device());
    if len <= 1 {
        return start.slice([0..batch, 0..len]);
    }
    Tensor::cat(vec![start, labels.slice([0..batch, 0..len - 1])], 1)
}

/// Index of the best score, skipping `banned` when given.
pub fn argmax_excluding(scores: &[f32], banned: Option<usize>) -> usize {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if Some(i) == banned {
            continue;
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map_or(0, |(i, _)| i)
}
