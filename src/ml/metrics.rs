// ============================================================
// Layer 5 — Training Metrics
// ============================================================
// Token accuracy and the running averages reported during a pass.
//
// Token accuracy for one batch:
//   arg-max over the vocabulary at every output position,
//   compared element-wise with the label ids,
//   matches / (batch_size × L_out)
//
// Running loss/accuracy are plain means over the batches seen so
// far. The short final batch weighs as much as a full one.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Fraction of label positions whose arg-max prediction matches.
/// logits: [batch, len, vocab], labels: [batch, len] → [0, 1]
pub fn token_accuracy<B: Backend>(logits: Tensor<B, 3>, labels: Tensor<B, 2, Int>) -> f64 {
    let [batch_size, seq_len, _] = logits.dims();
    let total = batch_size * seq_len;
    if total == 0 {
        return 0.0;
    }

    // argmax(2) keeps the reduced axis: [batch, len, 1]
    let predictions = logits.argmax(2).reshape([batch_size, seq_len]);
    let matches: i64 = predictions
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();

    matches as f64 / total as f64
}

/// Running sums for one pass; reset by creating a new one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningMetrics {
    loss_sum:     f64,
    accuracy_sum: f64,
    batches:      usize,
}

impl RunningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, loss: f64, accuracy: f64) {
        self.loss_sum     += loss;
        self.accuracy_sum += accuracy;
        self.batches      += 1;
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    /// NaN before the first batch
    pub fn mean_loss(&self) -> f64 {
        if self.batches > 0 { self.loss_sum / self.batches as f64 } else { f64::NAN }
    }

    /// 0 before the first batch
    pub fn mean_accuracy(&self) -> f64 {
        if self.batches > 0 { self.accuracy_sum / self.batches as f64 } else { 0.0 }
    }
}

/// End-of-pass averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassSummary {
    pub batches:       usize,
    pub mean_loss:     f64,
    pub mean_accuracy: f64,
}

impl From<&RunningMetrics> for PassSummary {
    fn from(m: &RunningMetrics) -> Self {
        Self {
            batches:       m.batches(),
            mean_loss:     m.mean_loss(),
            mean_accuracy: m.mean_accuracy(),
        }
    }
}

/// Train and eval summaries for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    /// Epoch number, starting at 1
    pub epoch: usize,
    pub train: PassSummary,
    pub eval:  PassSummary,
}
