// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model, loss and optimiser code lives here.
//
//   seq2seq.rs   — The model capability the loop depends on:
//                  teacher-forced forward_loss + generate
//
//   model.rs     — KeywordTransformer, an encoder–decoder
//                  transformer implementing that capability
//
//   metrics.rs   — Token accuracy and running averages
//
//   trainer.rs   — Epoch driver with train and eval passes,
//                  reporting through a ProgressObserver
//
//   generator.rs — Length-constrained keyword generation over
//                  held-out records
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need
//            Lewis et al. (2019) BART

/// Model capability trait and teacher-forcing helpers
pub mod seq2seq;

/// Encoder–decoder transformer
pub mod model;

/// Token accuracy and running means
pub mod metrics;

/// Train/eval loop over epochs
pub mod trainer;

/// Keyword generation for held-out rows
pub mod generator;
