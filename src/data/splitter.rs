// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles the cleaned records with a fixed seed and splits them
// into a training set (weights are updated on it) and a held-out
// set (evaluation passes and keyword generation).
//
// The seed makes the split reproducible across runs, so the
// held-out rows printed in the final report are always the same.
//
// Split ratio: 90% training, 10% held out (configurable). The
// training share rounds down, so any non-trivial fraction of a
// small dataset still leaves at least one held-out row.
//
// Reference: rand crate documentation (SliceRandom, StdRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, held_out).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.9 = 90%
/// * `seed`           - RNG seed; the same seed gives the same split
pub fn split_train_test<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);

    // Fisher-Yates shuffle: every permutation is equally likely
    samples.shuffle(&mut rng);

    // e.g. 100 samples * 0.9 = 90 → first 90 are training; 5 * 0.9 → 4
    // The epsilon absorbs float noise such as 0.7 * 10 = 6.999…
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction.clamp(0.0, 1.0) + 1e-9).floor() as usize;
    let split_at = split_at.min(total);

    // After this: samples = [0..split_at], held_out = [split_at..total]
    let held_out = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} held out (seed {})",
        samples.len(),
        held_out.len(),
        seed,
    );

    (samples, held_out)
}
