// ============================================================
// Layer 4 — Batch Sampler / Iterator
// ============================================================
// Groups dataset rows into batches for one pass over the data.
//
//   BatchSampler  → owns the RNG, decides the row order per pass
//   IndexBatches  → one pass of index groups, e.g. [[3,0,7],[5,1]]
//   BatchIter     → one pass of tensor batches, built lazily:
//                   rows are tokenized only when their batch is
//                   requested
//
// Guarantees per pass, for N rows and batch size B:
//   - ceil(N / B) batches
//   - every index in 0..N appears exactly once
//   - only the final batch may be shorter than B
//   - with shuffling, each call to `pass()` draws a fresh
//     permutation; without it, rows come in index order
//
// Reference: Rust Book §13 (Iterators)
//            rand crate documentation

use anyhow::{ensure, Result};
use burn::{data::dataloader::batcher::Batcher, prelude::*};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::batcher::{Seq2SeqBatch, Seq2SeqBatcher};
use crate::data::dataset::KeywordDataset;

/// Number of batches needed to cover `total` rows.
pub fn num_batches(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size)
}

/// Decides which rows go into which batch, one pass at a time.
pub struct BatchSampler {
    len:        usize,
    batch_size: usize,
    shuffle:    bool,
    rng:        StdRng,
}

impl BatchSampler {
    /// `seed = None` seeds from OS entropy.
    pub fn new(len: usize, batch_size: usize, shuffle: bool, seed: Option<u64>) -> Result<Self> {
        ensure!(batch_size > 0, "Batch size must be at least 1");
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        Ok(Self { len, batch_size, shuffle, rng })
    }

    pub fn num_batches(&self) -> usize {
        num_batches(self.len, self.batch_size)
    }

    /// Start a new pass; reshuffles when shuffling is on.
    pub fn pass(&mut self) -> IndexBatches {
        let mut order: Vec<usize> = (0..self.len).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        IndexBatches { order, batch_size: self.batch_size, cursor: 0 }
    }

    /// Start a new pass yielding tensor batches from `dataset`.
    pub fn batches<'a, B: Backend>(
        &mut self,
        dataset: &'a KeywordDataset,
        batcher: &'a Seq2SeqBatcher<B>,
    ) -> BatchIter<'a, B> {
        BatchIter { dataset, batcher, indices: self.pass() }
    }
}

/// Index groups for a single pass.
#[derive(Debug, Clone)]
pub struct IndexBatches {
    order:      Vec<usize>,
    batch_size: usize,
    cursor:     usize,
}

impl Iterator for IndexBatches {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end   = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = num_batches(self.order.len() - self.cursor, self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndexBatches {}

/// Tensor batches for a single pass, tokenized on demand.
pub struct BatchIter<'a, B: Backend> {
    dataset: &'a KeywordDataset,
    batcher: &'a Seq2SeqBatcher<B>,
    indices: IndexBatches,
}

impl<B: Backend> Iterator for BatchIter<'_, B> {
    type Item = Result<Seq2SeqBatch<B>>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.indices.next()?;
        let items = indices
            .into_iter()
            .map(|i| self.dataset.encode_pair(i))
            .collect::<Result<Vec<_>>>();
        Some(items.map(|items| self.batcher.batch(items)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl<B: Backend> ExactSizeIterator for BatchIter<'_, B> {}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sequence::{PadSide, SequencePolicy, TruncateSide};
    use crate::test_support::{sample_records, tiny_codec};
    use burn::backend::NdArray;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_nine_records_batch_six() {
        let mut sampler = BatchSampler::new(9, 6, true, Some(7)).unwrap();
        let batches: Vec<Vec<usize>> = sampler.pass().collect();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 6);
        assert_eq!(batches[1].len(), 3);

        let visited: HashSet<usize> = batches.iter().flatten().copied().collect();
        assert_eq!(visited, (0..9).collect::<HashSet<_>>());
    }

    #[test]
    fn test_unshuffled_pass_is_index_order() {
        let mut sampler = BatchSampler::new(5, 2, false, None).unwrap();
        let first: Vec<Vec<usize>> = sampler.pass().collect();
        let second: Vec<Vec<usize>> = sampler.pass().collect();
        assert_eq!(first, vec![vec![0, 1], vec![2, 3], vec![4]]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_shuffled_passes_differ() {
        let mut sampler = BatchSampler::new(200, 16, true, Some(3)).unwrap();
        let first: Vec<usize> = sampler.pass().flatten().collect();
        let second: Vec<usize> = sampler.pass().flatten().collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(BatchSampler::new(10, 0, false, None).is_err());
    }

    #[test]
    fn test_empty_dataset_yields_nothing() {
        let mut sampler = BatchSampler::new(0, 4, true, None).unwrap();
        assert_eq!(sampler.num_batches(), 0);
        assert_eq!(sampler.pass().count(), 0);
    }

    #[test]
    fn test_tensor_batches_cover_dataset() {
        let records = sample_records(9);
        let codec = tiny_codec(&records);
        let dataset = KeywordDataset::new(
            records,
            codec,
            SequencePolicy::new(10, PadSide::Left, TruncateSide::Right),
            SequencePolicy::new(4, PadSide::Left, TruncateSide::Right),
        );
        let batcher = Seq2SeqBatcher::<NdArray>::new(Default::default());
        let mut sampler = BatchSampler::new(dataset.record_count(), 6, true, Some(11)).unwrap();

        let iter = sampler.batches(&dataset, &batcher);
        assert_eq!(iter.len(), 2);

        let batches: Vec<Seq2SeqBatch<NdArray>> = iter.collect::<Result<_>>().unwrap();
        assert_eq!(batches[0].inputs.dims(), [6, 10]);
        assert_eq!(batches[1].labels.dims(), [3, 4]);

        let mut seen: Vec<usize> = batches.iter().flat_map(|b| b.indices.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..9).collect::<Vec<_>>());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_every_index_once_per_pass(
            len in 0usize..300,
            batch_size in 1usize..40,
            shuffle in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let mut sampler = BatchSampler::new(len, batch_size, shuffle, Some(seed)).unwrap();
            let batches: Vec<Vec<usize>> = sampler.pass().collect();

            prop_assert_eq!(batches.len(), (len + batch_size - 1) / batch_size);
            prop_assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), len);
            for b in batches.iter().rev().skip(1) {
                prop_assert_eq!(b.len(), batch_size);
            }

            let mut all: Vec<usize> = batches.into_iter().flatten().collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..len).collect::<Vec<_>>());
        }
    }
}
