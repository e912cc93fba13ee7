// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV to device-ready tensor batches.
//
//   CSV file / URL
//       │
//       ▼
//   CsvSource         → reads the two text columns
//       │
//       ▼
//   clean()           → drops rows with a missing field
//       │
//       ▼
//   split_train_test  → seeded 90/10 split
//       │
//       ▼
//   KeywordDataset    → tokenizes a record on every access
//       │
//       ▼
//   BatchSampler      → shuffled (train) or ordered (eval) passes
//       │
//       ▼
//   Seq2SeqBatcher    → stacks pairs into [B, L_in] / [B, L_out]
//
// `stats` sits off to the side: it summarises field lengths to
// justify the fixed token budgets and is never needed to train.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads (transcription, keywords) columns from CSV
pub mod loader;

/// Drops rows with missing fields
pub mod cleaner;

/// Word-count distributions used to choose token budgets
pub mod stats;

/// Seeded train/test split
pub mod splitter;

/// Lazy tokenizing dataset over cleaned records
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Per-pass batch ordering and lazy batch iteration
pub mod sampler;
