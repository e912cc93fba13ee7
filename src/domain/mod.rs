// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that describe the problem:
// transcription/keyword records, fixed-length token sequences
// and the tokenizer capability the rest of the pipeline codes
// against.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A (transcription, keywords) pair and its raw, uncleaned form
pub mod record;

// Fixed-length token sequences: padding and truncation policy
pub mod sequence;

// Core abstractions (traits) that other layers implement
pub mod traits;
