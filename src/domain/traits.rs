// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipeline depends on two outside capabilities that it does
// not implement itself:
//
//   RecordSource → where raw rows come from (a CSV file or URL)
//   TextCodec    → the tokenizer: text ↔ fixed-length ids
//
// Programming against these traits keeps the data pipeline and
// the training loop testable with small in-memory fixtures.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::record::RawRow;
use crate::domain::sequence::{SequencePolicy, SpecialTokens};

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce raw (transcription, keywords) rows.
///
/// Implementations:
///   - CsvSource → a local CSV file or an http(s) URL
pub trait RecordSource {
    /// Load every row from this source, missing cells included.
    fn load_all(&self) -> Result<Vec<RawRow>>;
}

// ─── TextCodec ────────────────────────────────────────────────────────────────
/// A tokenizer that produces fixed-length id sequences and
/// turns generated ids back into text.
pub trait TextCodec: Send + Sync {
    /// Encode `text` to exactly `policy.max_len` ids, begin/end
    /// markers included, padded and truncated per the policy.
    fn encode(&self, text: &str, policy: &SequencePolicy) -> Result<Vec<u32>>;

    /// Turn ids back into text, optionally dropping special tokens.
    fn decode(&self, ids: &[u32], skip_special: bool) -> Result<String>;

    /// Decode several sequences at once.
    fn decode_batch(&self, batch: &[Vec<u32>], skip_special: bool) -> Result<Vec<String>> {
        batch
            .iter()
            .map(|ids| self.decode(ids, skip_special))
            .collect()
    }

    /// Pad / begin / end token ids
    fn special_tokens(&self) -> SpecialTokens;

    /// Number of distinct ids the codec can emit
    fn vocab_size(&self) -> usize;
}
