// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Provides the TextCodec the pipeline tokenizes with.
//
// Two ways to get one:
//   1. load(path)   → a HuggingFace tokenizer.json (e.g. the
//                     facebook/bart-base tokenizer)
//   2. build(texts) → a word-level vocabulary built in memory
//                     from the training corpus
//
// Either way the tokenizer must know the BART-style special
// tokens <s>, </s> and <pad>. Padding and truncation are applied
// by `wrap_and_fit`, not by the tokenizer's own settings, so
// both kinds behave the same.
//
// Reference: tokenizers crate documentation

use anyhow::{Context, Result};
use std::{collections::HashMap, path::Path};
use tokenizers::{
    normalizers::bert::BertNormalizer, pre_tokenizers::whitespace::Whitespace, NormalizedString,
    Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, Tokenizer,
};

use crate::domain::sequence::{wrap_and_fit, SequencePolicy, SpecialTokens};
use crate::domain::traits::TextCodec;

/// Special tokens in BART id order
const BOS: &str = "<s>";
const PAD: &str = "<pad>";
const EOS: &str = "</s>";
const UNK: &str = "<unk>";

/// A `tokenizers::Tokenizer` with resolved special-token ids.
pub struct HfCodec {
    tokenizer: Tokenizer,
    special:   SpecialTokens,
}

impl HfCodec {
    pub fn new(tokenizer: Tokenizer) -> Result<Self> {
        let id = |token: &str| {
            tokenizer
                .token_to_id(token)
                .with_context(|| format!("Tokenizer has no '{token}' token"))
        };
        let special = SpecialTokens { pad: id(PAD)?, bos: id(BOS)?, eos: id(EOS)? };
        Ok(Self { tokenizer, special })
    }
}

impl TextCodec for HfCodec {
    fn encode(&self, text: &str, policy: &SequencePolicy) -> Result<Vec<u32>> {
        // Special tokens are added by wrap_and_fit, not the post-processor
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(wrap_and_fit(encoding.get_ids(), policy, &self.special))
    }

    fn decode(&self, ids: &[u32], skip_special: bool) -> Result<String> {
        self.tokenizer
            .decode(ids, skip_special)
            .map_err(|e| anyhow::anyhow!("Decoding error: {e}"))
    }

    fn decode_batch(&self, batch: &[Vec<u32>], skip_special: bool) -> Result<Vec<String>> {
        let slices: Vec<&[u32]> = batch.iter().map(Vec::as_slice).collect();
        self.tokenizer
            .decode_batch(&slices, skip_special)
            .map_err(|e| anyhow::anyhow!("Decoding error: {e}"))
    }

    fn special_tokens(&self) -> SpecialTokens {
        self.special
    }

    fn vocab_size(&self) -> usize {
        // Added tokens may sit above the model vocabulary; size by the largest id
        self.tokenizer
            .get_vocab(true)
            .values()
            .max()
            .map_or(0, |&id| id as usize + 1)
    }
}

pub struct TokenizerStore;

impl TokenizerStore {
    /// Load the tokenizer file at `path` when given, otherwise
    /// build one from `texts`.
    pub fn load_or_build(
        path:       Option<&Path>,
        texts:      &[&str],
        vocab_size: usize,
    ) -> Result<HfCodec> {
        match path {
            Some(path) => {
                tracing::info!("Loading tokenizer from '{}'", path.display());
                Self::load(path)
            }
            None => {
                tracing::info!("Building word-level tokenizer (vocab_size={})", vocab_size);
                Self::build(texts, vocab_size)
            }
        }
    }

    /// Load a HuggingFace tokenizer.json file
    pub fn load(path: &Path) -> Result<HfCodec> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e)
        })?;
        HfCodec::new(tokenizer)
    }

    /// Build a word-level vocabulary from `texts` and assemble a
    /// tokenizer JSON in HuggingFace format, entirely in memory.
    pub fn build(texts: &[&str], vocab_size: usize) -> Result<HfCodec> {
        // ── Step 1: Count pre-tokenized pieces ───────────────────────────────
        // The same normalizer and pre-tokenizer instances go into the
        // tokenizer JSON below, so counted pieces are exactly the
        // strings the WordLevel model will look up.
        let normalizer    = BertNormalizer::new(true, true, None, true);
        let pre_tokenizer = Whitespace::default();

        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for piece in split_pieces(text, &normalizer, &pre_tokenizer)? {
                *freq.entry(piece).or_insert(0) += 1;
            }
        }

        // Most frequent first, ties broken alphabetically for stable ids
        let mut pieces: Vec<(String, usize)> = freq.into_iter().collect();
        pieces.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pieces.truncate(vocab_size.saturating_sub(4));

        // ── Step 2: Build vocab JSON ──────────────────────────────────────────
        let mut vocab = serde_json::json!({ BOS: 0, PAD: 1, EOS: 2, UNK: 3 });
        let mut next_id = 4usize;
        for (piece, _) in &pieces {
            if vocab.get(piece).is_none() {
                vocab[piece] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        let special = |id: usize, content: &str| {
            serde_json::json!({
                "id": id, "content": content, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            })
        };

        // ── Step 3: Tokenizer JSON in HuggingFace format ──────────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [special(0, BOS), special(1, PAD), special(2, EOS), special(3, UNK)],
            "normalizer": serde_json::to_value(&normalizer)?,
            "pre_tokenizer": serde_json::to_value(&pre_tokenizer)?,
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK
            }
        });

        let tokenizer: Tokenizer = serde_json::to_string(&tokenizer_json)?
            .parse()
            .map_err(|e| anyhow::anyhow!("Cannot assemble tokenizer: {e}"))?;

        tracing::info!("Tokenizer built with {} entries", next_id);
        HfCodec::new(tokenizer)
    }
}

/// Normalize `text` and split it into the pieces the tokenizer sees.
fn split_pieces(
    text:          &str,
    normalizer:    &BertNormalizer,
    pre_tokenizer: &Whitespace,
) -> Result<Vec<String>> {
    let mut normalized = NormalizedString::from(text);
    normalizer
        .normalize(&mut normalized)
        .map_err(|e| anyhow::anyhow!("Normalisation error: {e}"))?;

    let mut pretokenized = PreTokenizedString::from(normalized);
    pre_tokenizer
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| anyhow::anyhow!("Pre-tokenisation error: {e}"))?;

    Ok(pretokenized
        .get_splits(OffsetReferential::Normalized, OffsetType::Byte)
        .into_iter()
        .map(|(piece, _, _)| piece.to_string())
        .collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sequence::{PadSide, TruncateSide};

    fn codec() -> HfCodec {
        TokenizerStore::build(
            &["Fever, cough and chills.", "Chest pain; fever"],
            100,
        )
        .unwrap()
    }

    fn squash(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase()
    }

    fn pieces(text: &str) -> Vec<String> {
        split_pieces(text, &BertNormalizer::new(true, true, None, true), &Whitespace::default()).unwrap()
    }

    #[test]
    fn test_pieces_split_punctuation_and_fold_case() {
        assert_eq!(pieces("Fever, cough"), vec!["fever", ",", "cough"]);
        assert_eq!(pieces("a...b  c_d"), vec!["a", "...", "b", "c_d"]);
        assert!(pieces("   ").is_empty());
    }

    #[test]
    fn test_pieces_strip_accents() {
        assert_eq!(pieces("Ménière café"), vec!["meniere", "cafe"]);
    }

    #[test]
    fn test_accented_words_are_in_vocabulary() {
        let c = TokenizerStore::build(&["Ménière disease", "café au lait spots"], 100).unwrap();
        let policy = SequencePolicy::new(6, PadSide::Right, TruncateSide::Right);
        let ids = c.encode("Ménière café", &policy).unwrap();

        assert_eq!(ids.len(), 6);
        assert_eq!((ids[0], ids[3]), (0, 2));
        assert!(!ids[1..3].contains(&3), "accented words fell back to <unk>: {ids:?}");
        assert_eq!(c.decode(&ids, true).unwrap(), "meniere cafe");
    }

    #[test]
    fn test_special_ids_follow_bart_order() {
        let s = codec().special_tokens();
        assert_eq!((s.bos, s.pad, s.eos), (0, 1, 2));
    }

    #[test]
    fn test_keywords_round_trip() {
        let c = codec();
        let policy = SequencePolicy::new(100, PadSide::Left, TruncateSide::Right);
        let ids = c.encode("fever, cough", &policy).unwrap();
        assert_eq!(ids.len(), 100);

        let text = c.decode(&ids, true).unwrap();
        assert_eq!(squash(&text), squash("fever, cough"));
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let c = codec();
        let policy = SequencePolicy::new(4, PadSide::Right, TruncateSide::Right);
        let ids = c.encode("zebra", &policy).unwrap();
        assert_eq!(ids, vec![0, 3, 2, 1]);
    }

    #[test]
    fn test_vocab_size_is_capped() {
        let c = TokenizerStore::build(&["a b c d e f g h i j"], 8).unwrap();
        assert_eq!(c.vocab_size(), 8);
    }

    #[test]
    fn test_batch_decode() {
        let c = codec();
        let policy = SequencePolicy::new(8, PadSide::Left, TruncateSide::Right);
        let a = c.encode("fever", &policy).unwrap();
        let b = c.encode("chest pain", &policy).unwrap();
        let texts = c.decode_batch(&[a, b], true).unwrap();
        assert_eq!(texts, vec!["fever".to_string(), "chest pain".to_string()]);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(TokenizerStore::load(Path::new("/no/such/tokenizer.json")).is_err());
    }
}
