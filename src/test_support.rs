// Shared fixtures for unit tests: small records, a word-level
// codec built from them and a model small enough for NdArray.

use std::sync::Arc;

use crate::domain::record::Record;
use crate::domain::traits::TextCodec;
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::model::KeywordTransformerConfig;

const FINDINGS: [&str; 6] = ["fever", "cough", "chest pain", "rash", "headache", "nausea"];

/// `n` distinct transcription/keyword records.
pub fn sample_records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let a = FINDINGS[i % FINDINGS.len()];
            let b = FINDINGS[(i + 2) % FINDINGS.len()];
            Record::new(
                format!("SUBJECTIVE: Patient {i} presents with {a} and {b}. PLAN: follow up."),
                format!("{a}, {b}"),
            )
        })
        .collect()
}

/// Word-level codec over the given records' text.
pub fn tiny_codec(records: &[Record]) -> Arc<dyn TextCodec> {
    let texts: Vec<&str> = records
        .iter()
        .flat_map(|r| [r.source.as_str(), r.target.as_str()])
        .collect();
    Arc::new(TokenizerStore::build(&texts, 200).expect("fixture tokenizer"))
}

/// Two-head, single-layer model: source ≤ 16 ids, target ≤ 100 ids.
/// Special ids follow the built tokenizer: <s>=0, <pad>=1, </s>=2.
pub fn tiny_model_config(vocab_size: usize) -> KeywordTransformerConfig {
    KeywordTransformerConfig::new(vocab_size, 16, 100, 1, 0, 2)
        .with_d_model(16)
        .with_num_heads(2)
        .with_encoder_layers(1)
        .with_decoder_layers(1)
        .with_d_ff(32)
}
