// ============================================================
// Layer 3 — Fixed-Length Token Sequences
// ============================================================
// Every sequence that reaches the model has exactly `max_len`
// token ids. Longer encodings are truncated, shorter ones are
// padded with the tokenizer's pad id.
//
// Layout of one encoded sequence (max_len = 8, left padding):
//
//   [PAD] [PAD] <s> fever , cough </s>      ← 7 ids, pad 1 more
//   [PAD] [PAD] [PAD] <s> fever , cough </s>
//
// The begin/end markers are always kept: truncation cuts the
// content between them, matching how HuggingFace tokenizers
// truncate before adding special tokens.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Which end of the sequence receives padding ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadSide {
    Left,
    Right,
}

/// Which end of an over-long sequence is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncateSide {
    Left,
    Right,
}

fn parse_side(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "left" => Ok(true),
        "right" => Ok(false),
        other => Err(format!("expected 'left' or 'right', got '{other}'")),
    }
}

impl FromStr for PadSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_side(s).map(|left| if left { PadSide::Left } else { PadSide::Right })
    }
}

impl FromStr for TruncateSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_side(s).map(|left| if left { TruncateSide::Left } else { TruncateSide::Right })
    }
}

impl fmt::Display for PadSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PadSide::Left => "left",
            PadSide::Right => "right",
        })
    }
}

impl fmt::Display for TruncateSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TruncateSide::Left => "left",
            TruncateSide::Right => "right",
        })
    }
}

/// How a text is turned into a fixed-length id sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePolicy {
    pub max_len:       usize,
    pub pad_side:      PadSide,
    pub truncate_side: TruncateSide,
}

impl SequencePolicy {
    pub fn new(max_len: usize, pad_side: PadSide, truncate_side: TruncateSide) -> Self {
        Self { max_len, pad_side, truncate_side }
    }
}

/// Ids of the reserved tokens the pipeline needs to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    /// Filler id used for padding
    pub pad: u32,
    /// Begin-of-sequence, also the decoder start id
    pub bos: u32,
    /// End-of-sequence, stops generation
    pub eos: u32,
}

/// Truncate or pad `ids` to exactly `policy.max_len` elements.
pub fn fit_to_length(mut ids: Vec<u32>, policy: &SequencePolicy, pad_id: u32) -> Vec<u32> {
    let max_len = policy.max_len;

    if ids.len() > max_len {
        match policy.truncate_side {
            TruncateSide::Right => ids.truncate(max_len),
            TruncateSide::Left => {
                ids.drain(..ids.len() - max_len);
            }
        }
    }

    let missing = max_len - ids.len();
    if missing > 0 {
        match policy.pad_side {
            PadSide::Right => ids.resize(max_len, pad_id),
            PadSide::Left => {
                let mut padded = vec![pad_id; missing];
                padded.extend_from_slice(&ids);
                ids = padded;
            }
        }
    }

    ids
}

/// Surround `content` with begin/end markers, truncating the content
/// so the markers survive, then pad to `policy.max_len`.
pub fn wrap_and_fit(content: &[u32], policy: &SequencePolicy, special: &SpecialTokens) -> Vec<u32> {
    // Fewer than two slots: nothing but the markers fits
    if policy.max_len < 2 {
        return fit_to_length(vec![special.bos, special.eos], policy, special.pad);
    }

    let budget = policy.max_len - 2;
    let kept = if content.len() > budget {
        match policy.truncate_side {
            TruncateSide::Right => &content[..budget],
            TruncateSide::Left => &content[content.len() - budget..],
        }
    } else {
        content
    };

    let mut ids = Vec::with_capacity(policy.max_len);
    ids.push(special.bos);
    ids.extend_from_slice(kept);
    ids.push(special.eos);

    fit_to_length(ids, policy, special.pad)
}
