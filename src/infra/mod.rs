// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Adapters for the outside collaborators the pipeline consumes:
//
//   tokenizer_store.rs — The TextCodec implementation
//                        Loads a HuggingFace tokenizer.json, or
//                        builds a word-level tokenizer from the
//                        training corpus in memory.
//
//   weights.rs         — Model architecture config (JSON) and
//                        optional pretrained parameters read
//                        with Burn's CompactRecorder.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Tokenizer loading/building behind the TextCodec trait
pub mod tokenizer_store;

/// Model config and pretrained weight loading
pub mod weights;
