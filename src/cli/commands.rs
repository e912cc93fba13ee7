// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `inspect`, and all
// their configurable flags. Defaults reproduce the reference
// fine-tuning run (batch 6, 3 epochs, 750/100 token budgets).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{PipelineConfig, DEFAULT_DATA_URL};
use crate::domain::sequence::{PadSide, TruncateSide};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune on transcription/keyword pairs and print sample predictions
    Train(TrainArgs),

    /// Print word-count statistics for both columns
    Inspect(InspectArgs),
}

/// Where tensors live for the whole run.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceArg {
    /// Default GPU through wgpu
    Wgpu,
    /// CPU through ndarray
    Cpu,
}

/// Which CSV to read and which columns hold the pair.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// CSV path or http(s) URL
    #[arg(long, default_value = DEFAULT_DATA_URL)]
    pub data: String,

    /// Column holding the transcription (model input)
    #[arg(long, default_value = "transcription")]
    pub source_column: String,

    /// Column holding the keyword list (model target)
    #[arg(long, default_value = "keywords")]
    pub target_column: String,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long, value_enum, default_value_t = DeviceArg::Wgpu)]
    pub device: DeviceArg,

    /// HuggingFace tokenizer.json; a word-level one is built when omitted
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Vocabulary size of a built tokenizer
    #[arg(long, default_value_t = 8000)]
    pub vocab_size: usize,

    /// Model architecture as JSON (overrides --d-model and friends)
    #[arg(long)]
    pub model_config: Option<String>,

    /// Pretrained weights recorded with CompactRecorder, without extension
    #[arg(long)]
    pub pretrained: Option<String>,

    /// Token budget for transcriptions (L_in)
    #[arg(long, default_value_t = 750)]
    pub max_source_len: usize,

    /// Token budget for keyword lists (L_out)
    #[arg(long, default_value_t = 100)]
    pub max_target_len: usize,

    #[arg(long, default_value = "left")]
    pub pad_side: PadSide,

    #[arg(long, default_value = "right")]
    pub truncate_side: TruncateSide,

    #[arg(long, default_value_t = 6)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    /// Fixed Adam learning rate
    #[arg(long, default_value_t = 2e-4)]
    pub lr: f64,

    /// Share of clean rows used for training; the rest is held out
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    #[arg(long, default_value_t = 34)]
    pub split_seed: u64,

    /// Seed for the per-epoch shuffle; random when omitted
    #[arg(long)]
    pub shuffle_seed: Option<u64>,

    /// Generated sequences are at least this long (start token included)
    #[arg(long, default_value_t = 20)]
    pub min_generate_len: usize,

    #[arg(long, default_value_t = 100)]
    pub max_generate_len: usize,

    #[arg(long, default_value_t = 1)]
    pub generate_batch_size: usize,

    /// Held-out rows printed after generation
    #[arg(long, default_value_t = 5)]
    pub report_rows: usize,

    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 3)]
    pub encoder_layers: usize,

    #[arg(long, default_value_t = 3)]
    pub decoder_layers: usize,

    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,
}

/// Convert CLI TrainArgs into the application-layer PipelineConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for PipelineConfig {
    fn from(a: TrainArgs) -> Self {
        PipelineConfig {
            data:                a.data.data,
            source_column:       a.data.source_column,
            target_column:       a.data.target_column,
            tokenizer:           a.tokenizer,
            vocab_size:          a.vocab_size,
            model_config:        a.model_config,
            pretrained:          a.pretrained,
            max_source_len:      a.max_source_len,
            max_target_len:      a.max_target_len,
            pad_side:            a.pad_side,
            truncate_side:       a.truncate_side,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            lr:                  a.lr,
            train_fraction:      a.train_fraction,
            split_seed:          a.split_seed,
            shuffle_seed:        a.shuffle_seed,
            min_generate_len:    a.min_generate_len,
            max_generate_len:    a.max_generate_len,
            generate_batch_size: a.generate_batch_size,
            d_model:             a.d_model,
            num_heads:           a.num_heads,
            encoder_layers:      a.encoder_layers,
            decoder_layers:      a.decoder_layers,
            d_ff:                a.d_ff,
            dropout:             a.dropout,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Histogram buckets per column
    #[arg(long, default_value_t = 10)]
    pub bins: usize,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use crate::cli::Cli;
    use super::*;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_pipeline_defaults() {
        let cli = Cli::try_parse_from(["keyword-extractor", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(args.device, DeviceArg::Wgpu);
        assert_eq!(args.report_rows, 5);

        let parsed: PipelineConfig = args.into();
        let default = PipelineConfig::default();
        assert_eq!(parsed.data, default.data);
        assert_eq!(parsed.batch_size, default.batch_size);
        assert_eq!(parsed.max_source_len, default.max_source_len);
        assert_eq!(parsed.pad_side, default.pad_side);
        assert_eq!(parsed.truncate_side, default.truncate_side);
        assert_eq!(parsed.split_seed, default.split_seed);
    }

    #[test]
    fn test_train_flags_override() {
        let cli = Cli::try_parse_from([
            "keyword-extractor", "train",
            "--device", "cpu",
            "--data", "notes.csv",
            "--pad-side", "right",
            "--epochs", "1",
            "--shuffle-seed", "7",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(args.device, DeviceArg::Cpu);

        let parsed: PipelineConfig = args.into();
        assert_eq!(parsed.data, "notes.csv");
        assert_eq!(parsed.pad_side, PadSide::Right);
        assert_eq!(parsed.epochs, 1);
        assert_eq!(parsed.shuffle_seed, Some(7));
    }

    #[test]
    fn test_bad_side_rejected() {
        assert!(Cli::try_parse_from(["keyword-extractor", "train", "--pad-side", "middle"]).is_err());
    }

    #[test]
    fn test_inspect_args() {
        let cli = Cli::try_parse_from(["keyword-extractor", "inspect", "--bins", "4"]).unwrap();
        let Commands::Inspect(args) = cli.command else { panic!("expected inspect") };
        assert_eq!(args.bins, 4);
        assert_eq!(args.data.source_column, "transcription");
    }
}
