// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full fine-tuning pipeline in order:
//
//   Step 1: Load and clean the CSV            (Layer 4 - data)
//   Step 2: Seeded train/held-out split       (Layer 4 - data)
//   Step 3: Load or build the tokenizer       (Layer 6 - infra)
//   Step 4: Resolve the model architecture    (Layer 5 / 6)
//   Step 5: Build the lazy datasets           (Layer 4 - data)
//   Step 6: Run the train/eval epochs         (Layer 5 - ml)
//   Step 7: Generate keywords for held-out    (Layer 5 - ml)
//
// Nothing is written to disk. The caller gets the per-epoch
// summaries and the held-out predictions back.
//
// Reference: Burn Book §5 (Training)

use std::{path::Path, sync::Arc};

use anyhow::{ensure, Result};
use burn::{module::AutodiffModule, optim::AdamConfig, prelude::*, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};

use crate::application::load_clean;
use crate::data::{dataset::KeywordDataset, splitter::split_train_test};
use crate::domain::{
    sequence::{PadSide, SequencePolicy, TruncateSide},
    traits::TextCodec,
};
use crate::infra::{tokenizer_store::TokenizerStore, weights::WeightStore};
use crate::ml::{
    generator::{KeywordGenerator, Prediction},
    metrics::EpochReport,
    model::KeywordTransformerConfig,
    seq2seq::GenerationOptions,
    trainer::{ProgressObserver, Trainer, TrainerConfig},
};

/// Public copy of the mtsamples transcription dataset.
pub const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/Saloni-glit/Medical-dataset/main/mtsamples.csv";

// ─── Pipeline Configuration ──────────────────────────────────────────────────
// Every knob of a run. Serialisable so a run's settings can be
// logged or replayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// CSV path or http(s) URL
    pub data:          String,
    pub source_column: String,
    pub target_column: String,

    /// HuggingFace tokenizer.json; built from the training rows when absent
    pub tokenizer:  Option<String>,
    /// Vocabulary size of a built tokenizer, special tokens included
    pub vocab_size: usize,

    /// JSON architecture file; overrides the dimensions below
    pub model_config: Option<String>,
    /// CompactRecorder weights to start from (without extension)
    pub pretrained:   Option<String>,

    pub max_source_len: usize,
    pub max_target_len: usize,
    pub pad_side:       PadSide,
    pub truncate_side:  TruncateSide,

    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub train_fraction: f64,
    pub split_seed:     u64,
    pub shuffle_seed:   Option<u64>,

    pub min_generate_len:    usize,
    pub max_generate_len:    usize,
    pub generate_batch_size: usize,

    pub d_model:        usize,
    pub num_heads:      usize,
    pub encoder_layers: usize,
    pub decoder_layers: usize,
    pub d_ff:           usize,
    pub dropout:        f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data:                DEFAULT_DATA_URL.to_string(),
            source_column:       "transcription".to_string(),
            target_column:       "keywords".to_string(),
            tokenizer:           None,
            vocab_size:          8000,
            model_config:        None,
            pretrained:          None,
            max_source_len:      750,
            max_target_len:      100,
            pad_side:            PadSide::Left,
            truncate_side:       TruncateSide::Right,
            batch_size:          6,
            epochs:              3,
            lr:                  2e-4,
            train_fraction:      0.9,
            split_seed:          34,
            shuffle_seed:        None,
            min_generate_len:    20,
            max_generate_len:    100,
            generate_batch_size: 1,
            d_model:             256,
            num_heads:           8,
            encoder_layers:      3,
            decoder_layers:      3,
            d_ff:                1024,
            dropout:             0.1,
        }
    }
}

impl PipelineConfig {
    pub fn source_policy(&self) -> SequencePolicy {
        SequencePolicy::new(self.max_source_len, self.pad_side, self.truncate_side)
    }

    pub fn target_policy(&self) -> SequencePolicy {
        SequencePolicy::new(self.max_target_len, self.pad_side, self.truncate_side)
    }

    pub fn generation(&self) -> GenerationOptions {
        GenerationOptions { min_length: self.min_generate_len, max_length: self.max_generate_len }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub epochs:      Vec<EpochReport>,
    pub predictions: Vec<Prediction>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: PipelineConfig,
}

impl TrainUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute the full pipeline end to end on `device`.
    pub fn execute<B: AutodiffBackend>(
        &self,
        device:   B::Device,
        observer: &mut dyn ProgressObserver,
    ) -> Result<TrainOutcome> {
        let cfg = &self.config;
        ensure!(
            cfg.min_generate_len <= cfg.max_generate_len,
            "--min-generate-len ({}) exceeds --max-generate-len ({})",
            cfg.min_generate_len,
            cfg.max_generate_len
        );

        // ── Step 1: Load and clean ────────────────────────────────────────────
        let cleaned = load_clean(&cfg.data, &cfg.source_column, &cfg.target_column)?;
        ensure!(
            !cleaned.records.is_empty(),
            "No usable rows in '{}' after cleaning",
            cfg.data
        );

        // ── Step 2: Train / held-out split ────────────────────────────────────
        let (train_records, test_records) =
            split_train_test(cleaned.records, cfg.train_fraction, cfg.split_seed);
        tracing::info!(
            "Split: {} train, {} held out",
            train_records.len(),
            test_records.len()
        );
        ensure!(!train_records.is_empty(), "Training split is empty; raise --train-fraction");
        ensure!(!test_records.is_empty(), "Held-out split is empty; lower --train-fraction");

        // ── Step 3: Tokenizer ─────────────────────────────────────────────────
        // A built vocabulary only ever sees training rows
        let texts: Vec<&str> = train_records
            .iter()
            .flat_map(|r| [r.source.as_str(), r.target.as_str()])
            .collect();
        let codec: Arc<dyn TextCodec> = Arc::new(TokenizerStore::load_or_build(
            cfg.tokenizer.as_deref().map(Path::new),
            &texts,
            cfg.vocab_size,
        )?);
        tracing::info!("Tokenizer vocabulary: {} ids", codec.vocab_size());

        // ── Step 4: Model ─────────────────────────────────────────────────────
        let model_config = self.model_config(codec.as_ref())?;
        let model = model_config.init::<B>(&device);
        let model = match cfg.pretrained.as_deref() {
            Some(path) => WeightStore::load_weights(model, Path::new(path), &device)?,
            None => model,
        };
        tracing::info!("Model parameters: {}", model.num_params());

        // ── Step 5: Datasets ──────────────────────────────────────────────────
        let train_set = KeywordDataset::new(
            train_records, codec.clone(), cfg.source_policy(), cfg.target_policy(),
        );
        let test_set = KeywordDataset::new(
            test_records, codec.clone(), cfg.source_policy(), cfg.target_policy(),
        );

        // ── Step 6: Train / eval epochs ───────────────────────────────────────
        let trainer_config = TrainerConfig {
            epochs:        cfg.epochs,
            batch_size:    cfg.batch_size,
            learning_rate: cfg.lr,
            shuffle_seed:  cfg.shuffle_seed,
        };
        let mut trainer = Trainer::<B>::new(&train_set, &test_set, trainer_config, device.clone())?;
        let mut optim   = AdamConfig::new().init();
        let (model, epochs) = trainer.fit(model, &mut optim, observer)?;

        // ── Step 7: Generate keywords for the held-out rows ───────────────────
        let generator = KeywordGenerator::new(
            codec.as_ref(),
            cfg.source_policy(),
            cfg.generation(),
            cfg.generate_batch_size,
        )?;
        let predictions =
            generator.generate::<B::InnerBackend, _>(&model.valid(), test_set.records(), &device)?;

        Ok(TrainOutcome { epochs, predictions })
    }

    /// Architecture from `--model-config`, or from the CLI dimensions
    /// with the tokenizer's vocabulary and special ids.
    fn model_config(&self, codec: &dyn TextCodec) -> Result<KeywordTransformerConfig> {
        let cfg = &self.config;

        let model_config = match cfg.model_config.as_deref() {
            Some(path) => WeightStore::load_config(Path::new(path))?,
            None => {
                let special = codec.special_tokens();
                KeywordTransformerConfig::new(
                    codec.vocab_size(),
                    cfg.max_source_len,
                    cfg.max_target_len.max(cfg.max_generate_len),
                    special.pad as usize,
                    special.bos as usize,
                    special.eos as usize,
                )
                .with_d_model(cfg.d_model)
                .with_num_heads(cfg.num_heads)
                .with_encoder_layers(cfg.encoder_layers)
                .with_decoder_layers(cfg.decoder_layers)
                .with_d_ff(cfg.d_ff)
                .with_dropout(cfg.dropout)
            }
        };

        ensure!(
            model_config.vocab_size >= codec.vocab_size(),
            "Model vocabulary ({}) is smaller than the tokenizer's ({})",
            model_config.vocab_size,
            codec.vocab_size()
        );
        let special = codec.special_tokens();
        for (name, model_id, codec_id) in [
            ("pad", model_config.pad_id, special.pad),
            ("decoder start", model_config.decoder_start_id, special.bos),
            ("end-of-sequence", model_config.eos_id, special.eos),
        ] {
            ensure!(
                model_id == codec_id as usize,
                "Model {name} id ({model_id}) does not match the tokenizer's ({codec_id})"
            );
        }
        ensure!(
            model_config.d_model % model_config.num_heads == 0,
            "d_model ({}) must be divisible by num_heads ({})",
            model_config.d_model,
            model_config.num_heads
        );
        model_config.check_lengths(cfg.max_source_len, cfg.max_target_len, cfg.max_generate_len)?;
        Ok(model_config)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::trainer::SilentProgress;
    use crate::test_support::sample_records;
    use burn::backend::{Autodiff, NdArray};
    use std::io::Write;

    type TrainBackend = Autodiff<NdArray>;

    fn csv_file(rows: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["description", "transcription", "keywords"]).unwrap();
        for r in sample_records(rows) {
            writer.write_record(["note", r.source.as_str(), r.target.as_str()]).unwrap();
        }
        // One unusable row that cleaning must drop
        writer.write_record(["note", "", "fever"]).unwrap();
        file.write_all(&writer.into_inner().unwrap()).unwrap();
        file
    }

    fn tiny_config(data: &str) -> PipelineConfig {
        PipelineConfig {
            data:             data.to_string(),
            vocab_size:       200,
            max_source_len:   16,
            max_target_len:   8,
            batch_size:       3,
            epochs:           1,
            train_fraction:   0.8,
            shuffle_seed:     Some(1),
            min_generate_len: 2,
            max_generate_len: 6,
            d_model:          16,
            num_heads:        2,
            encoder_layers:   1,
            decoder_layers:   1,
            d_ff:             32,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_the_reference_run() {
        let cfg = PipelineConfig::default();
        assert_eq!((cfg.batch_size, cfg.epochs), (6, 3));
        assert_eq!((cfg.max_source_len, cfg.max_target_len), (750, 100));
        assert_eq!((cfg.min_generate_len, cfg.max_generate_len), (20, 100));
        assert_eq!(cfg.split_seed, 34);
        assert!((cfg.lr - 2e-4).abs() < 1e-12);
        assert_eq!(cfg.pad_side, PadSide::Left);
    }

    #[test]
    fn test_end_to_end_run() {
        let file = csv_file(10);
        let use_case = TrainUseCase::new(tiny_config(file.path().to_str().unwrap()));

        let device = Default::default();
        let outcome = use_case.execute::<TrainBackend>(device, &mut SilentProgress).unwrap();

        // 10 clean rows at 0.8 → 8 train, 2 held out
        assert_eq!(outcome.epochs.len(), 1);
        assert_eq!(outcome.epochs[0].train.batches, 3);
        assert_eq!(outcome.epochs[0].eval.batches, 1);
        assert_eq!(outcome.predictions.len(), 2);
    }

    #[test]
    fn test_no_clean_rows_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"transcription,keywords\n,fever\nnote,\n").unwrap();
        let use_case = TrainUseCase::new(tiny_config(file.path().to_str().unwrap()));

        let result = use_case.execute::<TrainBackend>(Default::default(), &mut SilentProgress);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_held_out_split_is_an_error() {
        let file = csv_file(4);
        let mut config = tiny_config(file.path().to_str().unwrap());
        config.train_fraction = 1.0;

        let result = TrainUseCase::new(config).execute::<TrainBackend>(Default::default(), &mut SilentProgress);
        assert!(result.is_err());
    }

    /// Run with an architecture file derived from the test model.
    fn run_with_model_config(edit: impl FnOnce(&mut KeywordTransformerConfig)) -> Result<TrainOutcome> {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_config.json");
        let mut model_config = crate::test_support::tiny_model_config(200);
        edit(&mut model_config);
        model_config.save(&path).unwrap();

        let csv = csv_file(10);
        let mut config = tiny_config(csv.path().to_str().unwrap());
        config.model_config = Some(path.to_str().unwrap().to_string());

        TrainUseCase::new(config).execute::<TrainBackend>(Default::default(), &mut SilentProgress)
    }

    #[test]
    fn test_generation_longer_than_target_table_rejected() {
        assert!(run_with_model_config(|c| c.max_target_len = 4).is_err());
    }

    #[test]
    fn test_model_config_with_matching_ids_runs() {
        let outcome = run_with_model_config(|_| {}).unwrap();
        assert_eq!(outcome.predictions.len(), 2);
    }

    #[test]
    fn test_model_special_ids_must_match_tokenizer() {
        let err = run_with_model_config(|c| c.pad_id = 7).unwrap_err();
        assert!(err.to_string().contains("pad id"));

        let err = run_with_model_config(|c| c.decoder_start_id = 2).unwrap_err();
        assert!(err.to_string().contains("decoder start id"));

        let err = run_with_model_config(|c| c.eos_id = 0).unwrap_err();
        assert!(err.to_string().contains("end-of-sequence id"));
    }
}
