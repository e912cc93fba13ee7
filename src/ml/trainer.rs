// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch driver: for each epoch run one training pass, then one
// evaluation pass. No early stopping, no learning-rate schedule,
// no checkpoints.
//
// Training pass, per batch:
//   forward (teacher-forced loss + logits)
//   → token accuracy
//   → backward + one Adam step at a fixed learning rate
//   → report running loss/accuracy
//
// Evaluation pass: same forward and metrics on `model.valid()`,
// the model on the inner (non-autodiff) backend, so no gradient
// graph is built and dropout is inactive.
//
// Progress goes to a ProgressObserver after every batch and once
// more at the end of the pass; the loop itself never prints.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{ensure, Result};
use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::Seq2SeqBatcher,
    dataset::KeywordDataset,
    sampler::BatchSampler,
};
use crate::ml::metrics::{token_accuracy, EpochReport, PassSummary, RunningMetrics};
use crate::ml::seq2seq::Seq2SeqModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    Train,
    Eval,
}

/// Snapshot handed to observers after each batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassProgress {
    pub mode:          PassMode,
    pub epoch:         usize,
    pub batches_done:  usize,
    pub total_batches: usize,
    pub mean_loss:     f64,
    pub mean_accuracy: f64,
}

impl PassProgress {
    fn new(mode: PassMode, epoch: usize, total_batches: usize, metrics: &RunningMetrics) -> Self {
        Self {
            mode,
            epoch,
            batches_done: metrics.batches(),
            total_batches,
            mean_loss: metrics.mean_loss(),
            mean_accuracy: metrics.mean_accuracy(),
        }
    }
}

/// Receives progress from the training loop.
pub trait ProgressObserver {
    /// Called after every batch
    fn on_batch(&mut self, progress: &PassProgress);

    /// Called once after the final batch of a pass
    fn on_pass_end(&mut self, progress: &PassProgress);
}

/// Observer that ignores everything.
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_batch(&mut self, _: &PassProgress) {}
    fn on_pass_end(&mut self, _: &PassProgress) {}
}

#[derive(Debug, Clone, Copy)]
pub struct TrainerConfig {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    /// Seed for the per-pass shuffle of the training set
    pub shuffle_seed:  Option<u64>,
}

pub struct Trainer<'a, B: AutodiffBackend> {
    train_set:     &'a KeywordDataset,
    eval_set:      &'a KeywordDataset,
    train_sampler: BatchSampler,
    eval_sampler:  BatchSampler,
    train_batcher: Seq2SeqBatcher<B>,
    eval_batcher:  Seq2SeqBatcher<B::InnerBackend>,
    config:        TrainerConfig,
}

impl<'a, B: AutodiffBackend> Trainer<'a, B> {
    pub fn new(
        train_set: &'a KeywordDataset,
        eval_set:  &'a KeywordDataset,
        config:    TrainerConfig,
        device:    B::Device,
    ) -> Result<Self> {
        ensure!(train_set.record_count() > 0, "Training set is empty; nothing to train on");
        ensure!(eval_set.record_count() > 0, "Evaluation set is empty; nothing to evaluate on");

        // Training order is reshuffled every pass; evaluation keeps index order
        let train_sampler = BatchSampler::new(
            train_set.record_count(), config.batch_size, true, config.shuffle_seed,
        )?;
        let eval_sampler = BatchSampler::new(
            eval_set.record_count(), config.batch_size, false, None,
        )?;

        Ok(Self {
            train_set,
            eval_set,
            train_sampler,
            eval_sampler,
            train_batcher: Seq2SeqBatcher::new(device.clone()),
            eval_batcher:  Seq2SeqBatcher::new(device),
            config,
        })
    }

    /// Run every epoch and return the trained model with per-epoch summaries.
    pub fn fit<M, O>(
        &mut self,
        mut model: M,
        optim:     &mut O,
        observer:  &mut dyn ProgressObserver,
    ) -> Result<(M, Vec<EpochReport>)>
    where
        M: AutodiffModule<B> + Seq2SeqModel<B>,
        M::InnerModule: Seq2SeqModel<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        let mut reports = Vec::with_capacity(self.config.epochs);

        for epoch in 1..=self.config.epochs {
            let (trained, train) = self.train_pass(model, optim, epoch, observer)?;
            model = trained;

            let eval = self.eval_pass(&model.valid(), epoch, observer)?;

            tracing::info!(
                "Epoch {:>3}/{} | train_loss={:.4} train_acc={:.4} | eval_loss={:.4} eval_acc={:.4}",
                epoch, self.config.epochs,
                train.mean_loss, train.mean_accuracy,
                eval.mean_loss, eval.mean_accuracy,
            );
            reports.push(EpochReport { epoch, train, eval });
        }

        Ok((model, reports))
    }

    /// One shuffled pass over the training set with weight updates.
    pub fn train_pass<M, O>(
        &mut self,
        mut model: M,
        optim:     &mut O,
        epoch:     usize,
        observer:  &mut dyn ProgressObserver,
    ) -> Result<(M, PassSummary)>
    where
        M: AutodiffModule<B> + Seq2SeqModel<B>,
        O: Optimizer<M, B>,
    {
        let total = self.train_sampler.num_batches();
        let mut metrics = RunningMetrics::new();

        for batch in self.train_sampler.batches(self.train_set, &self.train_batcher) {
            let batch = batch?;

            let output   = model.forward_loss(batch.inputs, batch.labels.clone());
            let accuracy = token_accuracy(output.logits, batch.labels);
            let loss_val = output.loss.clone().into_scalar().elem::<f64>();

            // Fresh gradients from this loss only, then one Adam update
            let grads = output.loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(self.config.learning_rate, model, grads);

            metrics.update(loss_val, accuracy);
            observer.on_batch(&PassProgress::new(PassMode::Train, epoch, total, &metrics));
        }

        observer.on_pass_end(&PassProgress::new(PassMode::Train, epoch, total, &metrics));
        Ok((model, PassSummary::from(&metrics)))
    }

    /// One ordered pass over the evaluation set, weights untouched.
    pub fn eval_pass<M>(
        &mut self,
        model:    &M,
        epoch:    usize,
        observer: &mut dyn ProgressObserver,
    ) -> Result<PassSummary>
    where
        M: Seq2SeqModel<B::InnerBackend>,
    {
        let total = self.eval_sampler.num_batches();
        let mut metrics = RunningMetrics::new();

        for batch in self.eval_sampler.batches(self.eval_set, &self.eval_batcher) {
            let batch = batch?;

            let output   = model.forward_loss(batch.inputs, batch.labels.clone());
            let accuracy = token_accuracy(output.logits, batch.labels);
            let loss_val = output.loss.into_scalar().elem::<f64>();

            metrics.update(loss_val, accuracy);
            observer.on_batch(&PassProgress::new(PassMode::Eval, epoch, total, &metrics));
        }

        observer.on_pass_end(&PassProgress::new(PassMode::Eval, epoch, total, &metrics));
        Ok(PassSummary::from(&metrics))
    }
}
