// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and delegates all work to Layer 2.
// This is the only layer that prints to stdout.
//
// Two commands are supported:
//   1. `train`   — fine-tune, then show generated keywords
//   2. `inspect` — show word-count statistics of the dataset
//
// The backend is picked here, once, from --device and then
// passed down explicitly.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;
pub mod progress;
pub mod report;

use std::io::{self, Write};

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    tensor::backend::AutodiffBackend,
};
use clap::Parser;

use crate::application::{
    inspect_use_case::InspectUseCase,
    train_use_case::TrainUseCase,
};
use commands::{Commands, DeviceArg, InspectArgs, TrainArgs};
use progress::ConsoleProgress;

#[derive(Parser, Debug)]
#[command(
    name = "keyword-extractor",
    version,
    about = "Fine-tune a sequence-to-sequence model to extract keywords from medical transcriptions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let device      = args.device;
    let report_rows = args.report_rows;
    let use_case    = TrainUseCase::new(args.into());

    match device {
        DeviceArg::Wgpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using device {:?}", device);
            train_on::<Autodiff<Wgpu>>(&use_case, device, report_rows)
        }
        DeviceArg::Cpu => {
            let device = NdArrayDevice::Cpu;
            tracing::info!("Using device {:?}", device);
            train_on::<Autodiff<NdArray>>(&use_case, device, report_rows)
        }
    }
}

fn train_on<B: AutodiffBackend>(use_case: &TrainUseCase, device: B::Device, report_rows: usize) -> Result<()> {
    let mut console = ConsoleProgress::stdout(use_case.config().epochs);
    let outcome = use_case.execute::<B>(device, &mut console)?;

    let mut out = io::stdout().lock();
    writeln!(out)?;
    report::write_epochs(&mut out, &outcome.epochs)?;
    writeln!(out)?;
    report::write_predictions(&mut out, &outcome.predictions, report_rows)?;
    out.flush()?;
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let outcome = InspectUseCase::new(
        args.data.data,
        args.data.source_column,
        args.data.target_column,
        args.bins,
    )
    .execute()?;

    let mut out = io::stdout().lock();
    report::write_inspect(&mut out, &outcome)?;
    out.flush()?;
    Ok(())
}
