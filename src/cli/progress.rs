// ============================================================
// Layer 1 — Console Progress
// ============================================================
// Draws one progress line per pass, redrawn in place with '\r'
// after every batch and closed with a newline when the pass ends:
//
//   train 1/3 [=========================>                         ]loss=2.41 accuracy=0.132

use std::io::{self, Write};

use crate::ml::trainer::{PassMode, PassProgress, ProgressObserver};

const BAR_WIDTH: usize = 50;

/// Bar proportional to `done / total` followed by the running means.
pub fn render_bar(done: usize, total: usize, width: usize, loss: f64, accuracy: f64) -> String {
    let filled = if total == 0 { width } else { (width * done / total).min(width) };
    format!(
        "[{}>{}]loss={loss:.4} accuracy={accuracy:.4}",
        "=".repeat(filled),
        " ".repeat(width - filled),
    )
}

fn label(progress: &PassProgress, epochs: usize) -> String {
    let mode = match progress.mode {
        PassMode::Train => "train",
        PassMode::Eval  => "eval ",
    };
    format!("{mode} {}/{epochs}", progress.epoch)
}

/// Writes progress lines to any writer, stdout by default.
pub struct ConsoleProgress<W: Write> {
    out:    W,
    epochs: usize,
}

impl ConsoleProgress<io::Stdout> {
    pub fn stdout(epochs: usize) -> Self {
        Self::new(io::stdout(), epochs)
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W, epochs: usize) -> Self {
        Self { out, epochs }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, progress: &PassProgress, end: &str) {
        let line = format!(
            "{} {}{end}",
            label(progress, self.epochs),
            render_bar(
                progress.batches_done,
                progress.total_batches,
                BAR_WIDTH,
                progress.mean_loss,
                progress.mean_accuracy,
            ),
        );
        // A broken terminal must not abort training
        if let Err(e) = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!("Progress output failed: {e}");
        }
    }
}

impl<W: Write> ProgressObserver for ConsoleProgress<W> {
    fn on_batch(&mut self, progress: &PassProgress) {
        self.draw(progress, "\r");
    }

    fn on_pass_end(&mut self, progress: &PassProgress) {
        self.draw(progress, "\n");
    }
}
