// ============================================================
// Layer 1 — Reports
// ============================================================
// Plain-text rendering of results: the per-epoch table, the
// held-out keyword comparison and the `inspect` statistics.

use std::io::{self, Write};

use crate::application::inspect_use_case::InspectOutcome;
use crate::data::stats::LengthStats;
use crate::ml::{generator::Prediction, metrics::EpochReport};

/// One line per epoch with train and eval means.
pub fn write_epochs<W: Write>(out: &mut W, epochs: &[EpochReport]) -> io::Result<()> {
    writeln!(out, "epoch  train_loss  train_acc  eval_loss  eval_acc")?;
    for e in epochs {
        writeln!(
            out,
            "{:>5}  {:>10.4}  {:>9.4}  {:>9.4}  {:>8.4}",
            e.epoch, e.train.mean_loss, e.train.mean_accuracy, e.eval.mean_loss, e.eval.mean_accuracy,
        )?;
    }
    Ok(())
}

/// Transcription, reference keywords and generated keywords for
/// the first `rows` predictions.
pub fn write_predictions<W: Write>(out: &mut W, predictions: &[Prediction], rows: usize) -> io::Result<()> {
    for (i, p) in predictions.iter().take(rows).enumerate() {
        writeln!(out, "-----------------Row no {}------------------", i + 1)?;
        writeln!(out, "Transcription:\n{}\n", p.record.source)?;
        writeln!(out, "Keywords:\n{}\n", p.record.target)?;
        writeln!(out, "Result:\n{}\n\n", p.generated)?;
    }
    Ok(())
}

fn write_stats<W: Write>(out: &mut W, name: &str, stats: &LengthStats) -> io::Result<()> {
    writeln!(out, "{name} (words per row)")?;
    writeln!(
        out,
        "  count={} min={} max={} mean={:.1} median={:.1} p95={:.1}",
        stats.count, stats.min, stats.max, stats.mean, stats.median, stats.p95,
    )?;

    let peak = stats.histogram.iter().map(|&(_, _, n)| n).max().unwrap_or(0).max(1);
    for &(lo, hi, n) in &stats.histogram {
        writeln!(out, "  {lo:>6}-{hi:<6} {:<40} {n}", "#".repeat(40 * n / peak))?;
    }
    Ok(())
}

pub fn write_inspect<W: Write>(out: &mut W, outcome: &InspectOutcome) -> io::Result<()> {
    writeln!(
        out,
        "{} usable rows ({} without transcription, {} without keywords)\n",
        outcome.rows_kept, outcome.missing_source, outcome.missing_target,
    )?;
    write_stats(out, "transcription", &outcome.lengths.source)?;
    writeln!(out)?;
    write_stats(out, "keywords", &outcome.lengths.target)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::stats::LengthReport;
    use crate::domain::record::Record;
    use crate::ml::metrics::PassSummary;

    fn prediction(i: usize) -> Prediction {
        Prediction {
            record:    Record::new(format!("note {i}"), format!("kw {i}")),
            generated: format!("gen {i}"),
        }
    }

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_predictions_limited_to_requested_rows() {
        let predictions: Vec<Prediction> = (0..8).map(prediction).collect();
        let text = render(|out| write_predictions(out, &predictions, 5));

        assert_eq!(text.matches("-----------------Row no").count(), 5);
        assert!(text.contains("Row no 1-"));
        assert!(text.contains("Transcription:\nnote 0\n"));
        assert!(text.contains("Keywords:\nkw 0\n"));
        assert!(text.contains("Result:\ngen 0\n"));
        assert!(!text.contains("note 5"));
    }

    #[test]
    fn test_fewer_predictions_than_rows() {
        let predictions = vec![prediction(0)];
        let text = render(|out| write_predictions(out, &predictions, 5));
        assert_eq!(text.matches("Row no").count(), 1);
    }

    #[test]
    fn test_epoch_table() {
        let pass = PassSummary { batches: 2, mean_loss: 1.5, mean_accuracy: 0.25 };
        let epochs = vec![EpochReport { epoch: 1, train: pass, eval: pass }];
        let text = render(|out| write_epochs(out, &epochs));
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("1.5000"));
    }

    #[test]
    fn test_inspect_report() {
        let records = vec![Record::new("a b c", "x"), Record::new("a b c d e", "x y")];
        let outcome = InspectOutcome {
            rows_kept:      2,
            missing_source: 1,
            missing_target: 0,
            lengths:        LengthReport::from_records(&records, 2).unwrap(),
        };
        let text = render(|out| write_inspect(out, &outcome));
        assert!(text.starts_with("2 usable rows (1 without transcription"));
        assert!(text.contains("p95="));
        assert!(text.contains('#'));
    }
}
