// ============================================================
// Layer 4 — Length Statistics
// ============================================================
// Advisory tooling used to pick the fixed token budgets.
//
// For each field we count whitespace-separated words per record
// and summarise the distribution. The 95th percentile of the
// transcription lengths is what the 750-token input budget was
// chosen from; the keyword lengths justify the 100-token output
// budget.
//
// Quantiles use linear interpolation between order statistics,
// the same rule as numpy.quantile's default.

use serde::Serialize;

use crate::domain::record::Record;

/// Summary of a word-count distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthStats {
    pub count:  usize,
    pub min:    usize,
    pub max:    usize,
    pub mean:   f64,
    pub median: f64,
    pub p95:    f64,
    /// Equal-width buckets over [min, max]: (lower, upper, count)
    pub histogram: Vec<(usize, usize, usize)>,
}

impl LengthStats {
    /// Summarise `lengths`; `None` when there is nothing to summarise.
    pub fn from_lengths(mut lengths: Vec<usize>, bins: usize) -> Option<Self> {
        if lengths.is_empty() {
            return None;
        }
        lengths.sort_unstable();

        let count = lengths.len();
        let sum: usize = lengths.iter().sum();

        Some(Self {
            count,
            min:       lengths[0],
            max:       lengths[count - 1],
            mean:      sum as f64 / count as f64,
            median:    quantile(&lengths, 0.5),
            p95:       quantile(&lengths, 0.95),
            histogram: histogram(&lengths, bins),
        })
    }
}

/// Word-count summaries for both fields of a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthReport {
    pub source: LengthStats,
    pub target: LengthStats,
}

impl LengthReport {
    pub fn from_records(records: &[Record], bins: usize) -> Option<Self> {
        let source = records.iter().map(Record::source_words).collect();
        let target = records.iter().map(Record::target_words).collect();
        Some(Self {
            source: LengthStats::from_lengths(source, bins)?,
            target: LengthStats::from_lengths(target, bins)?,
        })
    }
}

/// Linearly interpolated quantile of an ascending slice.
///
/// # Panics
/// Panics if `sorted` is empty.
pub fn quantile(sorted: &[usize], q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac
}

fn histogram(sorted: &[usize], bins: usize) -> Vec<(usize, usize, usize)> {
    let bins = bins.max(1);
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let width = ((max - min) / bins + 1).max(1);

    let mut buckets: Vec<(usize, usize, usize)> = (0..bins)
        .map(|b| (min + b * width, min + (b + 1) * width - 1, 0))
        .collect();
    for &len in sorted {
        let b = ((len - min) / width).min(bins - 1);
        buckets[b].2 += 1;
    }
    buckets
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_matches_linear_interpolation() {
        let v = [1, 2, 3, 4];
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 1.0), 4.0);
        assert!((quantile(&v, 0.5) - 2.5).abs() < 1e-12);
        // numpy.quantile([1, 2, 3, 4], 0.95) == 3.85
        assert!((quantile(&v, 0.95) - 3.85).abs() < 1e-12);
    }

    #[test]
    fn test_single_value() {
        let s = LengthStats::from_lengths(vec![7], 4).unwrap();
        assert_eq!(s.min, 7);
        assert_eq!(s.max, 7);
        assert_eq!(s.p95, 7.0);
        assert_eq!(s.histogram.iter().map(|b| b.2).sum::<usize>(), 1);
    }

    #[test]
    fn test_histogram_counts_everything() {
        let lengths: Vec<usize> = (0..100).collect();
        let s = LengthStats::from_lengths(lengths, 10).unwrap();
        assert_eq!(s.histogram.len(), 10);
        assert_eq!(s.histogram.iter().map(|b| b.2).sum::<usize>(), 100);
        assert!((s.mean - 49.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_has_no_stats() {
        assert!(LengthStats::from_lengths(Vec::new(), 5).is_none());
        assert!(LengthReport::from_records(&[], 5).is_none());
    }

    #[test]
    fn test_report_over_records() {
        let records = vec![
            Record::new("a b c", "x"),
            Record::new("a b c d e", "x, y"),
        ];
        let r = LengthReport::from_records(&records, 2).unwrap();
        assert_eq!(r.source.max, 5);
        assert_eq!(r.target.max, 2);
    }
}
