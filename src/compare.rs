//! Joining two metrics tables and computing per-test ratios.
//!
//! Ratios are always `left / right`, so a value above 1 means the left system
//! was slower, produced bigger proofs or used more memory. Aggregates are taken
//! over the per-test ratios, never as a ratio of totals.

use crate::loader::MetricsTable;
use crate::metrics::{extract_proving, ProvingSummary};
use crate::stats::Summary;
use std::collections::BTreeSet;

/// Why a ratio could not be computed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioError {
    #[error("denominator is zero")]
    ZeroDenominator,
    #[error("operand is not a finite number")]
    NonFinite,
}

pub type Ratio = Result<f64, RatioError>;

pub fn ratio(numerator: f64, denominator: f64) -> Ratio {
    if !numerator.is_finite() || !denominator.is_finite() {
        return Err(RatioError::NonFinite);
    }
    if denominator == 0.0 {
        return Err(RatioError::ZeroDenominator);
    }
    let q = numerator / denominator;
    if !q.is_finite() {
        return Err(RatioError::NonFinite);
    }
    Ok(q)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatioMetric {
    /// Proving time.
    Speedup,
    ProofSize,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One test present on both sides with complete proving metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub test_name: String,
    pub left: ProvingSummary,
    pub right: ProvingSummary,
    pub speedup: Ratio,
    pub proof_size_ratio: Ratio,
    pub memory_ratio: Ratio,
}

impl ComparisonRow {
    pub fn new(test_name: impl Into<String>, left: ProvingSummary, right: ProvingSummary) -> Self {
        Self {
            test_name: test_name.into(),
            speedup: ratio(left.proving_time_s(), right.proving_time_s()),
            proof_size_ratio: ratio(left.proof_size_kb(), right.proof_size_kb()),
            memory_ratio: ratio(left.peak_memory_gb(), right.peak_memory_gb()),
            left,
            right,
        }
    }

    pub fn ratio(&self, metric: RatioMetric) -> Ratio {
        match metric {
            RatioMetric::Speedup => self.speedup,
            RatioMetric::ProofSize => self.proof_size_ratio,
            RatioMetric::Memory => self.memory_ratio,
        }
    }

    fn values(&self, metric: RatioMetric) -> (f64, f64) {
        match metric {
            RatioMetric::Speedup => (self.left.proving_time_s(), self.right.proving_time_s()),
            RatioMetric::ProofSize => (self.left.proof_size_kb(), self.right.proof_size_kb()),
            RatioMetric::Memory => (self.left.peak_memory_gb(), self.right.peak_memory_gb()),
        }
    }

    /// `left - right` in report units (s, KiB, GiB).
    pub fn difference(&self, metric: RatioMetric) -> f64 {
        let (l, r) = self.values(metric);
        l - r
    }

    /// Side with the smaller value; ties go to the right side.
    pub fn winner(&self, metric: RatioMetric) -> Side {
        let (l, r) = self.values(metric);
        if l < r {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Mean/median/min/max over the comparable ratios of one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioStats {
    pub summary: Option<Summary>,
    /// Pairs excluded because the ratio was undefined.
    pub incomparable: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonResult {
    /// Keys present in both tables, whether or not they have metrics.
    pub common: Vec<String>,
    pub left_only: Vec<String>,
    pub right_only: Vec<String>,
    /// Common keys with complete proving metrics on both sides, in key order.
    pub rows: Vec<ComparisonRow>,
    /// Common keys where at least one side lacks proving metrics.
    pub without_metrics: Vec<String>,
}

impl ComparisonResult {
    pub fn ratio_stats(&self, metric: RatioMetric) -> RatioStats {
        let (ok, bad): (Vec<Ratio>, Vec<Ratio>) =
            self.rows.iter().map(|r| r.ratio(metric)).partition(Result::is_ok);
        let values: Vec<f64> = ok.into_iter().flatten().collect();
        RatioStats {
            summary: Summary::of(&values),
            incomparable: bad.len(),
        }
    }

    /// Summed proving time in seconds over the comparable rows, `(left, right)`.
    pub fn total_proving_time_s(&self) -> (f64, f64) {
        self.rows.iter().fold((0.0, 0.0), |(l, r), row| {
            (l + row.left.proving_time_s(), r + row.right.proving_time_s())
        })
    }

    /// Rows with a defined ratio, sorted by it. Equal values keep key order.
    pub fn ranked(&self, metric: RatioMetric, order: SortOrder) -> Vec<&ComparisonRow> {
        let mut rows: Vec<(&ComparisonRow, f64)> = self
            .rows
            .iter()
            .filter_map(|row| row.ratio(metric).ok().map(|v| (row, v)))
            .collect();
        match order {
            SortOrder::Descending => rows.sort_by(|a, b| b.1.total_cmp(&a.1)),
            SortOrder::Ascending => rows.sort_by(|a, b| a.1.total_cmp(&b.1)),
        }
        rows.into_iter().map(|(row, _)| row).collect()
    }

    /// The `n` largest ratios.
    pub fn top(&self, metric: RatioMetric, n: usize) -> Vec<&ComparisonRow> {
        let mut rows = self.ranked(metric, SortOrder::Descending);
        rows.truncate(n);
        rows
    }

    /// The `n` smallest ratios, smallest first.
    pub fn bottom(&self, metric: RatioMetric, n: usize) -> Vec<&ComparisonRow> {
        let mut rows = self.ranked(metric, SortOrder::Ascending);
        rows.truncate(n);
        rows
    }

    /// Rows whose `metric` ratio is undefined.
    pub fn incomparable(&self, metric: RatioMetric) -> Vec<&ComparisonRow> {
        self.rows
            .iter()
            .filter(|row| row.ratio(metric).is_err())
            .collect()
    }
}

pub fn compare(left: &MetricsTable, right: &MetricsTable) -> ComparisonResult {
    let left_keys: BTreeSet<&String> = left.keys().collect();
    let right_keys: BTreeSet<&String> = right.keys().collect();

    let mut result = ComparisonResult {
        common: left_keys
            .intersection(&right_keys)
            .map(|k| k.to_string())
            .collect(),
        left_only: left_keys
            .difference(&right_keys)
            .map(|k| k.to_string())
            .collect(),
        right_only: right_keys
            .difference(&left_keys)
            .map(|k| k.to_string())
            .collect(),
        ..Default::default()
    };

    for key in &result.common {
        match (extract_proving(&left[key]), extract_proving(&right[key])) {
            (Some(l), Some(r)) => result.rows.push(ComparisonRow::new(key.clone(), l, r)),
            (l, r) => {
                let side = match (l.is_some(), r.is_some()) {
                    (true, false) => "right",
                    (false, true) => "left",
                    _ => "both",
                };
                tracing::warn!(test = %key, side, "missing proving metrics, excluded from comparison");
                result.without_metrics.push(key.clone());
            }
        }
    }

    tracing::debug!(
        common = result.common.len(),
        comparable = result.rows.len(),
        left_only = result.left_only.len(),
        right_only = result.right_only.len(),
        "joined metrics tables"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BenchmarkRecord;

    fn proved(time_ms: f64, size: u64, mem: u64) -> BenchmarkRecord {
        serde_json::from_value(serde_json::json!({
            "proving": {"success": {
                "proving_time_ms": time_ms,
                "proof_size": size,
                "peak_memory_usage_bytes": mem,
            }}
        }))
        .unwrap()
    }

    fn table(entries: &[(&str, BenchmarkRecord)]) -> MetricsTable {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn join_reports_all_three_key_sets() {
        let left = table(&[("a", proved(1.0, 1, 1)), ("b", proved(1.0, 1, 1))]);
        let right = table(&[("b", proved(1.0, 1, 1)), ("c", proved(1.0, 1, 1))]);

        let result = compare(&left, &right);
        assert_eq!(result.common, vec!["b"]);
        assert_eq!(result.left_only, vec!["a"]);
        assert_eq!(result.right_only, vec!["c"]);
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn common_keys_without_metrics_still_count() {
        let left = table(&[("a", proved(1.0, 1, 1)), ("b", BenchmarkRecord::default())]);
        let right = table(&[("a", proved(1.0, 1, 1)), ("b", proved(1.0, 1, 1))]);

        let result = compare(&left, &right);
        assert_eq!(result.common, vec!["a", "b"]);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.without_metrics, vec!["b"]);
    }

    #[test]
    fn speedup_is_left_over_right() {
        let left = table(&[("t", proved(100_000.0, 2048, 4 << 30))]);
        let right = table(&[("t", proved(50_000.0, 1024, 1 << 30))]);

        let row = &compare(&left, &right).rows[0];
        assert_eq!(row.speedup, Ok(2.0));
        assert_eq!(row.proof_size_ratio, Ok(2.0));
        assert_eq!(row.memory_ratio, Ok(4.0));
        assert_eq!(row.difference(RatioMetric::Speedup), 50.0);
        assert_eq!(row.winner(RatioMetric::Speedup), Side::Right);
    }

    #[test]
    fn mean_of_ratios_not_ratio_of_sums() {
        // ratios 2.0 and 0.5 -> mean 1.25; sums 1000/2000 would give 0.5
        let left = table(&[("a", proved(200.0, 1, 1)), ("b", proved(800.0, 1, 1))]);
        let right = table(&[("a", proved(100.0, 1, 1)), ("b", proved(1600.0, 1, 1))]);

        let stats = compare(&left, &right).ratio_stats(RatioMetric::Speedup);
        let summary = stats.summary.unwrap();
        assert_eq!(summary.mean, 1.25);
        assert_eq!(summary.median, 1.25);
        assert_eq!(summary.min, 0.5);
        assert_eq!(summary.max, 2.0);
        assert_eq!(stats.incomparable, 0);
    }

    #[test]
    fn zero_denominator_is_flagged_not_averaged() {
        let left = table(&[("a", proved(100.0, 10, 10)), ("b", proved(300.0, 10, 10))]);
        let right = table(&[("a", proved(0.0, 10, 10)), ("b", proved(100.0, 10, 10))]);

        let result = compare(&left, &right);
        assert_eq!(result.rows[0].speedup, Err(RatioError::ZeroDenominator));

        let stats = result.ratio_stats(RatioMetric::Speedup);
        assert_eq!(stats.incomparable, 1);
        assert_eq!(stats.summary.unwrap().mean, 3.0);
        assert_eq!(result.incomparable(RatioMetric::Speedup).len(), 1);
        assert_eq!(result.ranked(RatioMetric::Speedup, SortOrder::Descending).len(), 1);
    }

    #[test]
    fn overflowing_ratio_is_incomparable() {
        assert_eq!(ratio(1.0, 1e-320), Err(RatioError::NonFinite));
        assert_eq!(ratio(f64::MAX, 0.5), Err(RatioError::NonFinite));

        let left = table(&[("a", proved(5e305, 1, 1)), ("b", proved(200.0, 1, 1))]);
        let right = table(&[("a", proved(1e-5, 1, 1)), ("b", proved(100.0, 1, 1))]);
        let result = compare(&left, &right);
        assert_eq!(result.rows[0].speedup, Err(RatioError::NonFinite));

        let stats = result.ratio_stats(RatioMetric::Speedup);
        assert_eq!(stats.incomparable, 1);
        let summary = stats.summary.unwrap();
        assert_eq!((summary.count, summary.max), (1, 2.0));
    }

    #[test]
    fn ratio_rejects_non_finite() {
        assert_eq!(ratio(f64::NAN, 1.0), Err(RatioError::NonFinite));
        assert_eq!(ratio(1.0, f64::INFINITY), Err(RatioError::NonFinite));
        assert_eq!(ratio(0.0, 0.0), Err(RatioError::ZeroDenominator));
        assert_eq!(ratio(3.0, 2.0), Ok(1.5));
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let left = table(&[
            ("a", proved(200.0, 1, 1)),
            ("b", proved(300.0, 1, 1)),
            ("c", proved(200.0, 1, 1)),
            ("d", proved(100.0, 1, 1)),
        ]);
        let right = table(&[
            ("a", proved(100.0, 1, 1)),
            ("b", proved(100.0, 1, 1)),
            ("c", proved(100.0, 1, 1)),
            ("d", proved(100.0, 1, 1)),
        ]);
        let result = compare(&left, &right);

        let names = |rows: Vec<&ComparisonRow>| -> Vec<String> {
            rows.into_iter().map(|r| r.test_name.clone()).collect()
        };
        assert_eq!(names(result.top(RatioMetric::Speedup, 3)), vec!["b", "a", "c"]);
        assert_eq!(names(result.bottom(RatioMetric::Speedup, 2)), vec!["d", "a"]);
        assert_eq!(result.top(RatioMetric::Speedup, 10).len(), 4);
    }
}
