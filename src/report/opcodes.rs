//! Opcode sample CSV and the marginal-cost regression report built from it.

use super::{csv_string, Align, Document, Table};
use crate::error::{Error, Result};
use crate::metrics::Sample;
use crate::stats::{linear_regression, mean, Regression};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_TITLE: &str = "ZK Benchmark Report";

/// Serializes samples with a header row; absent values are empty cells.
pub fn samples_csv(samples: &[Sample]) -> Result<String> {
    csv_string(|w| {
        for sample in samples {
            w.serialize(sample)?;
        }
        Ok(())
    })
}

/// Reads a CSV written by [`samples_csv`].
pub fn read_samples(path: &Path) -> Result<Vec<Sample>> {
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let samples = reader
        .deserialize()
        .collect::<csv::Result<Vec<Sample>>>()?;
    tracing::debug!(path = %path.display(), samples = samples.len(), "read samples");
    Ok(samples)
}

/// Sample column a regression is fitted against `op_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostMetric {
    ExecutionTime,
    ProveTime,
    Cycles,
}

impl CostMetric {
    pub fn value(&self, sample: &Sample) -> Option<f64> {
        match self {
            CostMetric::ExecutionTime => sample.execution_time_ns,
            CostMetric::ProveTime => sample.prove_time_ns,
            CostMetric::Cycles => sample.total_num_cycles.map(|c| c as f64),
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            CostMetric::ExecutionTime => "Marginal Cost by Execution Time",
            CostMetric::ProveTime => "Marginal Cost by Proving Time",
            CostMetric::Cycles => "Marginal Cost by ZK Cycles",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            CostMetric::ExecutionTime => "Marginal Time (per op)",
            CostMetric::ProveTime => "Marginal Proving Time (per op)",
            CostMetric::Cycles => "Marginal Cycles (per op)",
        }
    }

    fn format(&self, v: f64) -> String {
        match self {
            CostMetric::Cycles => format_cycles(v),
            _ => format_time(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpcodeRegression {
    pub opcode: String,
    pub fit: Regression,
    pub min_op_count: u64,
    pub max_op_count: u64,
}

/// One fit per opcode with enough points, most expensive first.
pub fn regressions(samples: &[Sample], metric: CostMetric) -> Vec<OpcodeRegression> {
    let mut by_opcode: BTreeMap<&str, Vec<(u64, f64)>> = BTreeMap::new();
    for sample in samples {
        if let Some(y) = metric.value(sample) {
            by_opcode
                .entry(sample.opcode.as_str())
                .or_default()
                .push((sample.op_count, y));
        }
    }

    let mut out: Vec<OpcodeRegression> = by_opcode
        .into_iter()
        .filter_map(|(opcode, points)| {
            let xy: Vec<(f64, f64)> = points.iter().map(|(x, y)| (*x as f64, *y)).collect();
            let fit = linear_regression(&xy)?;
            Some(OpcodeRegression {
                opcode: opcode.to_string(),
                fit,
                min_op_count: points.iter().map(|(x, _)| *x).min()?,
                max_op_count: points.iter().map(|(x, _)| *x).max()?,
            })
        })
        .collect();
    out.sort_by(|a, b| b.fit.slope.total_cmp(&a.fit.slope));
    out
}

fn scaled(v: f64, units: [&str; 4], base_decimals: usize) -> String {
    let (scale, unit) = if v.abs() >= 1e9 {
        (1e9, units[3])
    } else if v.abs() >= 1e6 {
        (1e6, units[2])
    } else if v.abs() >= 1e3 {
        (1e3, units[1])
    } else {
        return format!("{v:.base_decimals$}{}", units[0]);
    };
    format!("{:.2}{unit}", v / scale)
}

/// Nanoseconds in the largest fitting unit.
pub fn format_time(ns: f64) -> String {
    scaled(ns, ["ns", "μs", "ms", "s"], 2)
}

pub fn format_cycles(cycles: f64) -> String {
    scaled(cycles, ["", "K", "M", "B"], 2)
}

/// Decimal (SI) byte units.
pub fn format_memory(bytes: f64) -> String {
    scaled(bytes, ["B", "KB", "MB", "GB"], 0)
}

fn cost_table(doc: &mut Document, metric: CostMetric, fits: &[OpcodeRegression]) {
    doc.heading(3, metric.heading());
    doc.paragraph(format!(
        "Total: {} opcodes/precompiles with a fitted slope.",
        fits.len()
    ));
    let mut table = Table::new(["Rank", "Opcode/Precompile", metric.column(), "R²"])
        .align(1, Align::Left);
    for (i, reg) in fits.iter().enumerate() {
        table.push([
            (i + 1).to_string(),
            reg.opcode.clone(),
            metric.format(reg.fit.slope),
            format!("{:.4}", reg.fit.r_squared),
        ]);
    }
    doc.table(table);
}

fn memory_table(doc: &mut Document, samples: &[Sample]) {
    let mut by_opcode: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        if let Some(bytes) = sample.peak_memory_bytes {
            by_opcode
                .entry(sample.opcode.as_str())
                .or_default()
                .push(bytes as f64);
        }
    }
    if by_opcode.is_empty() {
        return;
    }

    doc.heading(3, "Peak Memory Usage");
    let mut table = Table::new(["Opcode/Precompile", "Avg Peak Memory", "Max Peak Memory"]);
    for (opcode, values) in by_opcode {
        let avg = mean(&values).unwrap_or_default();
        let max = values.iter().copied().fold(f64::MIN, f64::max);
        table.push([opcode.to_string(), format_memory(avg), format_memory(max)]);
    }
    doc.table(table);
}

/// Marginal-cost report: per-opcode slope tables for every metric with data,
/// a memory table, and fit details for the preferred metric.
pub fn regression_document(samples: &[Sample], title: &str, generated_at: &str) -> Document {
    let mut doc = Document::new(title);
    if !generated_at.is_empty() {
        doc.paragraph(format!("Generated: {generated_at}"));
    }
    doc.heading(2, "Summary");

    let fitted: Vec<(CostMetric, Vec<OpcodeRegression>)> = [
        CostMetric::ExecutionTime,
        CostMetric::ProveTime,
        CostMetric::Cycles,
    ]
    .into_iter()
    .map(|m| (m, regressions(samples, m)))
    .filter(|(_, fits)| !fits.is_empty())
    .collect();

    for (metric, fits) in &fitted {
        cost_table(&mut doc, *metric, fits);
    }
    memory_table(&mut doc, samples);

    // execution time > proving time > cycles
    let Some((metric, fits)) = fitted.first() else {
        doc.paragraph("No opcode has enough samples for a regression (at least 3 points).");
        return doc;
    };

    doc.rule();
    doc.heading(2, "Regression Details");
    for reg in fits {
        doc.heading(3, reg.opcode.clone());
        doc.fields([
            ("Slope", format!("{}/op", metric.format(reg.fit.slope))),
            ("Intercept", metric.format(reg.fit.intercept)),
            ("R²", format!("{:.4}", reg.fit.r_squared)),
            ("Std error", metric.format(reg.fit.std_err)),
            ("Data points", reg.fit.n_points.to_string()),
            (
                "Op count range",
                format!("{} - {}", reg.min_op_count, reg.max_op_count),
            ),
        ]);
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(opcode: &str, op_count: u64, id: u32, exec_ns: Option<f64>, cycles: Option<u64>) -> Sample {
        Sample {
            opcode: opcode.to_string(),
            op_count,
            sample_id: id,
            total_num_cycles: cycles,
            execution_time_ns: exec_ns,
            prove_time_ns: None,
            peak_memory_bytes: None,
        }
    }

    fn linear_samples() -> Vec<Sample> {
        let mut out = Vec::new();
        for n in [10, 20, 30, 40] {
            // ADD: 5 ns/op, MUL: 50 ns/op
            out.push(sample("ADD", n, 1, Some(100.0 + 5.0 * n as f64), Some(n * 3)));
            out.push(sample("MUL", n, 1, Some(50.0 * n as f64), None));
        }
        out.push(sample("SHORT", 1, 1, Some(1.0), Some(1)));
        out.push(sample("SHORT", 2, 1, Some(2.0), Some(2)));
        out
    }

    #[test]
    fn fits_are_sorted_by_slope() {
        let fits = regressions(&linear_samples(), CostMetric::ExecutionTime);
        let names: Vec<&str> = fits.iter().map(|r| r.opcode.as_str()).collect();
        assert_eq!(names, vec!["MUL", "ADD"]);
        assert!((fits[1].fit.slope - 5.0).abs() < 1e-9);
        assert!((fits[1].fit.intercept - 100.0).abs() < 1e-9);
        assert_eq!((fits[1].min_op_count, fits[1].max_op_count), (10, 40));

        let cycles = regressions(&linear_samples(), CostMetric::Cycles);
        assert_eq!(cycles.len(), 1);
        assert!((cycles[0].fit.slope - 3.0).abs() < 1e-9);
    }

    #[test]
    fn unit_formatting() {
        assert_eq!(format_time(512.0), "512.00ns");
        assert_eq!(format_time(1_500.0), "1.50μs");
        assert_eq!(format_time(2_500_000_000.0), "2.50s");
        assert_eq!(format_cycles(3_000_000.0), "3.00M");
        assert_eq!(format_memory(999.0), "999B");
        assert_eq!(format_memory(1_500_000_000.0), "1.50GB");
    }

    #[test]
    fn csv_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        let samples = linear_samples();
        std::fs::write(&path, samples_csv(&samples).unwrap()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "opcode,op_count,sample_id,total_num_cycles,execution_time_ns,prove_time_ns,peak_memory_bytes\n"
        ));
        assert_eq!(read_samples(&path).unwrap(), samples);
        assert!(matches!(
            read_samples(&dir.path().join("missing.csv")),
            Err(Error::InputNotFound(_))
        ));
    }

    #[test]
    fn report_sections() {
        let mut samples = linear_samples();
        samples[0].peak_memory_bytes = Some(2_000_000);
        let md = regression_document(&samples, DEFAULT_TITLE, "").to_markdown();

        assert!(md.starts_with("# ZK Benchmark Report\n"));
        assert!(md.contains("### Marginal Cost by Execution Time"));
        assert!(md.contains("| 1 | MUL | 50.00ns | 1.0000 |"));
        assert!(md.contains("### Marginal Cost by ZK Cycles"));
        assert!(!md.contains("Marginal Cost by Proving Time"));
        assert!(md.contains("| ADD | 2.00MB | 2.00MB |"));
        assert!(md.contains("- **Op count range:** 10 - 40"));
        assert!(!md.contains("### SHORT"));
    }

    #[test]
    fn report_without_fits() {
        let md = regression_document(&[sample("X", 1, 1, Some(1.0), None)], DEFAULT_TITLE, "")
            .to_markdown();
        assert!(md.contains("at least 3 points"));
    }
}
