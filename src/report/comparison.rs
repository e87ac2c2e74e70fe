//! Two-system comparison reports: console text, markdown/HTML summary,
//! per-test speedup table and the CSV exports.

use super::{csv_string, ratio_cell, thousands, Align, Document, Table, INCOMPARABLE};
use crate::compare::{ratio, ComparisonResult, ComparisonRow, Ratio, RatioMetric, Side, SortOrder};
use crate::config::{Labels, ReportConfig};
use crate::error::{Error, Result};
use crate::names::NameParser;
use crate::schema::HardwareInfo;
use crate::OutputFormat;

const TEXT_NAME_WIDTH: usize = 47;
const MARKDOWN_NAME_WIDTH: usize = 80;
const COVERAGE_SAMPLE: usize = 5;

/// Where the two metric sets came from.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub left: String,
    pub right: String,
    pub left_hardware: Option<HardwareInfo>,
    pub right_hardware: Option<HardwareInfo>,
}

impl Sources {
    fn fields(&self, labels: &Labels) -> Vec<(String, String)> {
        let mut fields = vec![
            (format!("{} Folder", labels.left), self.left.clone()),
            (format!("{} Folder", labels.right), self.right.clone()),
        ];
        if let Some(hw) = &self.left_hardware {
            fields.push((format!("{} Hardware", labels.left), hw.describe()));
        }
        if let Some(hw) = &self.right_hardware {
            fields.push((format!("{} Hardware", labels.right), hw.describe()));
        }
        fields
    }
}

/// The better side for a mean `left / right` ratio and by how much.
/// `None` when the mean itself is unusable.
fn advantage(mean: f64) -> Option<(Side, f64)> {
    if mean > 1.0 {
        Some((Side::Right, mean))
    } else {
        ratio(1.0, mean).ok().map(|inverse| (Side::Left, inverse))
    }
}

fn label(labels: &Labels, side: Side) -> &str {
    match side {
        Side::Left => &labels.left,
        Side::Right => &labels.right,
    }
}

fn seconds(s: f64) -> String {
    format!("{}s ({:.1} hours)", thousands(s, 0), s / 3600.0)
}

fn mean_ratio(result: &ComparisonResult, metric: RatioMetric) -> Option<f64> {
    result.ratio_stats(metric).summary.map(|s| s.mean)
}

/// Renders the report for `config.format`. `detailed` selects the wide CSV
/// and is rejected for every other format.
pub fn render(
    result: &ComparisonResult,
    config: &ReportConfig,
    sources: &Sources,
    detailed: bool,
) -> Result<String> {
    match config.format {
        OutputFormat::Csv if detailed => detailed_csv(result, &config.labels),
        OutputFormat::Csv => csv(result, &config.labels),
        _ if detailed => Err(Error::ConflictingFlags("--detailed", "a non-csv --format")),
        OutputFormat::Text => Ok(text_document(result, config, sources).to_text()),
        format => Ok(summary_document(result, config, sources).render(format)),
    }
}

fn coverage_fields(result: &ComparisonResult, labels: &Labels) -> Vec<(String, String)> {
    vec![
        ("Common tests".to_string(), result.common.len().to_string()),
        (format!("{} only", labels.left), result.left_only.len().to_string()),
        (format!("{} only", labels.right), result.right_only.len().to_string()),
        (
            "Comparable (complete proving metrics)".to_string(),
            result.rows.len().to_string(),
        ),
        (
            "Common but missing proving metrics".to_string(),
            result.without_metrics.len().to_string(),
        ),
    ]
}

fn sample_list(doc: &mut Document, heading: String, keys: &[String]) {
    if keys.is_empty() {
        return;
    }
    doc.paragraph(heading);
    let mut items: Vec<String> = keys.iter().take(COVERAGE_SAMPLE).cloned().collect();
    if keys.len() > COVERAGE_SAMPLE {
        items.push(format!("... and {} more", keys.len() - COVERAGE_SAMPLE));
    }
    doc.bullets(items);
}

fn stats_table(result: &ComparisonResult, labels: &Labels) -> Table {
    let mut table = Table::new(["Metric", "Mean", "Median", "Min", "Max", "Incomparable"]);
    for (name, metric) in [
        ("Speedup", RatioMetric::Speedup),
        ("Proof size ratio", RatioMetric::ProofSize),
        ("Memory ratio", RatioMetric::Memory),
    ] {
        let stats = result.ratio_stats(metric);
        let cells = match stats.summary {
            Some(s) => [s.mean, s.median, s.min, s.max].map(|v| format!("{v:.2}x")),
            None => std::array::from_fn(|_| "-".to_string()),
        };
        let mut row = vec![format!("{name} ({}/{})", labels.left, labels.right)];
        row.extend(cells);
        row.push(stats.incomparable.to_string());
        table.push(row);
    }
    table
}

fn verdicts(result: &ComparisonResult, labels: &Labels) -> Vec<String> {
    let mut out = Vec::new();
    let phrases = [
        (RatioMetric::Speedup, "is faster at proving"),
        (RatioMetric::ProofSize, "produces smaller proofs"),
        (RatioMetric::Memory, "uses less memory"),
    ];
    for (metric, phrase) in phrases {
        if let Some((side, factor)) = mean_ratio(result, metric).and_then(advantage) {
            out.push(format!(
                "{} {phrase} by {factor:.2}x on average",
                label(labels, side)
            ));
        }
    }
    out
}

fn performer(row: &ComparisonRow, labels: &Labels, saved_by: Side) -> String {
    let (l, r) = (row.left.proving_time_s(), row.right.proving_time_s());
    let saved = match saved_by {
        Side::Right => l - r,
        Side::Left => r - l,
    };
    format!(
        "{}\n   Speedup: {}\n   {}: {}s | {}: {}s | Time saved: {}s",
        row.test_name,
        ratio_cell(row.speedup, 2),
        labels.left,
        thousands(l, 0),
        labels.right,
        thousands(r, 0),
        thousands(saved, 0),
    )
}

/// Console report: coverage, ratio statistics, extremes, detailed table.
pub fn text_document(result: &ComparisonResult, config: &ReportConfig, sources: &Sources) -> Document {
    let labels = &config.labels;
    let mut doc = Document::new(format!("{} vs {} metrics comparison", labels.left, labels.right));
    doc.fields(sources.fields(labels));

    doc.heading(2, "Test coverage");
    doc.fields(coverage_fields(result, labels));
    sample_list(
        &mut doc,
        format!("Sample of {}-only tests (first {COVERAGE_SAMPLE}):", labels.left),
        &result.left_only,
    );
    sample_list(
        &mut doc,
        format!("Sample of {}-only tests (first {COVERAGE_SAMPLE}):", labels.right),
        &result.right_only,
    );
    sample_list(
        &mut doc,
        format!("Common tests missing proving metrics (first {COVERAGE_SAMPLE}):"),
        &result.without_metrics,
    );

    if result.rows.is_empty() {
        doc.paragraph("No comparable tests.");
        return doc;
    }

    doc.heading(2, "Summary statistics");
    doc.table(stats_table(result, labels));
    let (total_l, total_r) = result.total_proving_time_s();
    doc.fields([
        (format!("Total {} proving time", labels.left), seconds(total_l)),
        (format!("Total {} proving time", labels.right), seconds(total_r)),
    ]);
    doc.bullets(verdicts(result, labels));

    let n = config.top_n;
    doc.heading(
        2,
        format!("Top {n} best speedups (where {} is fastest)", labels.right),
    );
    doc.numbered(
        result
            .top(RatioMetric::Speedup, n)
            .into_iter()
            .map(|row| performer(row, labels, Side::Right))
            .collect(),
    );
    doc.heading(
        2,
        format!("Top {n} worst speedups (where {} is fastest)", labels.left),
    );
    doc.numbered(
        result
            .bottom(RatioMetric::Speedup, n)
            .into_iter()
            .map(|row| performer(row, labels, Side::Left))
            .collect(),
    );

    doc.heading(2, "Detailed comparison (common tests)");
    let mut table = Table::new([
        "Test Name".to_string(),
        format!("{} Time (s)", labels.left),
        format!("{} Time (s)", labels.right),
        format!("Speedup ({}/{})", labels.left, labels.right),
    ])
    .truncate_column(0, TEXT_NAME_WIDTH);
    for row in result
        .ranked(RatioMetric::Speedup, SortOrder::Descending)
        .into_iter()
        .take(config.limit)
    {
        table.push([
            row.test_name.clone(),
            thousands(row.left.proving_time_s(), 0),
            thousands(row.right.proving_time_s(), 0),
            ratio_cell(row.speedup, 2),
        ]);
    }
    doc.table(table);

    let incomparable = result.incomparable(RatioMetric::Speedup);
    if !incomparable.is_empty() {
        doc.heading(3, "Incomparable speedups");
        doc.bullets(
            incomparable
                .iter()
                .map(|row| format!("{}: {}", row.test_name, INCOMPARABLE))
                .collect(),
        );
    }
    doc
}

fn coverage_table(result: &ComparisonResult, labels: &Labels) -> Table {
    let mut table = Table::new(["Category", "Count", "Notes"]).align(2, Align::Left);
    table.push([
        "Common tests".to_string(),
        result.common.len().to_string(),
        "Tests executed by both systems".to_string(),
    ]);
    table.push([
        "Comparable".to_string(),
        result.rows.len().to_string(),
        "Common tests with complete proving metrics on both sides".to_string(),
    ]);
    table.push([
        format!("{} only", labels.left),
        result.left_only.len().to_string(),
        format!("Tests only in {}", labels.left),
    ]);
    table.push([
        format!("{} only", labels.right),
        result.right_only.len().to_string(),
        format!("Tests only in {}", labels.right),
    ]);
    table
}

fn ratio_analysis(
    doc: &mut Document,
    result: &ComparisonResult,
    labels: &Labels,
    metric: RatioMetric,
    heading: &str,
    phrase: &str,
) {
    let stats = result.ratio_stats(metric);
    doc.heading(3, heading);
    let Some(summary) = stats.summary else {
        doc.paragraph("No comparable values.");
        return;
    };
    if let Some((side, _)) = advantage(summary.mean) {
        doc.paragraph(format!("{} {phrase}:", label(labels, side)));
    }
    let mut fields = vec![
        ("Average ratio".to_string(), format!("{:.2}x", summary.mean)),
        ("Median ratio".to_string(), format!("{:.2}x", summary.median)),
        (
            "Range".to_string(),
            format!("{:.2}x to {:.2}x", summary.min, summary.max),
        ),
    ];
    if stats.incomparable > 0 {
        fields.push(("Incomparable pairs".to_string(), stats.incomparable.to_string()));
    }
    doc.fields(fields);
}

/// Markdown / HTML summary of a comparison.
pub fn summary_document(
    result: &ComparisonResult,
    config: &ReportConfig,
    sources: &Sources,
) -> Document {
    let labels = &config.labels;
    let mut doc = Document::new(format!(
        "{} vs {} Metrics Comparison Summary",
        labels.left, labels.right
    ));
    let mut header = sources.fields(labels);
    header.push(("Common Tests".to_string(), result.common.len().to_string()));
    doc.fields(header);
    if !config.generated_at.is_empty() {
        doc.paragraph(format!("Generated on: {}", config.generated_at));
    }
    doc.rule();

    if result.rows.is_empty() {
        doc.paragraph("No common tests to compare.");
        doc.heading(2, "Test Coverage");
        doc.table(coverage_table(result, labels));
        missing_metrics(&mut doc, result);
        return doc;
    }

    doc.heading(2, "Executive Summary");
    let mut exec = Table::new(["Metric", "Winner", "Performance Advantage"])
        .align(1, Align::Left)
        .align(2, Align::Left);
    for (name, metric, phrase) in [
        ("Proving Speed", RatioMetric::Speedup, "faster on average"),
        ("Proof Size", RatioMetric::ProofSize, "smaller proofs"),
        ("Memory Usage", RatioMetric::Memory, "less memory"),
    ] {
        match mean_ratio(result, metric).and_then(advantage) {
            Some((side, factor)) => exec.push([
                name.to_string(),
                label(labels, side).to_string(),
                format!("{factor:.2}x {phrase}"),
            ]),
            None => exec.push([name, "-", INCOMPARABLE]),
        }
    }
    doc.table(exec);
    doc.rule();

    doc.heading(2, "Detailed Performance Analysis");
    ratio_analysis(
        &mut doc,
        result,
        labels,
        RatioMetric::Speedup,
        "Proving Time Performance",
        "is faster at proving",
    );
    let (total_l, total_r) = result.total_proving_time_s();
    doc.paragraph("Time Comparison:");
    doc.fields([
        (format!("Total {} time", labels.left), seconds(total_l)),
        (format!("Total {} time", labels.right), seconds(total_r)),
        ("Time difference".to_string(), seconds((total_l - total_r).abs())),
    ]);
    ratio_analysis(
        &mut doc,
        result,
        labels,
        RatioMetric::ProofSize,
        "Proof Size Analysis",
        "generates smaller proofs",
    );
    ratio_analysis(
        &mut doc,
        result,
        labels,
        RatioMetric::Memory,
        "Memory Usage Analysis",
        "is more memory efficient",
    );
    doc.rule();

    let n = config.top_n;
    doc.heading(2, "Top Performance Winners");
    doc.heading(
        3,
        format!("Top {n} Tests Where {} Dominates (Fastest Proving)", labels.right),
    );
    doc.numbered(
        result
            .top(RatioMetric::Speedup, n)
            .into_iter()
            .map(|row| {
                format!(
                    "{}: {} faster, saved {}s",
                    row.test_name,
                    ratio_cell(row.speedup, 2),
                    thousands(row.difference(RatioMetric::Speedup), 0)
                )
            })
            .collect(),
    );
    doc.heading(
        3,
        format!("Top {n} Tests Where {} Dominates (Fastest Proving)", labels.left),
    );
    doc.numbered(
        result
            .bottom(RatioMetric::Speedup, n)
            .into_iter()
            .map(|row| {
                let inverse = row.speedup.and_then(|s| ratio(1.0, s));
                format!(
                    "{}: {} faster than {}, saved {}s",
                    row.test_name,
                    ratio_cell(inverse, 2),
                    labels.right,
                    thousands(-row.difference(RatioMetric::Speedup), 0)
                )
            })
            .collect(),
    );
    doc.rule();

    doc.heading(2, "Test Coverage");
    doc.table(coverage_table(result, labels));
    missing_metrics(&mut doc, result);
    doc
}

fn missing_metrics(doc: &mut Document, result: &ComparisonResult) {
    sample_list(
        doc,
        "Common tests excluded for missing proving metrics:".to_string(),
        &result.without_metrics,
    );
}

fn winner_phrase(labels: &Labels, r: Ratio, verb: &str) -> String {
    match r {
        Ok(v) if v < 1.0 => match ratio(1.0, v) {
            Ok(inv) => format!("{} {verb} {inv:.1}x", labels.left),
            Err(_) => INCOMPARABLE.to_string(),
        },
        Ok(v) => format!("{} {verb} {v:.1}x", labels.right),
        Err(_) => INCOMPARABLE.to_string(),
    }
}

fn summary_rows(result: &ComparisonResult, metric: RatioMetric, name: &str, labels: &Labels) -> Vec<[String; 2]> {
    let stats = result.ratio_stats(metric);
    let Some(s) = stats.summary else {
        return vec![[name.to_string(), INCOMPARABLE.to_string()]];
    };
    let mut rows = vec![
        [
            format!("Average {name} ({}/{})", labels.left, labels.right),
            format!("{:.3}x", s.mean),
        ],
        [format!("Median {name}"), format!("{:.3}x", s.median)],
        [format!("Min {name}"), format!("{:.3}x", s.min)],
        [format!("Max {name}"), format!("{:.3}x", s.max)],
    ];
    if stats.incomparable > 0 {
        rows.push(["Incomparable pairs".to_string(), stats.incomparable.to_string()]);
    }
    rows
}

/// Per-test proving time and memory winners, slowest-for-right first.
pub fn speedup_document(
    result: &ComparisonResult,
    labels: &Labels,
    sources: &Sources,
    names: &dyn NameParser,
) -> Document {
    let mut doc = Document::new(format!("{} vs {} Performance Comparison", labels.left, labels.right));
    doc.fields([
        ("Comparing".to_string(), format!("{} vs {}", sources.left, sources.right)),
        ("Total Tests Compared".to_string(), result.rows.len().to_string()),
    ]);
    doc.rule();

    doc.heading(2, "Summary Statistics");
    doc.heading(3, "Proving Time Performance");
    let mut time = Table::new(["Metric", "Value"]);
    for row in summary_rows(result, RatioMetric::Speedup, "Speedup", labels) {
        time.push(row);
    }
    let (total_l, total_r) = result.total_proving_time_s();
    time.push([format!("Total {} Time", labels.left), seconds(total_l)]);
    time.push([format!("Total {} Time", labels.right), seconds(total_r)]);
    time.push(["Time Saved".to_string(), seconds(total_r - total_l)]);
    doc.table(time);
    if let Some((side, factor)) = mean_ratio(result, RatioMetric::Speedup).and_then(advantage) {
        doc.paragraph(format!("{} is {factor:.2}x faster on average", label(labels, side)));
    }

    doc.heading(3, "Memory Usage");
    let mut memory = Table::new(["Metric", "Value"]);
    for row in summary_rows(result, RatioMetric::Memory, "Memory Ratio", labels) {
        memory.push(row);
    }
    doc.table(memory);
    if let Some((side, factor)) = mean_ratio(result, RatioMetric::Memory).and_then(advantage) {
        doc.paragraph(format!("{} uses {factor:.2}x less memory on average", label(labels, side)));
    }
    doc.rule();

    doc.heading(2, "Detailed Per-Test Comparison");
    let mut table = Table::new([
        "Test Name".to_string(),
        format!("{} Time (s)", labels.left),
        format!("{} Time (s)", labels.right),
        "Proving Time Winner".to_string(),
        format!("{} Memory (GB)", labels.left),
        format!("{} Memory (GB)", labels.right),
        "Memory Winner".to_string(),
    ])
    .align(3, Align::Left)
    .align(6, Align::Left)
    .truncate_column(0, MARKDOWN_NAME_WIDTH);

    let mut ordered = result.ranked(RatioMetric::Speedup, SortOrder::Ascending);
    ordered.extend(result.incomparable(RatioMetric::Speedup));
    for row in ordered {
        table.push([
            names.display_name(&row.test_name),
            thousands(row.left.proving_time_s(), 1),
            thousands(row.right.proving_time_s(), 1),
            winner_phrase(labels, row.speedup, "is faster by"),
            format!("{:.2}", row.left.peak_memory_gb()),
            format!("{:.2}", row.right.peak_memory_gb()),
            winner_phrase(labels, row.memory_ratio, "uses less memory by"),
        ]);
    }
    doc.table(table);
    doc.rule();

    doc.heading(2, "Notes");
    doc.bullets(vec![
        "Proving Time Winner shows which system is faster and by how much".to_string(),
        "Memory Winner shows which system uses less memory and by how much".to_string(),
        format!(
            "Table is sorted by proving time ratio ({}/{}), best {} performance at top",
            labels.left, labels.right, labels.left
        ),
    ]);
    doc
}

fn fixed(r: Ratio) -> String {
    match r {
        Ok(v) => format!("{v:.2}"),
        Err(_) => INCOMPARABLE.to_string(),
    }
}

/// Compact CSV, one row per comparable test in key order.
pub fn csv(result: &ComparisonResult, labels: &Labels) -> Result<String> {
    let (l, r) = labels.column_prefixes();
    let header = [
        "test_name".to_string(),
        format!("{l}_proving_time_s"),
        format!("{r}_proving_time_s"),
        "speedup".to_string(),
        format!("{l}_proof_size_kb"),
        format!("{r}_proof_size_kb"),
        "proof_size_ratio".to_string(),
        format!("{l}_peak_memory_gb"),
        format!("{r}_peak_memory_gb"),
        "memory_ratio".to_string(),
    ];
    csv_string(|w| {
        w.write_record(&header)?;
        for row in &result.rows {
            w.write_record([
                row.test_name.clone(),
                format!("{:.2}", row.left.proving_time_s()),
                format!("{:.2}", row.right.proving_time_s()),
                fixed(row.speedup),
                format!("{:.2}", row.left.proof_size_kb()),
                format!("{:.2}", row.right.proof_size_kb()),
                fixed(row.proof_size_ratio),
                format!("{:.2}", row.left.peak_memory_gb()),
                format!("{:.2}", row.right.peak_memory_gb()),
                fixed(row.memory_ratio),
            ])?;
        }
        Ok(())
    })
}

fn full(r: Ratio) -> String {
    match r {
        Ok(v) => v.to_string(),
        Err(_) => INCOMPARABLE.to_string(),
    }
}

/// Wide CSV with raw units, differences and per-metric winners.
pub fn detailed_csv(result: &ComparisonResult, labels: &Labels) -> Result<String> {
    let (l, r) = labels.column_prefixes();
    let mut header = vec!["test_name".to_string()];
    for side in [&l, &r] {
        header.extend([
            format!("{side}_proving_time_s"),
            format!("{side}_proving_time_ms"),
            format!("{side}_proof_size_kb"),
            format!("{side}_proof_size_bytes"),
            format!("{side}_peak_memory_gb"),
            format!("{side}_peak_memory_bytes"),
        ]);
    }
    header.extend(
        [
            "time_speedup",
            "time_diff_s",
            "proof_size_ratio",
            "proof_size_diff_kb",
            "memory_ratio",
            "memory_diff_gb",
            "time_winner",
            "proof_size_winner",
            "memory_winner",
        ]
        .map(String::from),
    );

    csv_string(|w| {
        w.write_record(&header)?;
        for row in &result.rows {
            let mut record = vec![row.test_name.clone()];
            for s in [&row.left, &row.right] {
                record.extend([
                    s.proving_time_s().to_string(),
                    s.proving_time_ms.to_string(),
                    s.proof_size_kb().to_string(),
                    s.proof_size_bytes.to_string(),
                    s.peak_memory_gb().to_string(),
                    s.peak_memory_bytes.to_string(),
                ]);
            }
            for metric in [RatioMetric::Speedup, RatioMetric::ProofSize, RatioMetric::Memory] {
                record.push(full(row.ratio(metric)));
                record.push(row.difference(metric).to_string());
            }
            for metric in [RatioMetric::Speedup, RatioMetric::ProofSize, RatioMetric::Memory] {
                record.push(label(labels, row.winner(metric)).to_string());
            }
            w.write_record(&record)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::loader::MetricsTable;
    use crate::names::{IdentityNames, StructuredNames};
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

    const GIB: u64 = 1 << 30;

    fn fixture() -> ComparisonResult {
        let left: MetricsTable = [
            ("alpha".to_string(), proved(100_000.0, 2048, 4 * GIB)),
            ("beta".to_string(), proved(30_000.0, 1024, GIB)),
            ("gamma".to_string(), proved(10_000.0, 1024, GIB)),
            ("left_only".to_string(), proved(1.0, 1, 1)),
        ]
        .into_iter()
        .collect();
        let right: MetricsTable = [
            ("alpha".to_string(), proved(50_000.0, 1024, 2 * GIB)),
            ("beta".to_string(), proved(60_000.0, 1024, 2 * GIB)),
            ("gamma".to_string(), proved(0.0, 1024, GIB)),
        ]
        .into_iter()
        .collect();
        compare(&left, &right)
    }

    fn sources() -> Sources {
        Sources {
            left: "risc0-1M".to_string(),
            right: "sp1-1M".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn compact_csv_has_fixed_header() {
        let out = csv(&fixture(), &Labels::default()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "test_name,risc0_proving_time_s,sp1_proving_time_s,speedup,risc0_proof_size_kb,\
             sp1_proof_size_kb,proof_size_ratio,risc0_peak_memory_gb,sp1_peak_memory_gb,memory_ratio"
        );
        assert_eq!(lines[1], "alpha,100.00,50.00,2.00,2.00,1.00,2.00,4.00,2.00,2.00");
        assert_eq!(lines[3], "gamma,10.00,0.00,incomparable,1.00,1.00,1.00,1.00,1.00,1.00");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn detailed_csv_names_winners() {
        let out = detailed_csv(&fixture(), &Labels::default()).unwrap();
        let mut lines = out.lines();
        let header: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(header.len(), 1 + 12 + 9);
        assert_eq!(header[1], "risc0_proving_time_s");
        assert_eq!(header[7], "sp1_proving_time_s");
        let beta: Vec<&str> = lines.nth(1).unwrap().split(',').collect();
        assert_eq!(beta[0], "beta");
        assert_eq!(beta[13], "0.5");
        assert_eq!(beta[14], "-30");
        assert_eq!(&beta[19..], ["RISC0", "SP1", "RISC0"]);
    }

    #[test]
    fn text_report_sections() {
        let config = ReportConfig {
            top_n: 2,
            ..Default::default()
        };
        let text = text_document(&fixture(), &config, &sources()).to_text();
        assert!(text.contains("TEST COVERAGE"));
        assert!(text.contains("Common tests: 3"));
        assert!(text.contains("RISC0 only: 1"));
        assert!(text.contains("Common but missing proving metrics: 0"));
        assert!(text.contains("TOP 2 BEST SPEEDUPS (WHERE SP1 IS FASTEST)"));
        assert!(text.contains("1. alpha\n   Speedup: 2.00x\n   RISC0: 100s | SP1: 50s | Time saved: 50s"));
        assert!(text.contains("1. beta\n   Speedup: 0.50x"));
        assert!(text.contains("Incomparable speedups"));
        assert!(text.contains("gamma: incomparable"));
        // mean over alpha (2.0) and beta (0.5); gamma is excluded
        assert!(text.contains("1.25x"));
    }

    #[test]
    fn text_table_truncates_long_names() {
        let long = "t".repeat(60);
        let left: MetricsTable = [(long.clone(), proved(10.0, 1, 1))].into_iter().collect();
        let right: MetricsTable = [(long.clone(), proved(5.0, 1, 1))].into_iter().collect();
        let result = compare(&left, &right);
        let text = text_document(&result, &ReportConfig::default(), &sources()).to_text();
        assert!(text.contains(&format!("{}...", "t".repeat(44))));
        assert_eq!(result.rows[0].test_name, long);
    }

    #[test]
    fn markdown_summary_picks_winners() {
        let md = summary_document(&fixture(), &ReportConfig::default(), &sources()).to_markdown();
        assert!(md.starts_with("# RISC0 vs SP1 Metrics Comparison Summary\n"));
        assert!(md.contains("- **RISC0 Folder:** risc0-1M"));
        assert!(md.contains("| Proving Speed | SP1 | 1.25x faster on average |"));
        assert!(md.contains("| Memory Usage | SP1 | 1.17x less memory |"));
        assert!(md.contains("- **Incomparable pairs:** 1"));
        assert!(md.contains("| Common tests | 3 | Tests executed by both systems |"));
    }

    #[test]
    fn detailed_needs_csv() {
        let result = fixture();
        for format in [OutputFormat::Text, OutputFormat::Markdown, OutputFormat::Html] {
            let config = ReportConfig {
                format,
                ..ReportConfig::default()
            };
            assert!(matches!(
                render(&result, &config, &sources(), true),
                Err(Error::ConflictingFlags("--detailed", _))
            ));
        }
        let config = ReportConfig {
            format: OutputFormat::Csv,
            ..ReportConfig::default()
        };
        let wide = render(&result, &config, &sources(), true).unwrap();
        assert!(wide.starts_with("test_name,risc0_proving_time_s,risc0_proving_time_ms,"));
    }

    #[test]
    fn excluded_pairs_are_named() {
        let left: MetricsTable = [
            ("ok".to_string(), proved(10.0, 1, 1)),
            ("crashed".to_string(), BenchmarkRecord::default()),
        ]
        .into_iter()
        .collect();
        let right: MetricsTable = [
            ("ok".to_string(), proved(5.0, 1, 1)),
            ("crashed".to_string(), proved(5.0, 1, 1)),
        ]
        .into_iter()
        .collect();
        let result = compare(&left, &right);

        let text = text_document(&result, &ReportConfig::default(), &sources()).to_text();
        assert!(text.contains("Common tests missing proving metrics"));
        assert!(text.contains("crashed"));

        let md = summary_document(&result, &ReportConfig::default(), &sources()).to_markdown();
        assert!(md.contains("Common tests excluded for missing proving metrics:"));
        assert!(md.contains("- crashed\n"));
    }

    #[test]
    fn rendering_twice_is_identical() {
        let result = fixture();
        let config = ReportConfig::default();
        for format in [OutputFormat::Text, OutputFormat::Markdown, OutputFormat::Html, OutputFormat::Csv] {
            let cfg = ReportConfig { format, ..config.clone() };
            let a = render(&result, &cfg, &sources(), false).unwrap();
            let b = render(&result, &cfg, &sources(), false).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn empty_comparison_says_so() {
        let result = compare(&MetricsTable::new(), &MetricsTable::new());
        let md = summary_document(&result, &ReportConfig::default(), &sources()).to_markdown();
        assert!(md.contains("No common tests to compare."));
        let text = text_document(&result, &ReportConfig::default(), &sources()).to_text();
        assert!(text.contains("No comparable tests."));
    }

    #[test]
    fn speedup_table_uses_display_names() {
        let name = "test_worst_compute.py::test_fn[fork_Prague-opcode_ADD]";
        let left: MetricsTable = [(name.to_string(), proved(1000.0, 1, GIB))].into_iter().collect();
        let right: MetricsTable = [(name.to_string(), proved(4000.0, 1, 2 * GIB))].into_iter().collect();
        let result = compare(&left, &right);
        let labels = Labels::default();

        let md = speedup_document(&result, &labels, &sources(), &StructuredNames).to_markdown();
        assert!(md.contains("| Compute: ADD | 1.0 | 4.0 | RISC0 is faster by 4.0x | 1.00 | 2.00 | RISC0 uses less memory by 2.0x |"));
        assert!(md.contains("| Average Speedup (RISC0/SP1) | 0.250x |"));
        assert!(md.contains("RISC0 is 4.00x faster on average"));

        let raw = speedup_document(&result, &labels, &sources(), &IdentityNames).to_markdown();
        assert!(raw.contains(&format!("| {name} |")));
    }
}
