//! Per-folder execution / proving tables.

use super::{csv_string, thousands, thousands_u64, Align, Document, Table, NOT_AVAILABLE};
use crate::config::{PhaseFilter, ReportConfig};
use crate::error::Result;
use crate::loader::MetricsTable;
use crate::metrics::{extract, RecordMetrics};
use crate::schema::HardwareInfo;
use crate::stats::Summary;
use std::collections::BTreeSet;
use std::path::Path;

/// Longest first so `100M` is never read as `10M` or `1M`.
pub const GAS_CATEGORIES: [&str; 7] = ["500M", "100M", "60M", "45M", "30M", "10M", "1M"];
pub const UNKNOWN_GAS: &str = "Unknown";

const REPORT_TITLE: &str = "zkEVM Benchmark Results";
const TOTAL_REGION: &str = "total_num_cycles";

/// Gas limit bucket named in a results folder, e.g. `zkevm-metrics-10M`.
pub fn gas_category(folder: &Path) -> &'static str {
    let name = folder
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    GAS_CATEGORIES
        .iter()
        .find(|cat| name.contains(*cat))
        .copied()
        .unwrap_or(UNKNOWN_GAS)
}

/// Ascending gas order for summary rows; unknown sorts last.
fn gas_rank(category: &str) -> usize {
    GAS_CATEGORIES
        .iter()
        .rev()
        .position(|c| *c == category)
        .unwrap_or(GAS_CATEGORIES.len())
}

/// One loaded results folder.
#[derive(Debug, Clone)]
pub struct FolderMetrics {
    pub source: String,
    pub gas_category: &'static str,
    pub table: MetricsTable,
    pub hardware: Option<HardwareInfo>,
}

impl FolderMetrics {
    pub fn new(folder: &Path, table: MetricsTable, hardware: Option<HardwareInfo>) -> Self {
        Self {
            source: folder.display().to_string(),
            gas_category: gas_category(folder),
            table,
            hardware,
        }
    }
}

/// A row-ready view: key, gas bucket, extracted metrics.
struct Entry {
    key: String,
    gas: &'static str,
    metrics: RecordMetrics,
}

fn entries(folder: &FolderMetrics, suffix_gas: bool) -> Vec<Entry> {
    folder
        .table
        .iter()
        .map(|(key, record)| Entry {
            key: if suffix_gas {
                format!("{key}_{}", folder.gas_category)
            } else {
                key.clone()
            },
            gas: folder.gas_category,
            metrics: extract(record),
        })
        .collect()
}

fn opt_u64(v: Option<u64>) -> String {
    v.map(thousands_u64)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn opt_f64(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| thousands(v, decimals))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// `foo_bar` -> `Foo Bar`
fn region_title(region: &str) -> String {
    region
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn execution_table(doc: &mut Document, entries: &[Entry], show_regions: bool) {
    doc.heading(2, "Execution Metrics");
    if !entries.iter().any(|e| e.metrics.execution.is_some()) {
        doc.paragraph("No execution metrics found.");
        return;
    }

    let mut regions: Vec<String> = Vec::new();
    if show_regions {
        let all: BTreeSet<&String> = entries
            .iter()
            .filter_map(|e| e.metrics.execution.as_ref())
            .flat_map(|x| x.region_cycles.keys())
            .collect();
        regions = all
            .into_iter()
            .filter(|r| *r != TOTAL_REGION)
            .cloned()
            .collect();
        if entries.iter().any(|e| {
            e.metrics
                .execution
                .as_ref()
                .is_some_and(|x| x.region_cycles.contains_key(TOTAL_REGION))
        }) {
            regions.push(TOTAL_REGION.to_string());
        }
    }

    let mut headers = vec![
        "Benchmark".to_string(),
        "Gas Category".to_string(),
        "Total Cycles".to_string(),
        "Duration (ms)".to_string(),
    ];
    headers.extend(regions.iter().map(|r| region_title(r)));
    let mut table = Table::new(headers).align(1, Align::Left);

    for entry in entries {
        let Some(exec) = &entry.metrics.execution else {
            continue;
        };
        let mut row = vec![
            entry.key.clone(),
            entry.gas.to_string(),
            opt_u64(exec.total_num_cycles),
            opt_f64(exec.duration_ms(), 1),
        ];
        row.extend(regions.iter().map(|r| match exec.region_cycles.get(r) {
            Some(cycles) => thousands_u64(*cycles),
            None => "-".to_string(),
        }));
        table.push(row);
    }
    doc.table(table);
}

fn proving_table(doc: &mut Document, entries: &[Entry]) {
    doc.heading(2, "Proving Metrics");
    if !entries.iter().any(|e| e.metrics.proving.is_some()) {
        doc.paragraph("No proving metrics found.");
        return;
    }

    let mut table = Table::new([
        "Benchmark",
        "Gas Category",
        "Proof Size (bytes)",
        "Proving Time (ms)",
        "Proving Time (s)",
        "Peak Memory (GB)",
    ])
    .align(1, Align::Left);

    for entry in entries {
        let Some(prov) = &entry.metrics.proving else {
            continue;
        };
        table.push([
            entry.key.clone(),
            entry.gas.to_string(),
            opt_u64(prov.proof_size),
            opt_f64(prov.proving_time_ms, 1),
            opt_f64(prov.proving_time_s(), 2),
            opt_f64(prov.peak_memory_gb(), 2),
        ]);
    }
    doc.table(table);
}

fn min_max_avg(summary: &Summary, decimals: usize, unit: &str) -> String {
    format!(
        "Min: {}{unit}, Max: {}{unit}, Avg: {}{unit}, Median: {}{unit}",
        thousands(summary.min, decimals),
        thousands(summary.max, decimals),
        thousands(summary.mean, decimals),
        thousands(summary.median, decimals),
    )
}

fn statistics_section(doc: &mut Document, entries: &[Entry], phases: PhaseFilter) {
    doc.heading(2, "Statistics");
    if entries.is_empty() {
        doc.paragraph("No data available for statistical analysis.");
        return;
    }

    let mut any = false;
    let execution: Vec<_> = entries
        .iter()
        .filter_map(|e| e.metrics.execution.as_ref())
        .collect();
    let cycles: Vec<f64> = execution
        .iter()
        .filter_map(|x| x.total_num_cycles)
        .map(|c| c as f64)
        .collect();
    let durations: Vec<f64> = execution.iter().filter_map(|x| x.duration_ms()).collect();
    if phases.execution() {
        if let Some(cycles) = Summary::of(&cycles) {
            let mut fields = vec![("Total Cycles".to_string(), min_max_avg(&cycles, 0, ""))];
            if let Some(d) = Summary::of(&durations) {
                fields.push(("Duration".to_string(), min_max_avg(&d, 1, "ms")));
            }
            doc.heading(3, "Execution Statistics").fields(fields);
            any = true;
        }
    }

    let proving: Vec<_> = entries
        .iter()
        .filter_map(|e| e.metrics.proving.as_ref())
        .collect();
    let sizes: Vec<f64> = proving
        .iter()
        .filter_map(|p| p.proof_size)
        .map(|s| s as f64)
        .collect();
    let times: Vec<f64> = proving.iter().filter_map(|p| p.proving_time_ms).collect();
    if phases.proving() {
        if let Some(sizes) = Summary::of(&sizes) {
            let mut fields = vec![("Proof Size".to_string(), min_max_avg(&sizes, 0, " bytes"))];
            if let Some(t) = Summary::of(&times) {
                fields.push(("Proving Time".to_string(), min_max_avg(&t, 1, "ms")));
            }
            doc.heading(3, "Proving Statistics").fields(fields);
            any = true;
        }
    }

    if !any {
        doc.paragraph("No statistical data available.");
    }
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.collect();
    crate::stats::mean(&values)
}

fn summary_table(doc: &mut Document, folders: &[FolderMetrics]) {
    doc.heading(2, "Summary by Gas Category");
    let mut table = Table::new([
        "Gas Category",
        "Total Benchmarks",
        "Execution",
        "Proving",
        "Avg Cycles",
        "Avg Duration (ms)",
        "Avg Proof Size (bytes)",
        "Avg Proving Time (ms)",
    ]);

    let mut ordered: Vec<&FolderMetrics> = folders.iter().collect();
    ordered.sort_by_key(|f| gas_rank(f.gas_category));

    for folder in ordered {
        let metrics: Vec<RecordMetrics> = folder.table.values().map(extract).collect();
        let exec: Vec<_> = metrics.iter().filter_map(|m| m.execution.as_ref()).collect();
        let prov: Vec<_> = metrics.iter().filter_map(|m| m.proving.as_ref()).collect();

        table.push([
            folder.gas_category.to_string(),
            metrics.len().to_string(),
            exec.len().to_string(),
            prov.len().to_string(),
            opt_f64(
                mean_of(exec.iter().filter_map(|x| x.total_num_cycles).map(|c| c as f64)),
                0,
            ),
            opt_f64(mean_of(exec.iter().filter_map(|x| x.duration_ms())), 1),
            opt_f64(
                mean_of(prov.iter().filter_map(|p| p.proof_size).map(|s| s as f64)),
                0,
            ),
            opt_f64(mean_of(prov.iter().filter_map(|p| p.proving_time_ms)), 1),
        ]);
    }
    doc.table(table);
}

/// Builds the tables report. With `compare` and several folders the folders
/// are merged into cross-category tables; otherwise each folder gets its own
/// section.
pub fn document(folders: &[FolderMetrics], compare: bool, config: &ReportConfig) -> Document {
    let mut doc = Document::new(REPORT_TITLE);
    if !config.generated_at.is_empty() {
        doc.paragraph(format!("Generated on: {}", config.generated_at));
    }

    if folders.len() > 1 {
        doc.paragraph(format!("Comparing {} metrics folders:", folders.len()));
        doc.bullets(
            folders
                .iter()
                .map(|f| format!("{} (Gas: {})", f.source, f.gas_category))
                .collect(),
        );
    }

    let phases = config.phases;
    if compare && folders.len() > 1 {
        summary_table(&mut doc, folders);
        let merged: Vec<Entry> = folders.iter().flat_map(|f| entries(f, true)).collect();
        if phases.execution() {
            execution_table(&mut doc, &merged, false);
        }
        if phases.proving() {
            proving_table(&mut doc, &merged);
        }
        if config.statistics {
            statistics_section(&mut doc, &merged, phases);
        }
        return doc;
    }

    for folder in folders {
        doc.heading(2, format!("Gas Category: {}", folder.gas_category));
        doc.paragraph(format!("Source: {}", folder.source));
        if let Some(hw) = &folder.hardware {
            doc.paragraph(format!("Hardware: {}", hw.describe()));
        }
        let rows = entries(folder, false);
        if phases.execution() {
            execution_table(&mut doc, &rows, true);
        }
        if phases.proving() {
            proving_table(&mut doc, &rows);
        }
        if config.statistics {
            statistics_section(&mut doc, &rows, phases);
        }
    }
    doc
}

/// Flat CSV: one row per record, empty cells for absent values.
pub fn csv(folders: &[FolderMetrics], phases: PhaseFilter) -> Result<String> {
    let mut header = vec!["benchmark", "gas_category"];
    if phases.execution() {
        header.extend(["total_num_cycles", "execution_duration_ms"]);
    }
    if phases.proving() {
        header.extend(["proof_size_bytes", "proving_time_ms", "peak_memory_bytes"]);
    }

    let opt = |v: Option<String>| v.unwrap_or_default();
    csv_string(|w| {
        w.write_record(&header)?;
        for folder in folders {
            for entry in entries(folder, false) {
                let mut row = vec![entry.key, entry.gas.to_string()];
                let exec = entry.metrics.execution.as_ref();
                let prov = entry.metrics.proving.as_ref();
                if phases.execution() {
                    row.push(opt(exec.and_then(|x| x.total_num_cycles).map(|c| c.to_string())));
                    row.push(opt(exec.and_then(|x| x.duration_ms()).map(|d| d.to_string())));
                }
                if phases.proving() {
                    row.push(opt(prov.and_then(|p| p.proof_size).map(|s| s.to_string())));
                    row.push(opt(prov.and_then(|p| p.proving_time_ms).map(|t| t.to_string())));
                    row.push(opt(prov.and_then(|p| p.peak_memory_bytes).map(|m| m.to_string())));
                }
                w.write_record(&row)?;
            }
        }
        Ok(())
    })
}
