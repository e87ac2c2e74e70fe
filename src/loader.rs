//! Loading benchmark result folders into [`MetricsTable`]s.
//!
//! Two folder conventions exist:
//!
//! ```text
//! flat:       <root>/<sub>/<test>.json          (comparison inputs)
//! recursive:  <root>/**/<test>.json             (table inputs)
//! runs:       <root>/run_<n>/**/<test>.json     (opcode samples)
//! ```
//!
//! A file that cannot be read or parsed is skipped with a [`LoadWarning`];
//! only a missing root is fatal.

use crate::error::{Error, Result};
use crate::metrics::{extract_sample, Sample};
use crate::schema::{BenchmarkRecord, HardwareInfo, Payload};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const HARDWARE_FILE: &str = "hardware.json";

/// Test-name key -> record. Keys are the full, untruncated names.
pub type MetricsTable = BTreeMap<String, BenchmarkRecord>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanMode {
    /// JSON files in the immediate subfolders of the root, keyed by file stem.
    Flat,
    /// JSON files anywhere below the root, keyed by `<parent dir>/<name>`.
    Recursive,
}

/// A skipped file or entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

#[derive(Debug, Default)]
pub struct LoadedMetrics {
    pub table: MetricsTable,
    pub warnings: Vec<LoadWarning>,
    pub files_read: usize,
}

#[derive(Debug, Default)]
pub struct LoadedSamples {
    pub samples: Vec<Sample>,
    pub warnings: Vec<LoadWarning>,
}

fn skip(warnings: &mut Vec<LoadWarning>, path: &Path, reason: impl Into<String>) {
    let w = LoadWarning {
        path: path.to_path_buf(),
        reason: reason.into(),
    };
    warn!("skipping {w}");
    warnings.push(w);
}

fn ensure_exists(root: &Path) -> Result<()> {
    if root.exists() {
        Ok(())
    } else {
        Err(Error::InputNotFound(root.to_path_buf()))
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
        && path.file_name().is_some_and(|name| name != HARDWARE_FILE)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Enumerates JSON result files below `root` in a stable order.
fn collect_json_files(
    root: &Path,
    walker: WalkDir,
    warnings: &mut Vec<LoadWarning>,
) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in walker.follow_links(false).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_json_file(entry.path()) => {
                out.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                skip(warnings, &path, e.to_string());
            }
        }
    }
    out
}

/// Reads one result file. Both a single object and an array of objects are
/// accepted; the result is always a sequence.
pub fn read_records(path: &Path) -> Result<Vec<BenchmarkRecord>> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let payload: Payload = serde_json::from_slice(&bytes).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(payload.into_records())
}

/// Keys for the records of one file, in file order.
fn record_keys(path: &Path, records: &[BenchmarkRecord], mode: ScanMode) -> Vec<String> {
    let stem = file_stem(path);
    let single = records.len() == 1;

    let names = records.iter().enumerate().map(|(i, rec)| match (mode, single) {
        // Flat inputs are named after the file, whatever the payload says.
        (ScanMode::Flat, true) => stem.clone(),
        _ => rec
            .name
            .clone()
            .unwrap_or_else(|| if single { stem.clone() } else { format!("{stem}_{i}") }),
    });

    match mode {
        ScanMode::Flat => names.collect(),
        ScanMode::Recursive => {
            let parent = path
                .parent()
                .and_then(Path::file_name)
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            names.map(|name| format!("{parent}/{name}")).collect()
        }
    }
}

/// Loads every result file below `root` following `mode`.
pub fn load(root: &Path, mode: ScanMode) -> Result<LoadedMetrics> {
    ensure_exists(root)?;

    let mut loaded = LoadedMetrics::default();
    let walker = match mode {
        ScanMode::Flat => WalkDir::new(root).min_depth(2).max_depth(2),
        ScanMode::Recursive => WalkDir::new(root),
    };
    let files = collect_json_files(root, walker, &mut loaded.warnings);

    for path in files {
        let records = match read_records(&path) {
            Ok(records) => records,
            Err(e) => {
                skip(&mut loaded.warnings, &path, error_reason(&e));
                continue;
            }
        };
        loaded.files_read += 1;
        debug!(path = %path.display(), records = records.len(), "read result file");

        let keys = record_keys(&path, &records, mode);
        for (key, record) in keys.into_iter().zip(records) {
            match loaded.table.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(slot) => {
                    let reason = format!("duplicate test name {:?}, keeping first", slot.key());
                    skip(&mut loaded.warnings, &path, reason);
                }
            }
        }
    }

    info!(
        root = %root.display(),
        files = loaded.files_read,
        records = loaded.table.len(),
        skipped = loaded.warnings.len(),
        "loaded metrics"
    );
    Ok(loaded)
}

pub fn load_flat(root: &Path) -> Result<LoadedMetrics> {
    load(root, ScanMode::Flat)
}

pub fn load_recursive(root: &Path) -> Result<LoadedMetrics> {
    load(root, ScanMode::Recursive)
}

fn error_reason(e: &Error) -> String {
    match e {
        Error::Io { source, .. } => source.to_string(),
        Error::Json { source, .. } => format!("invalid JSON: {source}"),
        other => other.to_string(),
    }
}

/// Reads `<root>/hardware.json` if present. Absent or malformed files yield
/// `None`; a malformed one is logged.
pub fn load_hardware(root: &Path) -> Option<HardwareInfo> {
    let path = root.join(HARDWARE_FILE);
    let bytes = fs::read(&path).ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!(path = %path.display(), "ignoring malformed hardware description: {e}");
            None
        }
    }
}

/// `run_3` -> 3.
fn run_number(dir_name: &str) -> Option<u32> {
    let digits: String = dir_name
        .strip_prefix("run_")?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Collects opcode samples from `<root>/run_<n>/**/*.json`, sample id = run
/// number. Records whose name carries no opcode count are left out silently;
/// files with `log` in their name are not result files.
pub fn load_samples(root: &Path) -> Result<LoadedSamples> {
    ensure_exists(root)?;

    let mut loaded = LoadedSamples::default();
    let mut runs: Vec<(u32, PathBuf)> = Vec::new();
    let entries = fs::read_dir(root).map_err(|e| Error::io(root, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(root, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(n) = run_number(&entry.file_name().to_string_lossy()) {
            runs.push((n, entry.path()));
        }
    }
    runs.sort();

    for (run, dir) in runs {
        let files = collect_json_files(&dir, WalkDir::new(&dir), &mut loaded.warnings);
        for path in files {
            let stem = file_stem(&path);
            if stem.to_ascii_lowercase().contains("log") {
                continue;
            }
            let records = match read_records(&path) {
                Ok(records) => records,
                Err(e) => {
                    skip(&mut loaded.warnings, &path, error_reason(&e));
                    continue;
                }
            };
            for record in &records {
                let name = record.name.as_deref().unwrap_or(&stem);
                if let Some(sample) = extract_sample(name, record, run) {
                    loaded.samples.push(sample);
                }
            }
        }
    }

    loaded.samples.sort_by(|a, b| {
        (&a.opcode, a.op_count, a.sample_id).cmp(&(&b.opcode, b.op_count, b.sample_id))
    });
    info!(
        root = %root.display(),
        samples = loaded.samples.len(),
        skipped = loaded.warnings.len(),
        "loaded opcode samples"
    );
    Ok(loaded)
}
