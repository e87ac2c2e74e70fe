//! Renaming result files to their simplified names.

use crate::error::{Error, Result};
use crate::loader::HARDWARE_FILE;
use crate::names::parse;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Renamed,
    /// Target already existed; the source was left alone.
    SkippedExisting,
    Unchanged,
    /// The rename itself failed; the rest of the plan still ran.
    Failed,
}

/// Proposed renames for every `*.json` directly inside `dir`, by file name.
pub fn plan(dir: &Path) -> Result<Vec<Rename>> {
    if !dir.is_dir() {
        return Err(Error::InputNotFound(dir.to_path_buf()));
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".json") && name != HARDWARE_FILE && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|from| {
            let to = parse(&from).simplified_name;
            Rename { from, to }
        })
        .collect())
}

/// Applies `plan` inside `dir`. Never overwrites an existing file. A failed
/// rename is logged and recorded, and does not stop the batch.
pub fn execute(dir: &Path, plan: &[Rename]) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(plan.len());
    for rename in plan {
        if rename.from == rename.to {
            outcomes.push(Outcome::Unchanged);
            continue;
        }
        let target = dir.join(&rename.to);
        if target.exists() {
            warn!(from = %rename.from, to = %rename.to, "target exists, skipping");
            outcomes.push(Outcome::SkippedExisting);
            continue;
        }
        let source = dir.join(&rename.from);
        match fs::rename(&source, &target) {
            Ok(()) => {
                info!(from = %rename.from, to = %rename.to, "renamed");
                outcomes.push(Outcome::Renamed);
            }
            Err(e) => {
                warn!(from = %rename.from, to = %rename.to, "rename failed: {e}");
                outcomes.push(Outcome::Failed);
            }
        }
    }
    outcomes
}

/// Human-readable listing of a plan.
pub fn listing(plan: &[Rename]) -> String {
    let rule = "-".repeat(80);
    let mut out = format!("Found {} JSON files to process\n\nProposed renames:\n{rule}\n", plan.len());
    for rename in plan {
        let _ = writeln!(out, "Original: {}\nSimplified: {}\n{rule}", rename.from, rename.to);
    }
    out
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// A bash script performing the renames with `mv -n`.
pub fn script(plan: &[Rename]) -> String {
    let mut out = String::from("#!/bin/bash\n# Rename benchmark result files to their simplified names\n\n");
    for rename in plan.iter().filter(|r| r.from != r.to) {
        let _ = writeln!(out, "mv -n {} {}", shell_quote(&rename.from), shell_quote(&rename.to));
    }
    out
}

/// Writes [`script`] to `path` and marks it executable for the owner.
pub fn write_script(path: &Path, plan: &[Rename]) -> Result<()> {
    fs::write(path, script(plan)).map_err(|e| Error::io(path, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))
            .map_err(|e| Error::io(path, e))?;
    }
    info!(path = %path.display(), renames = plan.len(), "rename script written");
    Ok(())
}
