use crate::error::{Error, Result};
use crate::OutputFormat;
use std::fs;
use std::path::{Path, PathBuf};

/// Which measurement phases a table report includes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PhaseFilter {
    #[default]
    All,
    ExecutionOnly,
    ProvingOnly,
}

impl PhaseFilter {
    pub fn from_flags(execution_only: bool, proving_only: bool) -> Result<Self> {
        match (execution_only, proving_only) {
            (true, true) => Err(Error::ConflictingFlags("--execution-only", "--proving-only")),
            (true, false) => Ok(PhaseFilter::ExecutionOnly),
            (false, true) => Ok(PhaseFilter::ProvingOnly),
            (false, false) => Ok(PhaseFilter::All),
        }
    }

    pub fn execution(&self) -> bool {
        !matches!(self, PhaseFilter::ProvingOnly)
    }

    pub fn proving(&self) -> bool {
        !matches!(self, PhaseFilter::ExecutionOnly)
    }
}

/// Where a finished report goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// `None` and `-` both mean stdout.
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(path) if path != Path::new("-") => OutputTarget::File(path.to_path_buf()),
            _ => OutputTarget::Stdout,
        }
    }

    /// Writes the complete report in one go. Nothing is written unless the
    /// whole report was rendered first.
    pub fn write(&self, content: &str) -> Result<()> {
        match self {
            OutputTarget::Stdout => {
                print!("{content}");
                if !content.ends_with('\n') {
                    println!();
                }
                Ok(())
            }
            OutputTarget::File(path) => {
                fs::write(path, content).map_err(|e| Error::io(path, e))?;
                tracing::info!(path = %path.display(), bytes = content.len(), "report written");
                Ok(())
            }
        }
    }
}

/// Names the two systems being compared. Ratios are always `left / right`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    pub left: String,
    pub right: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            left: "RISC0".to_string(),
            right: "SP1".to_string(),
        }
    }
}

impl Labels {
    /// Lowercased labels for CSV column prefixes.
    pub fn column_prefixes(&self) -> (String, String) {
        (self.left.to_lowercase(), self.right.to_lowercase())
    }
}

/// Resolved options handed to the renderers.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub format: OutputFormat,
    pub phases: PhaseFilter,
    pub top_n: usize,
    /// Row cap for the detailed comparison table.
    pub limit: usize,
    pub statistics: bool,
    pub labels: Labels,
    /// Stamp printed in report headers. Passed in so rendering stays pure.
    pub generated_at: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Markdown,
            phases: PhaseFilter::All,
            top_n: 10,
            limit: 20,
            statistics: false,
            labels: Labels::default(),
            generated_at: String::new(),
        }
    }
}
