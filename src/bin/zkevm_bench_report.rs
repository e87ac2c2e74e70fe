use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zkevm_bench_report::compare::compare;
use zkevm_bench_report::config::{Labels, OutputTarget, PhaseFilter, ReportConfig};
use zkevm_bench_report::loader::{self, LoadWarning, LoadedMetrics};
use zkevm_bench_report::names::name_parser;
use zkevm_bench_report::report::comparison::{self, Sources};
use zkevm_bench_report::report::opcodes::{self, DEFAULT_TITLE};
use zkevm_bench_report::report::tables::{self, FolderMetrics};
use zkevm_bench_report::{simplify, Error, OutputFormat, Result};

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare proving metrics of two systems over their common tests.
    Compare {
        /// Results folder of the left-hand system (numerator of every ratio).
        #[arg(long, alias = "risc0-folder", value_name = "DIR")]
        left: PathBuf,

        /// Results folder of the right-hand system.
        #[arg(long, alias = "sp1-folder", value_name = "DIR")]
        right: PathBuf,

        #[arg(long, default_value = "RISC0")]
        left_label: String,

        #[arg(long, default_value = "SP1")]
        right_label: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Rows in the top/bottom performer lists.
        #[arg(long, default_value_t = 10)]
        top_n: usize,

        /// Rows in the detailed comparison table.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Export every metric and winner per test. Only valid with `--format csv`.
        #[arg(long, default_value_t = false)]
        detailed: bool,

        /// Output file; stdout if omitted or `-`.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Per-test proving time and memory speedup table (markdown).
    Speedup {
        #[arg(long, alias = "risc0-folder", value_name = "DIR")]
        left: PathBuf,

        #[arg(long, alias = "sp1-folder", value_name = "DIR")]
        right: PathBuf,

        #[arg(long, default_value = "RISC0")]
        left_label: String,

        #[arg(long, default_value = "SP1")]
        right_label: String,

        /// Show raw test ids instead of parsed display names.
        #[arg(long, default_value_t = false)]
        no_display_names: bool,

        #[arg(short, long, value_name = "FILE", default_value = "speedup_comparison.md")]
        output: PathBuf,
    },

    /// Execution and proving tables over one or more results folders.
    Tables {
        #[arg(value_name = "DIR", num_args = 1.., required = true)]
        folders: Vec<PathBuf>,

        /// Add a side-by-side comparison section.
        #[arg(long, default_value_t = false)]
        compare: bool,

        #[arg(long, default_value_t = false)]
        execution_only: bool,

        #[arg(long, default_value_t = false)]
        proving_only: bool,

        /// Add min/max/average/median sections.
        #[arg(long, default_value_t = false)]
        statistics: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Output file; `-` writes to stdout.
        #[arg(short, long, value_name = "FILE", default_value = "benchmark_results.md")]
        output: PathBuf,
    },

    /// Collect opcode samples from `run_<n>` folders into a CSV.
    Samples {
        #[arg(short, long, value_name = "DIR")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE", default_value = "results.csv")]
        output: PathBuf,
    },

    /// Marginal-cost regression report from a samples CSV.
    Regression {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE", default_value = "report.md")]
        output: PathBuf,

        #[arg(short, long, default_value = DEFAULT_TITLE)]
        title: String,
    },

    /// Propose (or apply) simplified names for result files in a folder.
    Simplify {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Rename the files. Existing targets are never overwritten.
        #[arg(long, default_value_t = false)]
        execute: bool,

        /// Write a `mv -n` shell script instead of renaming.
        #[arg(long, value_name = "FILE")]
        create_script: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "zkevm-bench-report")]
#[command(about = "Reports over zkVM benchmark result folders")]
struct Args {
    /// Debug logging (overridden by ZKEVM_BENCH_LOG).
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn init_tracing(verbose: bool) {
    let filter = std::env::var("ZKEVM_BENCH_LOG").unwrap_or_else(|_| {
        if verbose {
            "zkevm_bench_report=debug".to_string()
        } else {
            "zkevm_bench_report=info".to_string()
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(filter))
        .try_init();
}

fn now_stamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("unix:{secs}")
}

fn report_warnings(warnings: &[LoadWarning]) {
    if !warnings.is_empty() {
        warn!("{} file(s) or entries skipped", warnings.len());
    }
}

fn load_pair(left: &Path, right: &Path) -> Result<(LoadedMetrics, LoadedMetrics)> {
    let l = loader::load_flat(left)?;
    let r = loader::load_flat(right)?;
    report_warnings(&l.warnings);
    report_warnings(&r.warnings);
    if l.table.is_empty() && r.table.is_empty() {
        return Err(Error::NoRecords);
    }
    Ok((l, r))
}

fn sources(left: &Path, right: &Path) -> Sources {
    Sources {
        left: left.display().to_string(),
        right: right.display().to_string(),
        left_hardware: loader::load_hardware(left),
        right_hardware: loader::load_hardware(right),
    }
}

fn run(args: Args) -> Result<()> {
    match args.cmd {
        Command::Compare {
            left,
            right,
            left_label,
            right_label,
            format,
            top_n,
            limit,
            detailed,
            output,
        } => {
            let (l, r) = load_pair(&left, &right)?;
            let result = compare(&l.table, &r.table);
            let config = ReportConfig {
                format,
                top_n,
                limit,
                labels: Labels {
                    left: left_label,
                    right: right_label,
                },
                generated_at: now_stamp(),
                ..ReportConfig::default()
            };
            let report = comparison::render(&result, &config, &sources(&left, &right), detailed)?;
            OutputTarget::from_arg(output.as_deref()).write(&report)
        }
        Command::Speedup {
            left,
            right,
            left_label,
            right_label,
            no_display_names,
            output,
        } => {
            let (l, r) = load_pair(&left, &right)?;
            let result = compare(&l.table, &r.table);
            let labels = Labels {
                left: left_label,
                right: right_label,
            };
            let names = name_parser(!no_display_names);
            let doc = comparison::speedup_document(
                &result,
                &labels,
                &sources(&left, &right),
                names.as_ref(),
            );
            OutputTarget::from_arg(Some(&output)).write(&doc.to_markdown())
        }
        Command::Tables {
            folders,
            compare,
            execution_only,
            proving_only,
            statistics,
            format,
            output,
        } => {
            let phases = PhaseFilter::from_flags(execution_only, proving_only)?;
            let mut loaded = Vec::with_capacity(folders.len());
            for folder in &folders {
                let metrics = loader::load_recursive(folder)?;
                report_warnings(&metrics.warnings);
                loaded.push(FolderMetrics::new(
                    folder,
                    metrics.table,
                    loader::load_hardware(folder),
                ));
            }
            if loaded.iter().all(|f| f.table.is_empty()) {
                return Err(Error::NoRecords);
            }

            let report = match format {
                OutputFormat::Csv => tables::csv(&loaded, phases)?,
                format => {
                    let config = ReportConfig {
                        format,
                        phases,
                        statistics,
                        generated_at: now_stamp(),
                        ..ReportConfig::default()
                    };
                    tables::document(&loaded, compare, &config).render(format)
                }
            };
            OutputTarget::from_arg(Some(&output)).write(&report)
        }
        Command::Samples { input, output } => {
            let loaded = loader::load_samples(&input)?;
            report_warnings(&loaded.warnings);
            if loaded.samples.is_empty() {
                return Err(Error::NoRecords);
            }
            let csv = opcodes::samples_csv(&loaded.samples)?;
            info!(samples = loaded.samples.len(), "collected opcode samples");
            OutputTarget::from_arg(Some(&output)).write(&csv)
        }
        Command::Regression {
            input,
            output,
            title,
        } => {
            let samples = opcodes::read_samples(&input)?;
            if samples.is_empty() {
                return Err(Error::NoRecords);
            }
            let doc = opcodes::regression_document(&samples, &title, &now_stamp());
            OutputTarget::from_arg(Some(&output)).write(&doc.to_markdown())
        }
        Command::Simplify {
            dir,
            execute,
            create_script,
        } => {
            let plan = simplify::plan(&dir)?;
            print!("{}", simplify::listing(&plan));
            if let Some(path) = create_script {
                simplify::write_script(&path, &plan)?;
                println!("\nRename script written to: {}", path.display());
            } else if execute {
                let outcomes = simplify::execute(&dir, &plan);
                let count = |want: simplify::Outcome| outcomes.iter().filter(|o| **o == want).count();
                println!(
                    "\nRenamed {} of {} files ({} skipped, {} failed)",
                    count(simplify::Outcome::Renamed),
                    plan.len(),
                    count(simplify::Outcome::SkippedExisting),
                    count(simplify::Outcome::Failed)
                );
            } else {
                println!("\nDry run. Use --execute to rename or --create-script <FILE> to export.");
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
