use clap::ValueEnum;

pub mod compare;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod names;
pub mod report;
pub mod schema;
pub mod simplify;
pub mod stats;

pub use error::{Error, Result};

/// Report output format.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Fixed-width console tables.
    Text,
    /// Pipe tables and headings.
    #[default]
    Markdown,
    /// Comma-separated rows with a header line.
    Csv,
    /// Standalone HTML page.
    Html,
}
