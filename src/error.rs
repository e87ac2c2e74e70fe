use std::path::PathBuf;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Fatal conditions. Per-file problems are reported as
/// [`LoadWarning`](crate::loader::LoadWarning)s instead and never surface here.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("input path does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot combine {0} with {1}")]
    ConflictingFlags(&'static str, &'static str),

    #[error("no loadable benchmark records found")]
    NoRecords,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
