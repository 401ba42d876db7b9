//! Fatal error taxonomy
//!
//! Only conditions that make the whole run meaningless live here: missing
//! inputs, a metadata table without the expected columns, an unreadable image
//! tree, or a record line that is not a JSON object. A record whose URL or
//! image cannot be resolved is an ordinary outcome, not an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read metadata table: {0}")]
    Csv(#[from] csv::Error),

    #[error("metadata table{} has no `{column}` column", table_label(.path))]
    MissingColumn { path: Option<PathBuf>, column: String },

    #[error("image root {} does not exist or is not a directory", .0.display())]
    ImageRootMissing(PathBuf),

    #[error("failed to scan image tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to read record stream: {0}")]
    ReadRecords(#[source] std::io::Error),

    #[error("failed to write record stream: {0}")]
    WriteRecords(#[source] std::io::Error),

    #[error("line {line} is not a JSON object: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("failed to encode record on line {line}: {source}")]
    Encode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl MapperError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MapperError::Io {
            path: path.into(),
            source,
        }
    }
}

fn table_label(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" {}", path.display()))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, MapperError>;
