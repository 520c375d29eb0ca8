use std::path::PathBuf;
use thiserror::Error;

/// Failures while fetching or decoding report exports. The aggregation
/// itself never fails; only getting the records in can.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON in {}: {source}", .path.display())]
    JsonFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported input format: {0} (expected .json, .csv or a page directory)")]
    UnsupportedFormat(String),

    #[error("no report list found in document")]
    NoRecords,

    #[error("page {page}: {source}")]
    Page {
        page: usize,
        #[source]
        source: Box<LoadError>,
    },
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        LoadError::JsonFile {
            path: path.into(),
            source,
        }
    }
}
