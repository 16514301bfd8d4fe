use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while loading a dataset or writing report files.
///
/// Per-row problems (bad numerics, missing fields) never show up here; the
/// aggregation passes degrade those to exclusion or bucketing.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The dataset file could not be opened or read.
    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input contained no header line.
    #[error("Dataset is empty")]
    EmptyInput,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
