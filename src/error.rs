use thiserror::Error;

/// Errors surfaced by the data source, configuration and export layers.
///
/// The aggregation engine itself never fails: undefined ratios are reported
/// as `None` on the summary rows.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{file}: missing required column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("{file}: invalid value {value:?} for '{field}' on row {row}")]
    InvalidValue {
        file: String,
        row: usize,
        field: String,
        value: String,
    },

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
