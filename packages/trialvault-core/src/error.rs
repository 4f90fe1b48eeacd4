use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    #[error("Unknown group key: {0}")]
    UnknownGroupKey(String),

    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("Histogram bucket width must be positive, got {0}")]
    InvalidBucketWidth(f64),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Export failed: {0}")]
    ExportFailed(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
