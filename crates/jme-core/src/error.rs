//! Error types for the JME pipeline

use thiserror::Error;

/// Pipeline error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A collection the event cannot be processed without was not provided.
    ///
    /// Aborts the current event; optional inputs never produce this.
    #[error("Missing required collection: {0}")]
    MissingCollection(&'static str),

    /// Calibration table error
    #[error("Calibration error: {0}")]
    Calibration(String),

    /// Row persistence error
    #[error("Output error: {0}")]
    Output(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
