//! Unified error handling for the igc-thermals library.
//!
//! The detectors never fail: insufficient data yields empty results.
//! Errors only surface at the edges of the pipeline, where caller-supplied
//! dates, configuration, or a background worker can be invalid.

use thiserror::Error;

/// Unified error type for igc-thermals operations.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Explicit flight date was not `YYYY-MM-DD`
    #[error("Invalid flight date '{value}', expected YYYY-MM-DD")]
    InvalidFlightDate { value: String },

    /// Configuration value out of range
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Configuration JSON could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Background worker thread has exited
    #[error("Thermal worker disconnected")]
    WorkerDisconnected,
}

impl AnalysisError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        AnalysisError::Config {
            message: message.into(),
        }
    }
}

/// Result type alias for igc-thermals operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
