//! Error types for the rxalert_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure talking to the drug terminology service
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Request exceeded the configured time budget
    #[error("request timed out")]
    Timeout,

    /// Service answered with a non-success HTTP status
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// Connection could not be established or was dropped
    #[error("transport failure: {0}")]
    Transport(String),

    /// Response body was not the JSON we expected
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if let Some(status) = err.status() {
            UpstreamError::Status(status.as_u16())
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

/// Core error type for rxalert_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Drug search service failure
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Persistence medium unavailable or write failed
    #[error("Store error: {0}")]
    Store(String),

    /// A prescription with this id is already tracked
    #[error("Prescription {0} already exists")]
    DuplicateId(String),

    /// No prescription with this id
    #[error("Prescription {0} not found")]
    NotFound(String),

    /// Bottle quantities must be positive
    #[error("Invalid quantity: {0} (must be greater than zero)")]
    InvalidQuantity(i64),

    /// No doses left to record
    #[error("No pills remaining for {0}; refill first")]
    SupplyExhausted(String),

    /// Search result / strength index out of range
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

impl Error {
    /// True when the failure came from the persistence layer, meaning the
    /// requested change was not saved.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Io(_) | Error::Json(_))
    }
}
