//! Error types for the listing-stats system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Signal that a search produced listings but none with usable price data.
///
/// Kept apart from [`Error`] so callers can tell "nothing to summarize" from
/// a summary whose statistics happen to be zero.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("found listings but no usable price data")]
pub struct EmptyResult;

/// Main error type for the listing-stats system.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or missing data).
    #[error("Data error: {0}")]
    Data(String),

    /// Top-level response payload did not have the expected shape.
    #[error("Unexpected response format: {0}")]
    Payload(String),

    /// The marketplace returned no listings for the search.
    #[error("No listings found for this search term")]
    NoResults,

    /// HTTP transport or status error.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// OAuth token missing or token cache failure.
    #[error("Token error: {0}")]
    Token(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// No listing survived classification.
    #[error(transparent)]
    Empty(#[from] EmptyResult),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a payload error.
    pub fn payload(msg: impl Into<String>) -> Self {
        Error::Payload(msg.into())
    }

    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Error::Fetch(msg.into())
    }

    /// Create a token error.
    pub fn token(msg: impl Into<String>) -> Self {
        Error::Token(msg.into())
    }

    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Error::Database(msg.into())
    }

    /// Whether this error is the "no usable price data" signal.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Error::Empty(_))
    }
}
