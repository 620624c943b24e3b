//! Custom error types for rustscopus.
//!
//! Only input validation, configuration and output I/O failures are meant to
//! reach the caller of a harvest. Per-record lookup failures are expressed
//! with these types too, but the pipeline degrades them instead of
//! propagating.

use thiserror::Error;

/// Main error type for rustscopus operations.
#[derive(Debug, Error)]
pub enum ScopusError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// External API returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message
        message: String,
    },

    /// Payload could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Payload parsed but did not match any known layout
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `ScopusError`
pub type Result<T> = std::result::Result<T, ScopusError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| ScopusError::Parse(msg.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_or_parse() {
        let missing: Option<u32> = None;
        let err = missing.ok_or_parse("no coredata").unwrap_err();
        assert_eq!(err.to_string(), "Parse error: no coredata");
        assert_eq!(Some(3).ok_or_parse("unused").ok(), Some(3));
    }
}
