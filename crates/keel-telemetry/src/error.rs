//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {message}")]
    InvalidFilter {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

impl TelemetryError {
    /// Create an invalid filter error.
    pub fn invalid_filter(directive: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidFilter {
            directive: directive.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::invalid_filter("keel=[", "unbalanced bracket");
        assert_eq!(
            err.to_string(),
            "invalid log filter `keel=[`: unbalanced bracket"
        );
        let err = TelemetryError::LoggingInit("already set".to_string());
        assert_eq!(err.to_string(), "failed to initialize logging: already set");
    }
}
