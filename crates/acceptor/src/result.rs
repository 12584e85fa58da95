//! Result and error types for Acceptor.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for Acceptor operations
pub type AcceptorResult<T> = Result<T, AcceptorError>;

/// Errors that can occur in Acceptor
#[derive(Debug, Error)]
pub enum AcceptorError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// A UI step ran without a browser attached to the scenario
    #[error("No browser attached; set RUN_UI_TESTS=true to run UI scenarios")]
    BrowserUnavailable,

    /// Driver-level failure (lost connection, protocol error)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Assertion failed inside a step
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// Payload did not match its JSON schema
    #[error("Schema validation failed for {schema}: {message}")]
    Schema {
        /// Schema file name
        schema: String,
        /// All violations joined
        message: String,
    },

    /// Feature file could not be parsed
    #[error("{}:{line}: {message}", path.display())]
    Gherkin {
        /// Feature file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Error message
        message: String,
    },

    /// No step definition matches the step text
    #[error("Undefined step: {text}")]
    UndefinedStep {
        /// Step text
        text: String,
    },

    /// Phrase registered twice in the step table
    #[error("Duplicate step phrase: {phrase}")]
    DuplicateStep {
        /// The phrase
        phrase: String,
    },

    /// Step phrase could not be compiled
    #[error("Invalid step phrase {phrase:?}: {message}")]
    InvalidPhrase {
        /// The phrase
        phrase: String,
        /// Error message
        message: String,
    },

    /// A step needed context an earlier step should have set
    #[error("Missing scenario state: {what}")]
    MissingState {
        /// What was missing
        what: String,
    },

    /// Invalid value in a step argument or data table
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Offending value
        value: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AcceptorError {
    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a missing-state error
    #[must_use]
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingState { what: what.into() }
    }

    /// Create an invalid-value error
    #[must_use]
    pub fn invalid(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether this error must abort the whole run rather than one scenario
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BrowserNotFound
                | Self::BrowserLaunch { .. }
                | Self::Config { .. }
                | Self::Gherkin { .. }
                | Self::DuplicateStep { .. }
                | Self::InvalidPhrase { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assertion_display() {
        let err = AcceptorError::assertion("expected 201, got 200");
        assert_eq!(err.to_string(), "Assertion failed: expected 201, got 200");
    }

    #[test]
    fn test_gherkin_display_has_location() {
        let err = AcceptorError::Gherkin {
            path: PathBuf::from("features/login.feature"),
            line: 7,
            message: "step outside scenario".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "features/login.feature:7: step outside scenario"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AcceptorError::BrowserNotFound.is_fatal());
        assert!(AcceptorError::DuplicateStep {
            phrase: "x".to_string()
        }
        .is_fatal());
        assert!(!AcceptorError::assertion("x").is_fatal());
        assert!(!AcceptorError::BrowserUnavailable.is_fatal());
    }
}
