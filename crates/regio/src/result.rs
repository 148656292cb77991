//! Result and error types for Regio.

use thiserror::Error;

/// Result type for Regio operations
pub type RegioResult<T> = Result<T, RegioError>;

/// Errors that can occur in Regio
#[derive(Debug, Error)]
pub enum RegioError {
    /// A path indexed past the elements found at a region
    #[error("Expected at least {required} elements at region \"{region}\", but only found {found}.")]
    Resolution {
        /// One-based number of elements the index needed
        required: usize,
        /// Dotted region label consumed so far
        region: String,
        /// Number of elements actually found
        found: usize,
    },

    /// Polling budget exhausted while the condition stayed falsy.
    ///
    /// Displays the caller-supplied message verbatim.
    #[error("{message}")]
    Timeout {
        /// Caller-supplied message (default `"Timeout"`)
        message: String,
    },

    /// Region name missing from the selector table
    #[error("Unknown region \"{region}\"")]
    UnknownRegion {
        /// Dotted name up to and including the missing key
        region: String,
    },

    /// Region names a group of regions instead of a selector
    #[error("Region \"{region}\" is a group of regions, not a selector")]
    NotASelector {
        /// Dotted name of the group
        region: String,
    },

    /// Malformed selector path
    #[error("Invalid selector path: {message}")]
    InvalidPath {
        /// Error message
        message: String,
    },

    /// Automation client failure
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

    /// Invalid selector table or configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// URL parse error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl RegioError {
    /// Create an invalid path error
    #[must_use]
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath {
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

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error came from an exhausted poll budget
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
