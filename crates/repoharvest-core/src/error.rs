//! Error types for repoharvest
//!
//! One error enum covers the whole fetch engine. Per-page and per-identifier
//! failures are values of this type that the orchestrating loops match on
//! and log, rather than propagate.

use thiserror::Error;

/// Error type for all repoharvest operations
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Transport-level failure (timeout, connection refused, DNS)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    Http {
        /// Response status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Body did not have the expected JSON shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A required API token is absent
    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    /// Identifier does not match the platform's login syntax
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Output file could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Coarse classification of a [`HarvestError`], used as a log field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Http,
    Malformed,
    Credential,
    Input,
    Output,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Http => "http",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Credential => "credential",
            ErrorKind::Input => "input",
            ErrorKind::Output => "output",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl HarvestError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarvestError::Network(_) => ErrorKind::Network,
            HarvestError::Http { .. } => ErrorKind::Http,
            HarvestError::MalformedResponse(_) => ErrorKind::Malformed,
            HarvestError::MissingCredential(_) => ErrorKind::Credential,
            HarvestError::InvalidIdentifier(_) | HarvestError::InvalidConfig(_) => ErrorKind::Input,
            HarvestError::Io(_) | HarvestError::Csv(_) => ErrorKind::Output,
        }
    }

    /// Whether retrying the same request could succeed
    ///
    /// Timeouts, connection failures and 5xx responses are transient.
    /// Everything else, including 4xx, is not.
    pub fn is_transient(&self) -> bool {
        match self {
            HarvestError::Network(e) => e.is_timeout() || e.is_connect(),
            HarvestError::Http { status, .. } => (500..600).contains(status),
            _ => false,
        }
    }
}

/// Result type alias for repoharvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;
