//! Error types shared by every frame, valve and transport operation.

use std::fmt;

/// Result type alias for DynamoDB frame operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for DynamoDB frame operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The remote store or the connection to it failed.
    ///
    /// Network faults, throttling, authorization and conditional-check
    /// failures all end up here; the sub-code reported by the store is kept
    /// in the message but never interpreted.
    #[error("DynamoDB failure: {0}")]
    Transport(String),

    /// A cursor was asked for a record after the last one.
    #[error("No more items: {0}")]
    Exhausted(String),

    /// A cursor or dosage was used out of order.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// The in-memory store does not understand this predicate.
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    /// A point lookup found no value for the attribute.
    #[error("Attribute not found: {0}")]
    MissingAttribute(String),

    /// Credentials, region or table setup is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create a transport error from anything printable.
    pub fn transport(message: impl fmt::Display) -> Self {
        Self::Transport(message.to_string())
    }

    /// True for failures that may go away on a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Prefix a transport failure with the operation that caused it.
    pub(crate) fn context(self, context: impl fmt::Display) -> Self {
        match self {
            Self::Transport(message) => Self::Transport(format!("{context}: {message}")),
            other => other,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(format!("Request failed: {error}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Transport(format!("Failed to parse JSON: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(Error::transport("timeout").is_retryable());
        assert!(!Error::Exhausted("end".to_string()).is_retryable());
        assert!(!Error::IllegalState("remove".to_string()).is_retryable());
        assert!(!Error::MissingAttribute("x".to_string()).is_retryable());
    }

    #[test]
    fn context_prefixes_transport_messages_only() {
        let wrapped = Error::transport("throttled").context("Failed to fetch from \"t\"");
        assert_eq!(
            wrapped,
            Error::Transport("Failed to fetch from \"t\": throttled".to_string())
        );
        let untouched = Error::Exhausted("end".to_string()).context("ignored");
        assert_eq!(untouched, Error::Exhausted("end".to_string()));
    }
}
