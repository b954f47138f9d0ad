//! Rate fetch error types

use thiserror::Error;

/// Rate lookup failure with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Server, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Unexpected, message)
    }
}

/// Failure classification surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connectivity problems, including timeouts
    Network,
    /// The rate service answered but rejected the request
    Server,
    /// Anything else (malformed response, bad configuration)
    Unexpected,
}
