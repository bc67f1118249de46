//! Remote store error type
//!
//! Every call against the remote store fails with the same error shape: a
//! message. Transport, retries and authentication belong to the store client.

use thiserror::Error;

/// Failure of a remote store call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    /// Create an error from a message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
