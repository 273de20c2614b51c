//! Error types for the Stratowatch environment abstraction.

use thiserror::Error;

/// Errors that can occur while talking to the inbound snapshot feed.
#[derive(Debug, Clone, Error)]
pub enum FeedError {
    /// Transport-level failure (connection refused, DNS, 5xx, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the controller's maximum wait
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// The response body was not valid JSON
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FeedError {
    /// Creates a network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}
