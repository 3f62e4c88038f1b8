//! Error types for price fetching.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching a price.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{provider}: request failed: {message}")]
    Http {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider}: failed to parse response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: timed out after {timeout:?}")]
    Timeout {
        provider: &'static str,
        timeout: Duration,
    },

    #[error("No price providers configured")]
    NoProviders,

    #[error("All price providers failed: {}", join_errors(.0))]
    AllProvidersFailed(Vec<FeedError>),
}

fn join_errors(errors: &[FeedError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

impl FeedError {
    pub fn parse(provider: &'static str, message: impl Into<String>) -> Self {
        FeedError::Parse {
            provider,
            message: message.into(),
        }
    }

    /// Build from a reqwest error, keeping timeouts distinguishable.
    pub fn from_reqwest(provider: &'static str, err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FeedError::Timeout { provider, timeout }
        } else if err.is_decode() {
            FeedError::parse(provider, err.to_string())
        } else {
            FeedError::Http {
                provider,
                message: err.to_string(),
            }
        }
    }

    /// Returns true if this error is transient and likely to succeed on the next poll.
    ///
    /// A failed chain is transient when any provider in it may recover.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Http { .. } | FeedError::Timeout { .. } => true,
            FeedError::Status { status, .. } => *status == 429 || *status >= 500,
            FeedError::AllProvidersFailed(failures) => failures.iter().any(FeedError::is_transient),
            FeedError::Parse { .. } | FeedError::NoProviders => false,
        }
    }
}
