//! Notification sink abstraction.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Notification API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Notification timed out")]
    Timeout,
    #[error("Notification queue is full")]
    QueueFull,
    #[error("Notification dispatcher has shut down")]
    Closed,
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotifyError::Timeout
        } else {
            NotifyError::Http(err.to_string())
        }
    }
}

/// A channel that can deliver a formatted text message. Best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// Notifier that only writes messages to the log (dry-run mode).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        info!(notifier = "log", "{}", message.replace('\n', " | "));
        Ok(())
    }
}
