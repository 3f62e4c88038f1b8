//! Alert delivery for the price watcher.
//!
//! This crate provides:
//! - A `Notifier` abstraction with Telegram and log-only implementations
//! - Message formatting for range, rapid-movement and startup notifications
//! - A background dispatcher so slow deliveries never hold up polling

pub mod dispatcher;
pub mod format;
pub mod notifier;
pub mod telegram;

pub use dispatcher::{DispatchStats, NotificationDispatcher};
pub use format::{MessageFormatter, StartupSummary};
pub use notifier::{LogNotifier, Notifier, NotifyError};
pub use telegram::TelegramNotifier;
