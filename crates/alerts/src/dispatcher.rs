//! Background notification dispatch.
//!
//! The poll loop hands messages to a bounded queue and moves on; a single
//! background task delivers them in order. Delivery failures are logged
//! and counted, never propagated back to the caller.

use crate::notifier::{Notifier, NotifyError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Default queue depth.
pub const DISPATCH_QUEUE_CAPACITY: usize = 64;

/// Delivery counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub sent: AtomicU64,
    pub failed: AtomicU64,
    pub dropped: AtomicU64,
}

impl DispatchStats {
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Owns the delivery task and the sending half of its queue.
pub struct NotificationDispatcher {
    tx: mpsc::Sender<String>,
    task: JoinHandle<()>,
    stats: Arc<DispatchStats>,
    notifier_name: &'static str,
}

impl NotificationDispatcher {
    /// Spawn the delivery task. Must be called inside a tokio runtime.
    pub fn start(notifier: Arc<dyn Notifier>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));
        let stats = Arc::new(DispatchStats::default());
        let notifier_name = notifier.name();

        let task_stats = Arc::clone(&stats);
        let task = tokio::spawn(async move {
            info!(notifier = notifier_name, "Notification dispatcher started");

            while let Some(message) = rx.recv().await {
                match notifier.send(&message).await {
                    Ok(()) => {
                        task_stats.sent.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        task_stats.failed.fetch_add(1, Ordering::Relaxed);
                        error!(notifier = notifier_name, error = %e, "Failed to send notification");
                    }
                }
            }

            info!(notifier = notifier_name, "Notification dispatcher stopped");
        });

        Self {
            tx,
            task,
            stats,
            notifier_name,
        }
    }

    pub fn notifier_name(&self) -> &'static str {
        self.notifier_name
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// Queue a message without waiting. A full queue drops the message.
    pub fn dispatch(&self, message: String) -> Result<(), NotifyError> {
        match self.tx.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(notifier = self.notifier_name, "Notification queue full, message dropped");
                Err(NotifyError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(NotifyError::Closed)
            }
        }
    }

    /// Stop accepting messages and let queued ones drain for up to `grace`.
    /// Whatever is still in flight afterwards is abandoned.
    pub async fn shutdown(self, grace: Duration) -> Arc<DispatchStats> {
        let Self { tx, task, stats, .. } = self;
        drop(tx);

        let abort = task.abort_handle();
        if tokio::time::timeout(grace, task).await.is_err() {
            warn!(grace = ?grace, "Notification dispatcher did not drain in time, aborting");
            abort.abort();
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, message: &str) -> Result<(), NotifyError> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn send(&self, _message: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Status {
                status: 401,
                body: "Unauthorized".to_string(),
            })
        }
    }

    /// Blocks every delivery until a permit is released.
    struct GatedNotifier {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl Notifier for GatedNotifier {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn send(&self, _message: &str) -> Result<(), NotifyError> {
            let permit = self.gate.acquire().await.map_err(|_| NotifyError::Closed)?;
            permit.forget();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_messages_delivered_in_order_on_shutdown() {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = NotificationDispatcher::start(notifier.clone(), 8);

        dispatcher.dispatch("first".to_string()).unwrap();
        dispatcher.dispatch("second".to_string()).unwrap();

        let stats = dispatcher.shutdown(Duration::from_secs(1)).await;
        assert_eq!(stats.sent(), 2);
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_propagated() {
        let dispatcher = NotificationDispatcher::start(Arc::new(FailingNotifier), 8);
        assert!(dispatcher.dispatch("alert".to_string()).is_ok());

        let stats = dispatcher.shutdown(Duration::from_secs(1)).await;
        assert_eq!(stats.sent(), 0);
        assert_eq!(stats.failed(), 1);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let gate = Arc::new(Semaphore::new(0));
        let dispatcher = NotificationDispatcher::start(
            Arc::new(GatedNotifier { gate: gate.clone() }),
            1,
        );

        // At most one message in flight plus one queued
        let results: Vec<_> = (0..3).map(|i| dispatcher.dispatch(format!("m{}", i))).collect();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(NotifyError::QueueFull)))
            .count();
        assert!(rejected >= 1);

        gate.add_permits(3);
        let stats = dispatcher.shutdown(Duration::from_secs(1)).await;
        assert_eq!(stats.dropped() as usize, rejected);
        assert_eq!(stats.sent() as usize, 3 - rejected);
    }

    #[tokio::test]
    async fn test_shutdown_aborts_stuck_delivery() {
        let gate = Arc::new(Semaphore::new(0));
        let dispatcher = NotificationDispatcher::start(Arc::new(GatedNotifier { gate }), 4);
        dispatcher.dispatch("stuck".to_string()).unwrap();

        let started = std::time::Instant::now();
        let stats = dispatcher.shutdown(Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(stats.sent(), 0);
    }
}
