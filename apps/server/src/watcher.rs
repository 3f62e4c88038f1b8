//! Poll loop: fetch a price, evaluate the rules, dispatch notifications.

use pricewatch_alerts::{MessageFormatter, NotificationDispatcher, StartupSummary};
use pricewatch_core::{AlertKind, PriceSample};
use pricewatch_engine::AlertEngine;
use pricewatch_feeds::PriceSource;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// What happened during one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A sample reached the engine.
    Evaluated {
        provider: &'static str,
        price: f64,
        alerts: Vec<AlertKind>,
    },
    /// No provider produced a price; history untouched.
    FetchFailed,
    /// The engine rejected the sample.
    Discarded,
}

/// Counters reported at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatcherStats {
    pub ticks: u64,
    pub fetch_failures: u64,
    pub discarded: u64,
    pub alerts: u64,
}

/// Single-task watcher. Owns all engine state; only notification delivery
/// runs elsewhere.
pub struct Watcher {
    symbol: String,
    source: PriceSource,
    engine: AlertEngine,
    formatter: MessageFormatter,
    dispatcher: NotificationDispatcher,
    poll_interval: Duration,
    stats: WatcherStats,
}

impl Watcher {
    pub fn new(
        symbol: impl Into<String>,
        source: PriceSource,
        engine: AlertEngine,
        formatter: MessageFormatter,
        dispatcher: NotificationDispatcher,
        poll_interval: Duration,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            source,
            engine,
            formatter,
            dispatcher,
            poll_interval,
            stats: WatcherStats::default(),
        }
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    pub fn stats(&self) -> WatcherStats {
        self.stats
    }

    /// Send the startup summary through the notification channel.
    pub fn announce(&self, summary: &StartupSummary) {
        self.notify(self.formatter.startup(summary));
    }

    /// Echo to the log, then hand off to the dispatcher.
    fn notify(&self, message: String) {
        info!("{}", message.replace('\n', " | "));
        if let Err(e) = self.dispatcher.dispatch(message) {
            warn!(error = %e, "Notification not queued");
        }
    }

    /// Run one fetch-evaluate-notify cycle.
    pub async fn poll_once(&mut self) -> TickOutcome {
        self.stats.ticks += 1;

        let sourced = match self.source.fetch_price(&self.symbol).await {
            Ok(sourced) => sourced,
            Err(e) => {
                self.stats.fetch_failures += 1;
                if e.is_transient() {
                    warn!("Price unavailable for {}/USDT: {}", self.symbol, e);
                } else {
                    error!("Price unavailable for {}/USDT, will keep retrying: {}", self.symbol, e);
                }
                return TickOutcome::FetchFailed;
            }
        };

        let PriceSample { timestamp, price } = sourced.sample;
        info!(
            "[{}] [{}] {}/USDT = {:.4}",
            self.formatter.timezone().format(timestamp),
            sourced.provider,
            self.symbol,
            price
        );

        let events = match self.engine.process(sourced.sample) {
            Ok(events) => events,
            Err(e) => {
                self.stats.discarded += 1;
                warn!(provider = sourced.provider, error = %e, "Sample discarded");
                return TickOutcome::Discarded;
            }
        };

        self.stats.alerts += events.len() as u64;
        for event in &events {
            self.notify(self.formatter.alert(event, sourced.provider));
        }

        TickOutcome::Evaluated {
            provider: sourced.provider,
            price,
            alerts: events.iter().map(|e| e.kind).collect(),
        }
    }

    /// Poll on a fixed interval until `shutdown` flips to true (or its
    /// sender is dropped). The first poll happens immediately.
    ///
    /// An in-flight poll always completes; queued notifications get
    /// `drain_grace` to go out before the dispatcher is torn down.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>, drain_grace: Duration) -> WatcherStats {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            symbol = %self.symbol,
            interval = ?self.poll_interval,
            "Starting watcher loop"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    self.poll_once().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Watcher loop stopped");

        let stats = self.stats;
        let delivery = self.dispatcher.shutdown(drain_grace).await;
        info!(
            ticks = stats.ticks,
            fetch_failures = stats.fetch_failures,
            discarded = stats.discarded,
            alerts = stats.alerts,
            notifications_sent = delivery.sent(),
            notifications_failed = delivery.failed(),
            notifications_dropped = delivery.dropped(),
            "Final stats"
        );
        stats
    }
}
