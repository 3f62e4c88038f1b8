//! Price Watcher - Headless Server
//!
//! Polls a token price, fires range and rapid-movement alerts, and delivers
//! them to Telegram.

mod config;
mod watcher;

use clap::Parser;
use config::AppConfig;
use pricewatch_alerts::{
    LogNotifier, MessageFormatter, NotificationDispatcher, Notifier, TelegramNotifier,
};
use pricewatch_alerts::dispatcher::DISPATCH_QUEUE_CAPACITY;
use pricewatch_core::{Clock, SystemClock};
use pricewatch_engine::AlertEngine;
use pricewatch_feeds::{CoinMarketCapProvider, MexcProvider, PriceSource};
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use watcher::{Watcher, WatcherStats};

/// Price Watcher CLI
#[derive(Parser, Debug)]
#[command(name = "pricewatch")]
#[command(about = "Token price range and rapid-move alerts", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error (RUST_LOG overrides)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<String>,

    /// Log notifications instead of sending them to Telegram
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Skip the startup notification
    #[arg(long, default_value_t = false)]
    no_startup_message: bool,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}

fn build_price_source(config: &AppConfig, clock: Arc<dyn Clock>) -> PriceSource {
    let source = PriceSource::new(config.http_timeout, clock)
        .with_provider(MexcProvider::new(config.http_timeout));

    match &config.cmc_api_key {
        Some(key) => source.with_provider(CoinMarketCapProvider::new(key.clone(), config.http_timeout)),
        None => {
            info!("CMC_API_KEY not set, CoinMarketCap fallback disabled");
            source
        }
    }
}

fn build_notifier(config: &AppConfig) -> Arc<dyn Notifier> {
    match &config.telegram {
        Some(telegram) => Arc::new(TelegramNotifier::new(
            telegram.bot_token.clone(),
            telegram.chat_id.clone(),
            config.http_timeout,
        )),
        None => {
            warn!("Dry run: notifications will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Exit status for configuration errors.
const CONFIG_ERROR_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Load before logging so RUST_LOG can come from the file
    let env_loaded = match &args.env_file {
        Some(path) => dotenvy::from_path(path).map_err(|e| (path.clone(), e)),
        None => {
            // .env is optional
            let _ = dotenvy::dotenv();
            Ok(())
        }
    };

    init_logging(&args.log_level);

    if let Err((path, e)) = env_loaded {
        error!("Failed to load env file {}: {}", path, e);
        return ExitCode::FAILURE;
    }

    let config = match AppConfig::from_env(args.dry_run) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::from(CONFIG_ERROR_EXIT);
        }
    };

    info!("🚀 Price watcher starting...");
    info!("  Token: {}/USDT", config.token_name);
    info!("  Range: {}-{}", config.min_price, config.max_price);
    info!(
        "  Rapid: ${} in {} min",
        config.rapid_usd_delta, config.rapid_window_minutes
    );
    info!("  Poll: {:?} (HTTP timeout {:?})", config.poll_interval, config.http_timeout);
    info!("  Timezone: {}", config.timezone);
    info!("  Dry Run: {}", args.dry_run);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let source = build_price_source(&config, clock);
    let providers = source.provider_names();

    let notifier = build_notifier(&config);
    let dispatcher = NotificationDispatcher::start(notifier, DISPATCH_QUEUE_CAPACITY);

    let watcher = Watcher::new(
        config.token_name.clone(),
        source,
        AlertEngine::new(config.engine_config()),
        MessageFormatter::new(config.token_name.clone(), config.timezone.clone()),
        dispatcher,
        config.poll_interval,
    );

    if !args.no_startup_message {
        watcher.announce(&config.startup_summary(providers));
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watcher_handle = tokio::spawn(watcher.run(shutdown_rx, config.http_timeout));

    info!("Press Ctrl+C to stop...");
    match supervise(watcher_handle, shutdown_tx, shutdown_signal()).await {
        Stopped::OnSignal => {
            info!("👋 Price watcher stopped");
            ExitCode::SUCCESS
        }
        Stopped::WatcherExited => ExitCode::FAILURE,
    }
}

/// How the watcher ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stopped {
    OnSignal,
    WatcherExited,
}

/// Wait for `signal` and stop the watcher, unless the watcher task ends on
/// its own first (a panic or an early return), which is a failure.
async fn supervise<S>(
    mut watcher: JoinHandle<WatcherStats>,
    shutdown_tx: watch::Sender<bool>,
    signal: S,
) -> Stopped
where
    S: Future<Output = ()>,
{
    tokio::select! {
        _ = signal => {
            warn!("Shutdown signal received");
        }
        result = &mut watcher => {
            match result {
                Ok(_) => error!("Watcher loop exited unexpectedly"),
                Err(e) => error!("Watcher task failed: {}", e),
            }
            return Stopped::WatcherExited;
        }
    }

    let _ = shutdown_tx.send(true);
    match watcher.await {
        Ok(_) => Stopped::OnSignal,
        Err(e) => {
            error!("Watcher task failed during shutdown: {}", e);
            Stopped::WatcherExited
        }
    }
}
