//! Application configuration, loaded once from the environment.

use chrono::Duration as ChronoDuration;
use pricewatch_alerts::StartupSummary;
use pricewatch_core::TimeZoneSpec;
use pricewatch_engine::{EngineConfig, RangeRule, RapidRule};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Upper bound for a single HTTP call when `HTTP_TIMEOUT_SECONDS` is unset.
const DEFAULT_HTTP_TIMEOUT_SECS: f64 = 10.0;

/// Ten years. Cooldowns and the rapid window beyond this are rejected so the
/// engine's timestamp arithmetic stays in range.
const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 3600;

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Telegram delivery target.
#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Immutable watcher configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Base asset symbol, upper-cased (e.g. TAO)
    pub token_name: String,
    pub min_price: f64,
    pub max_price: f64,
    pub poll_interval: Duration,
    pub range_cooldown_secs: u64,
    pub rapid_usd_delta: f64,
    pub rapid_window_minutes: f64,
    pub rapid_cooldown_secs: u64,
    pub timezone: TimeZoneSpec,
    /// `None` in dry-run mode
    pub telegram: Option<TelegramSettings>,
    /// Enables the CoinMarketCap fallback when set
    pub cmc_api_key: Option<String>,
    /// Bound for every fetch and notify call; always below `poll_interval`
    pub http_timeout: Duration,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("token_name", &self.token_name)
            .field("min_price", &self.min_price)
            .field("max_price", &self.max_price)
            .field("poll_interval", &self.poll_interval)
            .field("range_cooldown_secs", &self.range_cooldown_secs)
            .field("rapid_usd_delta", &self.rapid_usd_delta)
            .field("rapid_window_minutes", &self.rapid_window_minutes)
            .field("rapid_cooldown_secs", &self.rapid_cooldown_secs)
            .field("timezone", &self.timezone.label())
            .field("telegram", &self.telegram)
            .field("cmc_api_key", &self.cmc_api_key.as_ref().map(|_| "<redacted>"))
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env(dry_run: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), dry_run)
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, dry_run: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let token_name = env.required("TOKEN_NAME")?.to_uppercase();
        let min_price: f64 = env.parse_or("MIN_P", 220.0)?;
        let max_price: f64 = env.parse_or("MAX_P", 230.0)?;
        let poll_seconds: u64 = env.parse_or("POLL_SECONDS", 15)?;
        let range_cooldown_secs: u64 = env.parse_or("RANGE_COOLDOWN_SECONDS", 300)?;
        let rapid_usd_delta: f64 = env.parse_or("RAPID_USD_DELTA", 5.0)?;
        let rapid_window_minutes: f64 = env.parse_or("RAPID_WINDOW_MINUTES", 2.0)?;
        let rapid_cooldown_secs: u64 = env.parse_or("RAPID_COOLDOWN_SECONDS", 120)?;
        let timezone = TimeZoneSpec::parse(&env.get("TIMEZONE").unwrap_or_else(|| "UTC".into()));

        let telegram = if dry_run {
            None
        } else {
            Some(TelegramSettings {
                bot_token: env.required("TELEGRAM_BOT_TOKEN")?,
                chat_id: env.required("TELEGRAM_CHAT_ID")?,
            })
        };
        let cmc_api_key = env.get("CMC_API_KEY");

        for (key, value) in [
            ("MIN_P", min_price),
            ("MAX_P", max_price),
            ("RAPID_USD_DELTA", rapid_usd_delta),
            ("RAPID_WINDOW_MINUTES", rapid_window_minutes),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    key,
                    value: value.to_string(),
                    reason: "must be a finite number".to_string(),
                });
            }
        }
        if min_price > max_price {
            return Err(ConfigError::Inconsistent(format!(
                "MIN_P ({}) is greater than MAX_P ({})",
                min_price, max_price
            )));
        }
        if poll_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "POLL_SECONDS",
                value: poll_seconds.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if rapid_usd_delta <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "RAPID_USD_DELTA",
                value: rapid_usd_delta.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if rapid_window_minutes <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "RAPID_WINDOW_MINUTES",
                value: rapid_window_minutes.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        for (key, secs) in [
            ("RANGE_COOLDOWN_SECONDS", range_cooldown_secs),
            ("RAPID_COOLDOWN_SECONDS", rapid_cooldown_secs),
        ] {
            if secs > MAX_DURATION_SECS {
                return Err(ConfigError::Invalid {
                    key,
                    value: secs.to_string(),
                    reason: format!("must be at most {} seconds", MAX_DURATION_SECS),
                });
            }
        }
        if rapid_window_minutes * 60.0 > MAX_DURATION_SECS as f64 {
            return Err(ConfigError::Invalid {
                key: "RAPID_WINDOW_MINUTES",
                value: rapid_window_minutes.to_string(),
                reason: format!("must be at most {} minutes", MAX_DURATION_SECS / 60),
            });
        }

        let poll_interval = Duration::from_secs(poll_seconds);
        let http_timeout = match env.get("HTTP_TIMEOUT_SECONDS") {
            Some(raw) => {
                let secs: f64 = parse_value("HTTP_TIMEOUT_SECONDS", &raw)?;
                if !secs.is_finite() || secs <= 0.0 || secs >= poll_seconds as f64 {
                    return Err(ConfigError::Invalid {
                        key: "HTTP_TIMEOUT_SECONDS",
                        value: raw,
                        reason: format!("must be positive and below POLL_SECONDS ({})", poll_seconds),
                    });
                }
                Duration::from_secs_f64(secs)
            }
            None => Duration::from_secs_f64(DEFAULT_HTTP_TIMEOUT_SECS.min(poll_seconds as f64 * 0.8)),
        };

        Ok(Self {
            token_name,
            min_price,
            max_price,
            poll_interval,
            range_cooldown_secs,
            rapid_usd_delta,
            rapid_window_minutes,
            rapid_cooldown_secs,
            timezone,
            telegram,
            cmc_api_key,
            http_timeout,
        })
    }

    /// Rule thresholds for the alert engine. Durations were bounded by
    /// `MAX_DURATION_SECS` at load time, so the conversions cannot overflow.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            range: RangeRule {
                min_price: self.min_price,
                max_price: self.max_price,
                cooldown: ChronoDuration::seconds(self.range_cooldown_secs as i64),
            },
            rapid: RapidRule {
                usd_delta: self.rapid_usd_delta,
                window: ChronoDuration::milliseconds((self.rapid_window_minutes * 60_000.0) as i64),
                cooldown: ChronoDuration::seconds(self.rapid_cooldown_secs as i64),
            },
        }
    }

    pub fn startup_summary(&self, providers: Vec<&'static str>) -> StartupSummary {
        StartupSummary {
            providers,
            min_price: self.min_price,
            max_price: self.max_price,
            rapid_usd_delta: self.rapid_usd_delta,
            rapid_window_minutes: self.rapid_window_minutes,
            poll_seconds: self.poll_interval.as_secs(),
        }
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => parse_value(key, &raw),
            None => Ok(default),
        }
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
