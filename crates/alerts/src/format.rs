//! Notification message formatting.

use pricewatch_core::{AlertDetail, AlertEvent, RapidMove, TimeZoneSpec};

/// What the startup message reports about the running watcher.
#[derive(Debug, Clone)]
pub struct StartupSummary {
    pub providers: Vec<&'static str>,
    pub min_price: f64,
    pub max_price: f64,
    pub rapid_usd_delta: f64,
    pub rapid_window_minutes: f64,
    pub poll_seconds: u64,
}

/// Renders alerts as plain text, with timestamps in the configured timezone.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    token: String,
    timezone: TimeZoneSpec,
}

impl MessageFormatter {
    pub fn new(token: impl Into<String>, timezone: TimeZoneSpec) -> Self {
        Self {
            token: token.into(),
            timezone,
        }
    }

    pub fn timezone(&self) -> &TimeZoneSpec {
        &self.timezone
    }

    fn pair(&self) -> String {
        format!("{}/USDT", self.token)
    }

    fn time_line(&self, event: &AlertEvent) -> String {
        format!(
            "Time: {} ({})",
            self.timezone.format(event.timestamp),
            self.timezone.label()
        )
    }

    /// Format one alert; `provider` names the source of the price.
    pub fn alert(&self, event: &AlertEvent, provider: &str) -> String {
        match &event.detail {
            AlertDetail::Range { min, max } => format!(
                "🎯 {} in range [{}-{}]\nPrice: {:.4}\n{}\nSource: {}",
                self.pair(),
                min,
                max,
                event.price,
                self.time_line(event),
                provider
            ),
            AlertDetail::Rapid(rapid) => self.rapid(event, rapid, provider),
        }
    }

    fn rapid(&self, event: &AlertEvent, rapid: &RapidMove, provider: &str) -> String {
        let (emoji, sign) = if rapid.delta > 0.0 { ("📈", '+') } else { ("📉", '-') };
        format!(
            "{} Rapid {} detected\nFrom {:.4} → {:.4}\n{}${:.2} in {}s\n{}\nSource: {}",
            emoji,
            rapid.direction().label(),
            rapid.reference_price,
            event.price,
            sign,
            rapid.delta.abs(),
            rapid.elapsed_secs,
            self.time_line(event),
            provider
        )
    }

    /// Message announcing the watcher and its thresholds.
    pub fn startup(&self, summary: &StartupSummary) -> String {
        let sources = match summary.providers.as_slice() {
            [] => "none".to_string(),
            [only] => format!("{} only", only),
            [primary, rest @ ..] => format!("{} primary, {} fallback", primary, rest.join(", ")),
        };
        format!(
            "✅ {} watcher started\n\
             - Source: {}\n\
             - Range alert: {}-{}\n\
             - Rapid alert: ${} in {} min\n\
             - Poll: {}s\n\
             - TZ: {}",
            self.pair(),
            sources,
            summary.min_price,
            summary.max_price,
            summary.rapid_usd_delta,
            summary.rapid_window_minutes,
            summary.poll_seconds,
            self.timezone.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn formatter(tz: &str) -> MessageFormatter {
        MessageFormatter::new("TAO", TimeZoneSpec::parse(tz))
    }

    #[test]
    fn test_range_message() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = AlertEvent::range_entry(225.12346, at, 220.0, 230.0);
        assert_eq!(
            formatter("GMT+8").alert(&event, "mexc"),
            "🎯 TAO/USDT in range [220-230]\n\
             Price: 225.1235\n\
             Time: 2024-05-01 20:00:00 (GMT+8)\n\
             Source: mexc"
        );
    }

    #[test]
    fn test_rapid_fall_message() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 45).unwrap();
        let event = AlertEvent::rapid_movement(
            224.5,
            at,
            RapidMove {
                delta: -5.5,
                elapsed_secs: 45,
                reference_price: 230.0,
                reference_at: at - Duration::seconds(45),
            },
        );
        assert_eq!(
            formatter("UTC").alert(&event, "coinmarketcap"),
            "📉 Rapid FALL detected\n\
             From 230.0000 → 224.5000\n\
             -$5.50 in 45s\n\
             Time: 2024-05-01 12:00:45 (UTC)\n\
             Source: coinmarketcap"
        );
    }

    #[test]
    fn test_rapid_rise_sign() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = AlertEvent::rapid_movement(
            100.6,
            at,
            RapidMove {
                delta: 0.6,
                elapsed_secs: 20,
                reference_price: 100.0,
                reference_at: at,
            },
        );
        let msg = formatter("UTC").alert(&event, "mexc");
        assert!(msg.starts_with("📈 Rapid RISE detected"));
        assert!(msg.contains("+$0.60 in 20s"));
    }

    #[test]
    fn test_startup_message() {
        let summary = StartupSummary {
            providers: vec!["mexc", "coinmarketcap"],
            min_price: 220.0,
            max_price: 230.0,
            rapid_usd_delta: 5.0,
            rapid_window_minutes: 2.0,
            poll_seconds: 15,
        };
        assert_eq!(
            formatter("GMT-4").startup(&summary),
            "✅ TAO/USDT watcher started\n\
             - Source: mexc primary, coinmarketcap fallback\n\
             - Range alert: 220-230\n\
             - Rapid alert: $5 in 2 min\n\
             - Poll: 15s\n\
             - TZ: GMT-4"
        );

        let single = StartupSummary {
            providers: vec!["mexc"],
            ..summary
        };
        assert!(formatter("UTC").startup(&single).contains("- Source: mexc only"));
    }
}
