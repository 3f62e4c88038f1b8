//! Price sample representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single observed price at a point in time.
///
/// Samples are immutable once created. The price is quoted in the
/// stablecoin the feeds are configured against (USDT).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// When the price was observed
    pub timestamp: DateTime<Utc>,
    /// Observed price
    pub price: f64,
}

impl PriceSample {
    /// Create a new sample.
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Parse a decimal price as sent by exchange REST APIs.
///
/// Accepts both JSON strings (`"123.45"`) and JSON numbers. Returns `None`
/// for anything that is not a finite number.
pub fn parse_decimal(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        serde_json::Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}
