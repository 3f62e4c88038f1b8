//! Alert events produced by the decision engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which rule produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Price is inside the configured band.
    RangeEntry,
    /// Price moved by at least the configured delta inside the window.
    RapidMovement,
}

/// Direction of a rapid movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Rise,
    Fall,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Rise => "RISE",
            Direction::Fall => "FALL",
        }
    }
}

/// Details of a rapid movement relative to its reference sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RapidMove {
    /// Signed change: `price - reference_price`
    pub delta: f64,
    /// Time between the reference sample and the new sample
    pub elapsed_secs: i64,
    /// Price of the reference sample
    pub reference_price: f64,
    /// Timestamp of the reference sample
    pub reference_at: DateTime<Utc>,
}

impl RapidMove {
    pub fn direction(&self) -> Direction {
        if self.delta > 0.0 {
            Direction::Rise
        } else {
            Direction::Fall
        }
    }
}

/// Rule-specific payload carried by an alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AlertDetail {
    /// Band the price was found in: (min, max)
    Range { min: f64, max: f64 },
    Rapid(RapidMove),
}

/// An alert decision for a single tick. Transient, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub detail: AlertDetail,
}

impl AlertEvent {
    pub fn range_entry(price: f64, timestamp: DateTime<Utc>, min: f64, max: f64) -> Self {
        Self {
            kind: AlertKind::RangeEntry,
            price,
            timestamp,
            detail: AlertDetail::Range { min, max },
        }
    }

    pub fn rapid_movement(price: f64, timestamp: DateTime<Utc>, rapid: RapidMove) -> Self {
        Self {
            kind: AlertKind::RapidMovement,
            price,
            timestamp,
            detail: AlertDetail::Rapid(rapid),
        }
    }

    /// Rapid-movement details, if this is a rapid alert.
    pub fn rapid(&self) -> Option<&RapidMove> {
        match &self.detail {
            AlertDetail::Rapid(rapid) => Some(rapid),
            AlertDetail::Range { .. } => None,
        }
    }
}
