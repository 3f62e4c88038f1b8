//! Alert decision engine.
//!
//! The engine is single-writer: one sample in, zero to two events out. It
//! reads time only from the samples it is given, so the caller's clock
//! decides what "now" is.

use crate::{EngineConfig, InvalidSampleError, PriceHistory, RuleState};
use pricewatch_core::{AlertEvent, PriceSample};
use tracing::debug;

/// Decision core for range and rapid-movement alerts.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    config: EngineConfig,
    history: PriceHistory,
    range_state: RuleState,
    rapid_state: RuleState,
}

impl AlertEngine {
    /// Create an engine. History retention equals the rapid-movement window.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            history: PriceHistory::new(config.rapid.window),
            config,
            range_state: RuleState::default(),
            rapid_state: RuleState::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &PriceHistory {
        &self.history
    }

    pub fn range_state(&self) -> &RuleState {
        &self.range_state
    }

    pub fn rapid_state(&self) -> &RuleState {
        &self.rapid_state
    }

    /// Process one sample and return the alerts it triggers.
    ///
    /// When both rules fire the order is always `[RangeEntry, RapidMovement]`.
    /// An invalid sample leaves every piece of state untouched.
    pub fn process(&mut self, sample: PriceSample) -> Result<Vec<AlertEvent>, InvalidSampleError> {
        self.validate(&sample)?;

        let now = sample.timestamp;
        let price = sample.price;
        self.history.append(sample);

        let mut events = Vec::with_capacity(2);

        let range = self.config.range;
        if range.contains(price) {
            if self.range_state.is_armed(now, range.cooldown) {
                events.push(AlertEvent::range_entry(
                    price,
                    now,
                    range.min_price,
                    range.max_price,
                ));
                self.range_state.mark_fired(now);
            } else {
                debug!(price = price, "Range alert suppressed by cooldown");
            }
        }

        let rapid = self.config.rapid;
        let movement = rapid.strongest(self.history.within_window(rapid.window), &sample);
        if let Some(movement) = movement {
            if self.rapid_state.is_armed(now, rapid.cooldown) {
                events.push(AlertEvent::rapid_movement(price, now, movement));
                self.rapid_state.mark_fired(now);
            } else {
                debug!(
                    price = price,
                    delta = movement.delta,
                    elapsed_secs = movement.elapsed_secs,
                    "Rapid alert suppressed by cooldown"
                );
            }
        }

        Ok(events)
    }

    fn validate(&self, sample: &PriceSample) -> Result<(), InvalidSampleError> {
        if !sample.price.is_finite() {
            return Err(InvalidSampleError::NonFinite(sample.price));
        }
        if sample.price <= 0.0 {
            return Err(InvalidSampleError::NonPositive(sample.price));
        }
        if let Some(latest) = self.history.latest() {
            if sample.timestamp < latest.timestamp {
                return Err(InvalidSampleError::OutOfOrder {
                    at: sample.timestamp,
                    latest: latest.timestamp,
                });
            }
        }
        Ok(())
    }
}
