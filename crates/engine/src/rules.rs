//! Alert rule thresholds and per-rule cooldown state.

use chrono::{DateTime, Duration, Utc};
use pricewatch_core::{PriceSample, RapidMove};

/// Cooldown tracking shared by both rules.
///
/// A rule is *armed* when it has never fired or its cooldown has fully
/// elapsed, and *cooling down* otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleState {
    last_fired_at: Option<DateTime<Utc>>,
}

impl RuleState {
    pub fn last_fired_at(&self) -> Option<DateTime<Utc>> {
        self.last_fired_at
    }

    /// Inclusive at the boundary: a sample exactly at expiry is eligible.
    pub fn is_armed(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => now - last >= cooldown,
        }
    }

    pub fn mark_fired(&mut self, now: DateTime<Utc>) {
        self.last_fired_at = Some(now);
    }
}

/// Range rule: fire while `min <= price <= max`, at most once per cooldown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeRule {
    pub min_price: f64,
    pub max_price: f64,
    pub cooldown: Duration,
}

impl RangeRule {
    /// Both bounds count as inside.
    pub fn contains(&self, price: f64) -> bool {
        self.min_price <= price && price <= self.max_price
    }
}

/// Rapid-movement rule: fire when the price moved by at least `usd_delta`
/// against any earlier sample inside `window`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RapidRule {
    pub usd_delta: f64,
    pub window: Duration,
    pub cooldown: Duration,
}

impl RapidRule {
    /// Measure the move from `reference` to `sample`, returning it only when
    /// it meets the threshold.
    pub fn measure(&self, reference: &PriceSample, sample: &PriceSample) -> Option<RapidMove> {
        let delta = sample.price - reference.price;
        if delta.abs() < self.usd_delta {
            return None;
        }
        Some(RapidMove {
            delta,
            elapsed_secs: (sample.timestamp - reference.timestamp).num_seconds(),
            reference_price: reference.price,
            reference_at: reference.timestamp,
        })
    }

    /// Largest qualifying move from any of `references` to `sample`. On equal
    /// magnitude the earliest reference wins.
    pub fn strongest<'a>(
        &self,
        references: impl IntoIterator<Item = &'a PriceSample>,
        sample: &PriceSample,
    ) -> Option<RapidMove> {
        references
            .into_iter()
            .filter_map(|reference| self.measure(reference, sample))
            .fold(None, |best: Option<RapidMove>, candidate| match best {
                Some(best) if best.delta.abs() >= candidate.delta.abs() => Some(best),
                _ => Some(candidate),
            })
    }
}

/// Thresholds for both rules. Immutable for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub range: RangeRule,
    pub rapid: RapidRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            range: RangeRule {
                min_price: 220.0,
                max_price: 230.0,
                cooldown: Duration::seconds(300),
            },
            rapid: RapidRule {
                usd_delta: 5.0,
                window: Duration::minutes(2),
                cooldown: Duration::seconds(120),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_rule_state_cooldown_is_inclusive() {
        let mut state = RuleState::default();
        let cooldown = Duration::seconds(100);
        assert!(state.is_armed(t0(), cooldown));

        state.mark_fired(t0());
        assert!(!state.is_armed(t0() + Duration::seconds(99), cooldown));
        assert!(state.is_armed(t0() + Duration::seconds(100), cooldown));
        assert_eq!(state.last_fired_at(), Some(t0()));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let rule = EngineConfig::default().range;
        assert!(rule.contains(220.0));
        assert!(rule.contains(230.0));
        assert!(rule.contains(225.5));
        assert!(!rule.contains(219.99));
        assert!(!rule.contains(230.01));
    }

    #[test]
    fn test_rapid_measure() {
        let rule = RapidRule {
            usd_delta: 0.5,
            window: Duration::seconds(30),
            cooldown: Duration::seconds(10),
        };
        let reference = PriceSample::new(t0(), 100.0);

        let moved = rule
            .measure(&reference, &PriceSample::new(t0() + Duration::seconds(20), 99.4))
            .unwrap();
        assert!((moved.delta + 0.6).abs() < 1e-9);
        assert_eq!(moved.elapsed_secs, 20);

        assert!(rule
            .measure(&reference, &PriceSample::new(t0() + Duration::seconds(20), 100.3))
            .is_none());
    }

    #[test]
    fn test_rapid_strongest_prefers_largest_then_earliest() {
        let rule = RapidRule {
            usd_delta: 5.0,
            window: Duration::seconds(60),
            cooldown: Duration::seconds(0),
        };
        let sample = PriceSample::new(t0() + Duration::seconds(20), 98.0);
        let references = [
            PriceSample::new(t0(), 100.0),
            PriceSample::new(t0() + Duration::seconds(5), 91.0),
            PriceSample::new(t0() + Duration::seconds(10), 103.0),
        ];

        let moved = rule.strongest(&references, &sample).unwrap();
        assert_eq!(moved.reference_price, 91.0);
        assert!((moved.delta - 7.0).abs() < 1e-9);

        // 93 -> 98 and 103 -> 98 tie at 5; the earlier reference wins
        let references = [
            PriceSample::new(t0(), 100.0),
            PriceSample::new(t0() + Duration::seconds(5), 93.0),
            PriceSample::new(t0() + Duration::seconds(10), 103.0),
        ];
        let moved = rule.strongest(&references, &sample).unwrap();
        assert_eq!(moved.reference_price, 93.0);
        assert_eq!(moved.elapsed_secs, 15);

        assert!(rule.strongest(&references[..1], &sample).is_none());
    }
}
