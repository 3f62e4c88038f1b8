//! Rolling price history.

use chrono::{DateTime, Duration, Utc};
use pricewatch_core::PriceSample;
use std::collections::VecDeque;

/// Time-ordered buffer of recent samples, pruned by age.
///
/// Every retained sample is at most `retention` older than the latest one.
/// Entries are ordered by timestamp ascending (oldest at the front).
#[derive(Debug, Clone)]
pub struct PriceHistory {
    samples: VecDeque<PriceSample>,
    retention: Duration,
}

impl PriceHistory {
    /// Create an empty history keeping samples for `retention`.
    pub fn new(retention: Duration) -> Self {
        Self {
            samples: VecDeque::new(),
            retention,
        }
    }

    /// Insert a sample at the end and evict everything older than
    /// `sample.timestamp - retention` from the front.
    ///
    /// Callers must supply non-decreasing timestamps.
    pub fn append(&mut self, sample: PriceSample) {
        self.samples.push_back(sample);
        // A retention reaching past the representable range keeps everything
        if let Some(cutoff) = sample.timestamp.checked_sub_signed(self.retention) {
            self.evict_before(cutoff);
        }
    }

    fn evict_before(&mut self, cutoff: DateTime<Utc>) {
        while let Some(front) = self.samples.front() {
            if front.timestamp < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Earliest retained sample within `window` of the latest sample and
    /// strictly older than it.
    ///
    /// Returns `None` with fewer than two samples, or when every other sample
    /// shares the latest timestamp.
    pub fn oldest_within_window(&self, window: Duration) -> Option<&PriceSample> {
        self.within_window(window).next()
    }

    /// Every retained sample within `window` of the latest one and strictly
    /// older than it, oldest first.
    pub fn within_window(&self, window: Duration) -> impl Iterator<Item = &PriceSample> {
        let latest = self.latest().map(|s| s.timestamp);
        let cutoff = latest.and_then(|at| at.checked_sub_signed(window));
        self.samples.iter().filter(move |s| match latest {
            Some(latest) => s.timestamp < latest && cutoff.map_or(true, |c| s.timestamp >= c),
            None => false,
        })
    }

    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceSample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn at(secs: i64, price: f64) -> PriceSample {
        PriceSample::new(t0() + Duration::seconds(secs), price)
    }

    #[test]
    fn test_empty_history() {
        let history = PriceHistory::new(Duration::seconds(30));
        assert!(history.is_empty());
        assert!(history.latest().is_none());
        assert!(history.oldest_within_window(Duration::seconds(30)).is_none());
    }

    #[test]
    fn test_single_sample_has_no_reference() {
        let mut history = PriceHistory::new(Duration::seconds(30));
        history.append(at(0, 100.0));
        assert_eq!(history.len(), 1);
        assert!(history.oldest_within_window(Duration::seconds(30)).is_none());
    }

    #[test]
    fn test_append_evicts_old_samples() {
        let mut history = PriceHistory::new(Duration::seconds(30));
        history.append(at(0, 100.0));
        history.append(at(20, 100.6));
        history.append(at(30, 100.7));
        // Exactly at the retention boundary is kept
        assert_eq!(history.len(), 3);

        history.append(at(31, 100.7));
        let kept: Vec<i64> = history
            .iter()
            .map(|s| (s.timestamp - t0()).num_seconds())
            .collect();
        assert_eq!(kept, vec![20, 30, 31]);
    }

    #[test]
    fn test_oldest_within_window() {
        let mut history = PriceHistory::new(Duration::seconds(60));
        history.append(at(0, 1.0));
        history.append(at(10, 2.0));
        history.append(at(40, 3.0));

        let reference = history.oldest_within_window(Duration::seconds(60)).unwrap();
        assert_eq!(reference.price, 1.0);

        // A narrower window skips samples outside it
        let reference = history.oldest_within_window(Duration::seconds(30)).unwrap();
        assert_eq!(reference.price, 2.0);

        // Nothing older than the latest sample within 5s
        assert!(history.oldest_within_window(Duration::seconds(5)).is_none());
    }

    #[test]
    fn test_within_window_lists_every_older_sample() {
        let mut history = PriceHistory::new(Duration::seconds(60));
        history.append(at(0, 1.0));
        history.append(at(10, 2.0));
        history.append(at(40, 3.0));
        history.append(at(40, 4.0));

        let prices: Vec<f64> = history
            .within_window(Duration::seconds(30))
            .map(|s| s.price)
            .collect();
        assert_eq!(prices, vec![2.0]);

        let prices: Vec<f64> = history
            .within_window(Duration::seconds(60))
            .map(|s| s.price)
            .collect();
        assert_eq!(prices, vec![1.0, 2.0]);
    }

    #[test]
    fn test_huge_retention_keeps_everything() {
        let mut history = PriceHistory::new(Duration::weeks(1_000_000_000));
        history.append(at(0, 1.0));
        history.append(at(1_000_000, 2.0));
        assert_eq!(history.len(), 2);
        assert_eq!(history.oldest_within_window(Duration::weeks(1_000_000_000)).map(|s| s.price), Some(1.0));
    }

    #[test]
    fn test_duplicate_timestamps_are_not_a_reference() {
        let mut history = PriceHistory::new(Duration::seconds(30));
        history.append(at(5, 100.0));
        history.append(at(5, 100.0));
        assert_eq!(history.len(), 2);
        assert!(history.oldest_within_window(Duration::seconds(30)).is_none());
    }
}
