//! Price provider abstraction.

use crate::FeedError;
use async_trait::async_trait;

/// A single upstream price source.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Short name used in logs and notification text.
    fn name(&self) -> &'static str;

    /// Fetch the current price of `symbol` quoted in USDT.
    async fn fetch_price(&self, symbol: &str) -> Result<f64, FeedError>;
}
