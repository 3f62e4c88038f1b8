//! Ordered provider chain.

use crate::{FeedError, PriceProvider};
use pricewatch_core::{Clock, PriceSample};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A price sample together with the provider that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourcedSample {
    pub sample: PriceSample,
    pub provider: &'static str,
}

/// Tries each provider in order, short-circuiting on the first success.
///
/// Every provider call is bounded by `timeout`. Samples are stamped with the
/// injected clock at the moment a provider answers.
pub struct PriceSource {
    providers: Vec<Box<dyn PriceProvider>>,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl PriceSource {
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
            clock,
        }
    }

    /// Append a provider to the end of the chain.
    pub fn with_provider(mut self, provider: impl PriceProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the current price of `symbol`.
    ///
    /// With a single provider its error is returned as-is; with several, a
    /// failure of all of them yields [`FeedError::AllProvidersFailed`].
    pub async fn fetch_price(&self, symbol: &str) -> Result<SourcedSample, FeedError> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            let name = provider.name();
            let result = match tokio::time::timeout(self.timeout, provider.fetch_price(symbol)).await {
                Ok(result) => result,
                Err(_) => Err(FeedError::Timeout {
                    provider: name,
                    timeout: self.timeout,
                }),
            };

            match result {
                Ok(price) => {
                    debug!(provider = name, price = price, "Price fetched");
                    return Ok(SourcedSample {
                        sample: PriceSample::new(self.clock.now(), price),
                        provider: name,
                    });
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "Price provider failed");
                    failures.push(e);
                }
            }
        }

        match failures.len() {
            0 => Err(FeedError::NoProviders),
            1 => Err(failures.remove(0)),
            _ => Err(FeedError::AllProvidersFailed(failures)),
        }
    }
}
