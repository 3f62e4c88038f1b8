//! REST price providers.
//!
//! MEXC is the primary source (public ticker endpoint, no key needed).
//! CoinMarketCap is the fallback and requires an API key.

use crate::{FeedError, PriceProvider};
use async_trait::async_trait;
use pricewatch_core::parse_decimal;
use std::time::Duration;
use tracing::debug;

/// Stablecoin every symbol is quoted against.
pub const QUOTE_ASSET: &str = "USDT";

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

async fn get_json(
    provider: &'static str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<serde_json::Value, FeedError> {
    let response = request
        .send()
        .await
        .map_err(|e| FeedError::from_reqwest(provider, e, timeout))?;

    if !response.status().is_success() {
        return Err(FeedError::Status {
            provider,
            status: response.status().as_u16(),
        });
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| FeedError::from_reqwest(provider, e, timeout))
}

/// MEXC spot ticker provider.
pub struct MexcProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl MexcProvider {
    pub const NAME: &'static str = "mexc";
    const BASE_URL: &'static str = "https://api.mexc.com";

    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(Self::BASE_URL, timeout)
    }

    /// Point the provider at another host (mirrors, local test servers).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Parse `{"symbol":"TAOUSDT","price":"431.27"}`.
    pub fn parse_ticker(json: &serde_json::Value) -> Result<f64, FeedError> {
        parse_decimal(&json["price"])
            .ok_or_else(|| FeedError::parse(Self::NAME, format!("no usable price in {}", json)))
    }
}

#[async_trait]
impl PriceProvider for MexcProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64, FeedError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let pair = format!("{}{}", symbol, QUOTE_ASSET);
        debug!(pair = %pair, "MEXC: fetching ticker");

        let request = self.client.get(&url).query(&[("symbol", pair.as_str())]);
        let json = get_json(Self::NAME, request, self.timeout).await?;
        Self::parse_ticker(&json)
    }
}

/// CoinMarketCap latest-quotes provider.
pub struct CoinMarketCapProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl CoinMarketCapProvider {
    pub const NAME: &'static str = "coinmarketcap";
    const BASE_URL: &'static str = "https://pro-api.coinmarketcap.com";

    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url(Self::BASE_URL, api_key, timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: build_client(timeout),
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    /// Parse `{"data":{"TAO":{"quote":{"USDT":{"price":431.27}}}}}`.
    pub fn parse_quote(json: &serde_json::Value, symbol: &str) -> Result<f64, FeedError> {
        if let Some(message) = json["status"]["error_message"].as_str() {
            if json["status"]["error_code"].as_i64().unwrap_or(0) != 0 {
                return Err(FeedError::parse(Self::NAME, message.to_string()));
            }
        }

        let price = &json["data"][symbol]["quote"][QUOTE_ASSET]["price"];
        parse_decimal(price).ok_or_else(|| {
            FeedError::parse(Self::NAME, format!("no {} quote for {}", QUOTE_ASSET, symbol))
        })
    }
}

#[async_trait]
impl PriceProvider for CoinMarketCapProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn fetch_price(&self, symbol: &str) -> Result<f64, FeedError> {
        let url = format!("{}/v1/cryptocurrency/quotes/latest", self.base_url);
        debug!(symbol = symbol, "CoinMarketCap: fetching quote");

        let request = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("convert", QUOTE_ASSET)])
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .header("Accept", "application/json");
        let json = get_json(Self::NAME, request, self.timeout).await?;
        Self::parse_quote(&json, symbol)
    }
}
