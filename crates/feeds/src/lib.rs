//! Price sources for the watcher.
//!
//! ## Architecture
//!
//! - `provider` - the `PriceProvider` trait every REST source implements
//! - `rest` - MEXC (primary) and CoinMarketCap (fallback) providers
//! - `source` - `PriceSource`, an ordered provider chain with per-provider timeouts

pub mod error;
pub mod provider;
pub mod rest;
pub mod source;

pub use error::*;
pub use provider::*;
pub use rest::*;
pub use source::*;
