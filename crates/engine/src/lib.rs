//! Alerting decision engine.
//!
//! Consumes one price sample at a time, keeps a short rolling history and
//! decides which alerts fire for that sample.
//!
//! ## Rules
//!
//! - **Range**: price inside `[min, max]`, rate-limited by its cooldown.
//! - **Rapid movement**: price moved by at least a USD delta against the
//!   oldest sample still inside the rolling window, rate-limited by its own
//!   cooldown.

pub mod engine;
pub mod error;
pub mod history;
pub mod rules;

pub use engine::*;
pub use error::*;
pub use history::*;
pub use rules::*;
