//! Error types for sample validation.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A sample the engine refused to process. The tick is discarded and no
/// engine state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidSampleError {
    #[error("price is not a finite number: {0}")]
    NonFinite(f64),

    #[error("price must be positive, got {0}")]
    NonPositive(f64),

    #[error("sample at {at} is older than the latest sample at {latest}")]
    OutOfOrder {
        at: DateTime<Utc>,
        latest: DateTime<Utc>,
    },
}
