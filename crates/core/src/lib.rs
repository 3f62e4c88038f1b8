//! Core data types for the price watcher.

pub mod alert;
pub mod clock;
pub mod price;
pub mod timezone;

pub use alert::*;
pub use clock::*;
pub use price::*;
pub use timezone::*;
