//! Input loading and output export.

/// Hourly feed and grid tariff loading, plus the synthetic profile.
pub mod data;
/// History CSV and settlement log export.
pub mod export;

pub use data::DataError;
