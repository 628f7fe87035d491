//! Input errors detected before a simulation starts.

/// Reason a simulation refused to start.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("hourly data has {available} records, {steps} steps requested")]
    InsufficientHourlyData { steps: usize, available: usize },

    #[error("grid price table is empty")]
    EmptyGridPrices,

    #[error("step {step} has surplus energy but the cooperative has no storage")]
    NoStorageForSurplus { step: usize },

    #[error("hourly record {step} is invalid: {reason}")]
    InvalidHourlyRecord { step: usize, reason: String },

    #[error("grid price {index} is invalid: {reason}")]
    InvalidGridPrice { index: usize, reason: String },
}
