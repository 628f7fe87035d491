//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::sim::history::HistoryRow;
use crate::sim::kpi::SettlementSummary;

/// Summary response: aggregate indicators plus the last recorded step.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: SettlementSummary,
    /// Final level per storage, in pool order.
    pub storage_levels: Vec<(String, f64)>,
    /// Most recent step, absent for an empty run.
    pub latest_step: Option<HistoryRow>,
}

/// One settlement log block.
#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub step: usize,
    pub text: String,
}

/// Optional inclusive step range.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    /// First step (inclusive).
    pub from: Option<usize>,
    /// Last step (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
