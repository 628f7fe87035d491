//! REST API over a finished settlement run.
//!
//! Provides three GET endpoints:
//! - `/summary` - settlement summary and final storage levels
//! - `/history` - recorded step rows with optional range filtering
//! - `/logs` - settlement log blocks in step order

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::runner::SimulationResult;
use crate::sim::history::HistoryRecorder;
use crate::sim::kpi::SettlementSummary;

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`; all data
/// is read-only.
pub struct AppState {
    /// Aggregate settlement summary.
    pub summary: SettlementSummary,
    /// Recorded per-step series.
    pub history: HistoryRecorder,
    /// One settlement block per step.
    pub logs: Vec<String>,
}

impl From<SimulationResult> for AppState {
    fn from(result: SimulationResult) -> Self {
        Self {
            summary: result.summary,
            history: result.history,
            logs: result.logs,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/history", get(handlers::get_history))
        .route("/logs", get(handlers::get_logs))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
