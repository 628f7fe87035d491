//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{ErrorResponse, LogEntry, RangeQuery, SummaryResponse};
use crate::sim::history::HistoryRow;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Returns the settlement summary, final storage levels, and latest step.
///
/// `GET /summary` → 200 + `SummaryResponse` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let latest_step = state.history.len().checked_sub(1).and_then(|i| state.history.row(i));
    let storage_levels = latest_step
        .as_ref()
        .map(|row| row.storage_levels.clone())
        .unwrap_or_default();

    Json(SummaryResponse {
        summary: state.summary.clone(),
        storage_levels,
        latest_step,
    })
}

/// Returns history rows, optionally filtered by step range.
///
/// `GET /history` → 200 + `Vec<HistoryRow>` JSON
/// `GET /history?from=N&to=M` → filtered range (inclusive)
/// `GET /history?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<HistoryRow>>, ApiError> {
    let (from, to) = checked_range(&query)?;
    let rows: Vec<HistoryRow> = state
        .history
        .rows()
        .filter(|r| r.step >= from && r.step <= to)
        .collect();
    Ok(Json(rows))
}

/// Returns settlement log blocks, optionally filtered by step range.
///
/// `GET /logs` → 200 + `Vec<LogEntry>` JSON
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let (from, to) = checked_range(&query)?;
    let entries: Vec<LogEntry> = state
        .logs
        .iter()
        .enumerate()
        .filter(|(step, _)| *step >= from && *step <= to)
        .map(|(step, text)| LogEntry {
            step,
            text: text.clone(),
        })
        .collect();
    Ok(Json(entries))
}

fn checked_range(query: &RangeQuery) -> Result<(usize, usize), ApiError> {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);
    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::sim::history::HistoryRecorder;
    use crate::sim::kpi::SettlementSummary;
    use crate::sim::log::render_block;
    use crate::sim::types::tests::sample_step;

    fn make_test_state() -> Arc<AppState> {
        let mut history = HistoryRecorder::new(["A"]);
        let mut logs = Vec::new();
        for step in 0..24 {
            let r = sample_step(step);
            history.record(&r);
            logs.push(render_block(&r));
        }
        Arc::new(AppState {
            summary: SettlementSummary::from_history(&history),
            history,
            logs,
        })
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(make_test_state());
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn summary_returns_200() {
        let (status, json) = get_json("/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["summary"]["steps"], 24);
        assert_eq!(json["latest_step"]["step"], 23);
        assert_eq!(json["storage_levels"][0][0], "A");
    }

    #[tokio::test]
    async fn history_returns_all_steps() {
        let (status, json) = get_json("/history").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().map(Vec::len), Some(24));
    }

    #[tokio::test]
    async fn history_range_query() {
        let (status, json) = get_json("/history?from=5&to=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().map(Vec::len), Some(6)); // steps 5..=10
        assert_eq!(json[0]["step"], 5);
        assert_eq!(json[5]["step"], 10);
    }

    #[tokio::test]
    async fn history_invalid_range_returns_400() {
        let (status, json) = get_json("/history?from=10&to=5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn logs_return_one_block_per_step() {
        let (status, json) = get_json("/logs?from=3&to=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["step"], 3);
        assert!(
            json[0]["text"]
                .as_str()
                .unwrap()
                .starts_with("=== Settlement step 3")
        );
    }
}
