//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{
    CurveQuery, CurveResponse, DEFAULT_CURVE_POINTS, ErrorResponse, HistoryQuery,
    MAX_CURVE_POINTS, PanelSummary, StateResponse,
};
use crate::sim::types::Sample;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// Returns run config, panel summary, tracking report and latest sample.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        config: state.config.clone(),
        panel: PanelSummary::from(&state.panel),
        report: state.report.clone(),
        latest_sample: state.samples.last().cloned(),
    })
}

/// Returns samples, optionally filtered by iteration range.
///
/// `GET /history` → 200 + `Vec<Sample>` JSON
/// `GET /history?from=N&to=M` → filtered range (inclusive)
/// `GET /history?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err(bad_request(format!(
            "`from` ({from}) must be <= `to` ({to})"
        )));
    }

    let samples: Vec<Sample> = state
        .samples
        .iter()
        .filter(|s| s.iteration >= from && s.iteration <= to)
        .cloned()
        .collect();

    Ok(Json(samples))
}

/// Returns the I-V curve of the panel in its final environment.
///
/// `GET /iv-curve` → 200 + 100-point `CurveResponse`
/// `GET /iv-curve?points=N` → N points, 400 unless `2 <= N <= 10000`
pub async fn get_iv_curve(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CurveQuery>,
) -> impl IntoResponse {
    let points = query.points.unwrap_or(DEFAULT_CURVE_POINTS);
    if !(2..=MAX_CURVE_POINTS).contains(&points) {
        return Err(bad_request(format!(
            "`points` ({points}) must be in [2, {MAX_CURVE_POINTS}]"
        )));
    }

    let panel = &state.panel;
    Ok(Json(CurveResponse {
        irradiance: panel.state().irradiance(),
        temperature: panel.state().temperature(),
        points: panel.iv_curve(points).collect(),
        maximum_power_point: panel.maximum_power_point(points),
    }))
}
