use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::error::AppError;
use crate::pipeline::standings::RiderView;
use crate::state::AppState;
use crate::types::geo::Coordinate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/riders", get(list_riders))
        .route("/api/positions", get(list_positions))
        .route("/api/riders/:pid/focus", post(focus_rider))
        .route("/api/focus", get(next_focus))
}

#[derive(Serialize)]
struct PositionMarker {
    pid: String,
    name: String,
    distance_miles: f64,
    coordinate: Coordinate,
    at_checkpoint: bool,
    last_seen: Option<String>,
    last_checkpoint: Option<String>,
}

#[derive(Serialize)]
struct FocusResponse {
    pid: String,
}

fn current_riders(state: &AppState) -> Result<Vec<RiderView>, AppError> {
    state
        .riders(Utc::now())
        .ok_or_else(|| AppError::Unavailable("Tracking data not yet available".to_string()))
}

async fn list_riders(State(state): State<AppState>) -> Result<Json<Vec<RiderView>>, AppError> {
    Ok(Json(current_riders(&state)?))
}

async fn list_positions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PositionMarker>>, AppError> {
    let markers = current_riders(&state)?
        .into_iter()
        .filter_map(|rider| {
            let position = rider.position?;
            Some(PositionMarker {
                pid: rider.pid,
                name: rider.name,
                distance_miles: position.distance_miles,
                coordinate: position.coordinate,
                at_checkpoint: position.at_checkpoint,
                last_seen: rider.last_seen,
                last_checkpoint: rider.last_checkpoint,
            })
        })
        .collect();

    Ok(Json(markers))
}

async fn focus_rider(
    State(state): State<AppState>,
    Path(pid): Path<String>,
) -> Result<(StatusCode, Json<FocusResponse>), AppError> {
    let pid = pid.trim().to_string();
    if pid.is_empty() {
        return Err(AppError::BadRequest("Missing rider id".to_string()));
    }

    let rider = current_riders(&state)?
        .into_iter()
        .find(|rider| rider.pid == pid)
        .ok_or_else(|| AppError::NotFound(format!("Rider {}", pid)))?;
    if rider.position.is_none() {
        return Err(AppError::NotFound(format!("No position for rider {}", pid)));
    }

    state.focus().request(pid.clone());
    tracing::info!("Focus requested for rider {}", pid);

    Ok((StatusCode::ACCEPTED, Json(FocusResponse { pid })))
}

async fn next_focus(State(state): State<AppState>) -> Response {
    match state.focus().take() {
        Some(pid) => Json(FocusResponse { pid }).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
