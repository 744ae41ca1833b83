use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;
use crate::types::geo::Coordinate;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/checkpoints", get(list_checkpoints))
}

#[derive(Serialize)]
struct CheckpointMarker {
    name: String,
    km: Option<f64>,
    miles: Option<f64>,
    coordinate: Coordinate,
}

async fn list_checkpoints(
    State(state): State<AppState>,
) -> Result<Json<Vec<CheckpointMarker>>, AppError> {
    let checkpoints = state
        .checkpoints()
        .ok_or_else(|| AppError::Unavailable("Checkpoint data not yet available".to_string()))?;

    // Checkpoints without usable coordinates are not drawn.
    let markers = checkpoints
        .data
        .list
        .iter()
        .filter_map(|checkpoint| {
            let coords = checkpoint.coords.as_ref()?;
            let coordinate = Coordinate::new(
                coords.lng.parse("lng").ok()?,
                coords.lat.parse("lat").ok()?,
            );
            coordinate.is_valid().then(|| CheckpointMarker {
                name: checkpoint.name.clone(),
                km: checkpoint.km.as_ref().and_then(|km| km.parse("km").ok()),
                miles: checkpoint.miles.as_ref().and_then(|mi| mi.parse("miles").ok()),
                coordinate,
            })
        })
        .collect();

    Ok(Json(markers))
}
