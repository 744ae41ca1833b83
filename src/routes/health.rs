use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let riders = state.resources().freshness(&state.profiles_request());
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "event": state.config().event_id,
        "riders": riders,
    }))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "last_updated": state.resources().last_updated(),
        "tick": state.tick(),
    }))
}
