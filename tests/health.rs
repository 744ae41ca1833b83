use std::sync::Arc;

use axum::{body::to_bytes, http::Request, Router};
use ridetrack_rs::api::{FetchFuture, Fetcher};
use ridetrack_rs::config::Config;
use ridetrack_rs::error::FetchError;
use ridetrack_rs::pipeline::path::{PathIndex, RouteGeometry, WaypointIndex};
use ridetrack_rs::types::geo::Coordinate;
use ridetrack_rs::{routes, state::AppState};
use tower::ServiceExt;

struct Offline;

impl Fetcher for Offline {
    fn fetch(&self, _path: &str, _params: &[(String, String)]) -> FetchFuture {
        Box::pin(async { Err(FetchError::Transport("offline".to_string())) })
    }
}

fn app() -> Router {
    let route = RouteGeometry::new(vec![Coordinate::new(2.03, 48.77), Coordinate::new(-4.49, 48.39)])
        .expect("route");
    let path = PathIndex::new(route, WaypointIndex::new());
    let state = AppState::new(Config::default(), path, Arc::new(Offline));
    Router::new()
        .merge(routes::health::router())
        .merge(routes::riders::router())
        .with_state(state)
}

async fn get_text(app: Router, uri: &str) -> (axum::http::StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method("GET")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, String::from_utf8(body.to_vec()).expect("utf8"))
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, text) = get_text(app(), "/health").await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert!(text.contains("\"status\":\"ok\""));
    assert!(text.contains("\"riders\":\"absent\""));
}

#[tokio::test]
async fn status_reports_no_update_before_first_fetch() {
    let (status, text) = get_text(app(), "/api/status").await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert!(text.contains("\"last_updated\":null"));
    assert!(text.contains("\"tick\":0"));
}

#[tokio::test]
async fn riders_unavailable_while_api_is_down() {
    let (status, text) = get_text(app(), "/api/riders").await;

    assert_eq!(status, axum::http::StatusCode::SERVICE_UNAVAILABLE);
    assert!(text.contains("\"error\""));
}
