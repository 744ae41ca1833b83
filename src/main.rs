use std::sync::Arc;

use axum::Router;
use ridetrack_rs::api::ApiClient;
use ridetrack_rs::cache::CacheEvent;
use ridetrack_rs::clock::RefreshClock;
use ridetrack_rs::pipeline::path::PathIndex;
use ridetrack_rs::{config, routes, state};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ridetrack_rs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env();
    if config.participants.is_empty() {
        tracing::warn!("TRACKER_PARTICIPANTS is empty; no riders will be tracked");
    }

    let path = match PathIndex::load(
        &config.route_file,
        &config.waypoints_file,
        config.event_length_miles,
    ) {
        Ok(path) => path,
        Err(err) => {
            tracing::error!("Failed to load route reference data: {}", err);
            std::process::exit(1);
        }
    };

    let client = match ApiClient::new(&config) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!("Failed to build tracking API client: {}", err);
            std::process::exit(1);
        }
    };

    let state = state::AppState::new(config.clone(), path, Arc::new(client));

    // Log cache activity
    let mut events = state.resources().subscribe();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match events.recv().await {
                Ok(CacheEvent::Updated { key, entry }) => {
                    tracing::info!("Updated {} (fetched at {})", key, entry.fetched_at);
                }
                Ok(CacheEvent::Failed { key, error }) => {
                    tracing::debug!("Refresh of {} failed: {}", key, error);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Cache event log skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Drive polling and estimate refresh from the display clock
    let clock = RefreshClock::start(config.refresh_interval);
    let mut ticks = clock.subscribe();
    let tick_state = state.clone();
    tick_state.refresh(0);
    tokio::spawn(async move {
        while ticks.changed().await.is_ok() {
            let tick = *ticks.borrow_and_update();
            tick_state.refresh(tick);
        }
    });

    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::riders::router())
        .merge(routes::checkpoints::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    tracing::info!("RideTrack-RS listening on {}", addr);
    tracing::info!("Tracking event {} every {:?}", config.event_id, config.refresh_interval);
    tracing::info!("Riders: GET http://{}/api/riders", addr);
    tracing::info!("Positions: GET http://{}/api/positions", addr);

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", err);
        }
    };

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!("Server error: {}", err);
    }

    tracing::info!("Shutting down after {} refresh ticks", clock.current());
    clock.stop();
}
