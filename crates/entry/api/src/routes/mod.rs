//! Route wiring.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::models::ApiState;

pub mod health;
pub mod pulse;
pub mod telemetry;
pub mod ws;

/// Telemetry batches above this size are rejected with 413.
pub const MAX_BATCH_BYTES: usize = 256 * 1024;

pub fn configure_routes(state: ApiState) -> Router {
    Router::new()
        .route(
            "/telemetry",
            post(telemetry::ingest).layer(DefaultBodyLimit::max(MAX_BATCH_BYTES)),
        )
        .route("/pulse/snapshot", get(pulse::snapshot))
        .route("/pulse/stream", get(pulse::stream))
        .route("/ws/emotions", get(ws::emotions::upgrade))
        .route("/ws/session/{session_id}", get(ws::session::upgrade))
        .route("/health", get(health::health))
        .route("/metrics/counters", get(health::counters))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
