//! Aggregated pulse: snapshot endpoint and the SSE stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use futures_util::Stream;
use pulseiq_events::{standard_keep_alive, ToSse};

use crate::models::ApiState;

/// Cadence of pulse frames on the stream (the contract allows 2–5 s).
const STREAM_INTERVAL: Duration = Duration::from_secs(3);

/// `GET /pulse/snapshot`
pub async fn snapshot(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.ctx.pulse().lock().await.snapshot(Utc::now());
    Json(snapshot)
}

/// `GET /pulse/stream`: one JSON frame every few seconds plus the
/// standard 15 s heartbeat.
pub async fn stream(State(state): State<ApiState>) -> impl IntoResponse {
    let stream: std::pin::Pin<
        Box<dyn Stream<Item = Result<Event, Infallible>> + Send>,
    > = Box::pin(async_stream::stream! {
        let mut ticker = tokio::time::interval(STREAM_INTERVAL);
        loop {
            ticker.tick().await;
            let snapshot = state.ctx.pulse().lock().await.snapshot(Utc::now());
            match snapshot.to_sse() {
                Ok(event) => yield Ok(event),
                Err(error) => {
                    tracing::warn!(error = %error, "pulse frame serialization failed");
                },
            }
        }
    });

    Sse::new(stream).keep_alive(standard_keep_alive())
}
