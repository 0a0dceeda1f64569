//! Telemetry ingest: the write path from the browser collector.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pulseiq_events::counters;
use pulseiq_models::{TelemetryBatch, TelemetryEvent};

use crate::models::{ApiError, ApiState};

/// `POST /telemetry`: 204 on accept, 413 over the body limit (layered),
/// 429 past the tenant budget. Unknown event types inside an otherwise
/// valid batch are discarded with a counter, never forwarded.
pub async fn ingest(
    State(state): State<ApiState>,
    Json(batch): Json<TelemetryBatch>,
) -> Result<StatusCode, ApiError> {
    if batch.session_id.is_empty() || batch.tenant_id.is_empty() {
        return Err(ApiError::bad_request("session_id and tenant_id are required"));
    }

    let requested = std::num::NonZeroU32::new(batch.events.len().max(1) as u32)
        .unwrap_or(std::num::NonZeroU32::MIN);
    match state.tenant_limiter.check_key_n(&batch.tenant_id, requested) {
        Ok(Ok(())) => {},
        Ok(Err(_)) => return Err(ApiError::rate_limited()),
        // A batch bigger than the bucket can never pass; treat as a burst
        // violation rather than a permanent 400.
        Err(_) => return Err(ApiError::rate_limited()),
    }

    let mut accepted = 0_usize;
    for wire in &batch.events {
        match TelemetryEvent::from_wire(&batch.session_id, &batch.tenant_id, wire) {
            Some(event) => {
                state.pool.dispatch(event);
                accepted += 1;
            },
            None => {
                counters::UNKNOWN_EVENT_TYPES.increment();
                tracing::debug!(
                    session_id = %batch.session_id,
                    event_type = %wire.event_type,
                    "unknown event type discarded at ingest"
                );
            },
        }
    }

    tracing::trace!(
        session_id = %batch.session_id,
        tenant_id = %batch.tenant_id,
        accepted,
        total = batch.events.len(),
        "telemetry batch accepted"
    );

    Ok(StatusCode::NO_CONTENT)
}
