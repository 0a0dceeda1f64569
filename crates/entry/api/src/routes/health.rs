//! Health and metrics endpoints.
//!
//! Component status is derived from heartbeat recency and the error
//! counters; nothing here touches the hot path.

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use pulseiq_events::counters;
use serde::Serialize;

use crate::models::ApiState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ComponentStatus {
    Alive,
    Degraded,
    Dead,
}

const SWEEPER_DEGRADED_SECS: i64 = 30;
const SWEEPER_DEAD_SECS: i64 = 180;
const QUEUE_DEGRADED_DEPTH: usize = 10_000;

fn sweeper_status(last_heartbeat: i64, now: i64) -> ComponentStatus {
    if last_heartbeat == 0 {
        // Not ticked yet: freshly started.
        return ComponentStatus::Alive;
    }
    let age = now - last_heartbeat;
    if age > SWEEPER_DEAD_SECS {
        ComponentStatus::Dead
    } else if age > SWEEPER_DEGRADED_SECS {
        ComponentStatus::Degraded
    } else {
        ComponentStatus::Alive
    }
}

/// `GET /health`
pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let now = Utc::now().timestamp();

    let sweeper = sweeper_status(
        state.ctx.sweeper_heartbeat().load(Ordering::Relaxed),
        now,
    );
    let ingest = if state.pool.queued_events() > QUEUE_DEGRADED_DEPTH {
        ComponentStatus::Degraded
    } else {
        ComponentStatus::Alive
    };
    let identity = if state.ctx.config().identity_store_url.is_some() {
        ComponentStatus::Alive
    } else {
        ComponentStatus::Degraded
    };

    let overall = [sweeper, ingest]
        .into_iter()
        .max_by_key(|status| match status {
            ComponentStatus::Alive => 0,
            ComponentStatus::Degraded => 1,
            ComponentStatus::Dead => 2,
        })
        .unwrap_or(ComponentStatus::Alive);

    Json(serde_json::json!({
        "status": overall,
        "components": {
            "ingest": ingest,
            "sweeper": sweeper,
            "identity": identity,
            "fabric": {
                "status": ComponentStatus::Alive,
                "dashboards": state.ctx.hub().connection_count(),
                "session_sockets": state.ctx.registry().bound_count(),
            },
        },
        "active_sessions": state.ctx.store().active_sessions(),
        "queued_events": state.pool.queued_events(),
        "ts": now,
    }))
}

/// `GET /metrics/counters`
pub async fn counters(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(counters::snapshot())
}
