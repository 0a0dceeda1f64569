//! Server-Sent-Events plumbing shared by the pulse stream.

use std::time::Duration;

use axum::response::sse::{Event, KeepAlive};

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
pub const HEARTBEAT_JSON: &str = r#"{"type":"heartbeat"}"#;

/// Keep-alive used by every SSE endpoint: a `heartbeat` comment line on the
/// spec's 15 s cadence.
pub fn standard_keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(HEARTBEAT_INTERVAL)
        .text("heartbeat")
}

/// Types streamable as SSE data frames.
pub trait ToSse {
    fn to_sse(&self) -> Result<Event, serde_json::Error>;
}

impl<T: serde::Serialize> ToSse for T {
    fn to_sse(&self) -> Result<Event, serde_json::Error> {
        Ok(Event::default().data(serde_json::to_string(self)?))
    }
}
