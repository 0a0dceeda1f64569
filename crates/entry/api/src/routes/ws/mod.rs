//! WebSocket endpoints: dashboard fan-out and the per-session intervention
//! channel.

pub mod emotions;
pub mod session;

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;

/// Deadline on any single socket write; a blocked peer is disconnected.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Send one text frame under the write deadline. `false` means the
/// connection should be torn down.
pub async fn send_text(sink: &mut SplitSink<WebSocket, Message>, payload: String) -> bool {
    match tokio::time::timeout(WRITE_TIMEOUT, sink.send(Message::Text(payload.into()))).await {
        Ok(Ok(())) => true,
        Ok(Err(error)) => {
            tracing::debug!(error = %error, "websocket write failed");
            false
        },
        Err(_) => {
            tracing::debug!("websocket write timed out");
            false
        },
    }
}
