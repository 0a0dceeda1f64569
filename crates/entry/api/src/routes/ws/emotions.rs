//! `/ws/emotions`: dashboard stream with server-side filtering.

use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::StreamExt;
use pulseiq_events::HEARTBEAT_JSON;
use pulseiq_identifiers::ConnectionId;
use pulseiq_models::{ClientFrame, ServerFrame, SubscriptionFilter};

use super::send_text;
use crate::models::ApiState;

/// Fabric-side heartbeat cadence for dashboard sockets.
const HEARTBEAT: Duration = Duration::from_secs(1);

pub async fn upgrade(
    State(state): State<ApiState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle(socket, state))
}

async fn handle(socket: WebSocket, state: ApiState) {
    let conn_id = ConnectionId::generate();
    let mut subscription = state
        .ctx
        .hub()
        .register(&conn_id, SubscriptionFilter::default());

    tracing::info!(conn_id = %conn_id, "dashboard connected");

    let (mut sink, mut source) = socket.split();
    let mut heartbeat = tokio::time::interval(HEARTBEAT);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            frame = subscription.receiver.recv() => {
                let Some(payload) = frame else {
                    // Evicted by the hub (slow client); close out.
                    break;
                };
                let len = payload.len();
                let sent = send_text(&mut sink, payload).await;
                subscription.buffered.fetch_sub(len, Ordering::Relaxed);
                if !sent {
                    break;
                }
            },
            message = source.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_client_frame(&state, &conn_id, text.as_str(), &mut sink).await {
                            break;
                        }
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        use futures_util::SinkExt;
                        if sink.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(error)) => {
                        tracing::debug!(error = %error, "dashboard socket error");
                        break;
                    },
                    Some(Ok(_)) => {},
                }
            },
            _ = heartbeat.tick() => {
                if !send_text(&mut sink, HEARTBEAT_JSON.to_string()).await {
                    break;
                }
            },
        }
    }

    state.ctx.hub().unregister(&conn_id);
    tracing::info!(conn_id = %conn_id, "dashboard disconnected");
}

/// Apply one client frame. Returns `false` when the connection must close.
async fn handle_client_frame(
    state: &ApiState,
    conn_id: &ConnectionId,
    text: &str,
    sink: &mut futures_util::stream::SplitSink<WebSocket, Message>,
) -> bool {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame @ ClientFrame::Subscribe { .. }) => {
            if let Some(filter) = SubscriptionFilter::from_subscribe(&frame) {
                state.ctx.hub().update_filter(conn_id, filter);
            }
            true
        },
        Ok(ClientFrame::Ping) => {
            let pong = serde_json::to_string(&ServerFrame::Pong)
                .unwrap_or_else(|_| r#"{"type":"pong"}"#.to_string());
            send_text(sink, pong).await
        },
        Ok(ClientFrame::Ack { .. }) => true,
        Err(error) => {
            tracing::debug!(error = %error, "ignoring malformed dashboard frame");
            true
        },
    }
}
