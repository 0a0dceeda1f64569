//! `/ws/session/{session_id}`: the targeted intervention channel bound to
//! one browser tab.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::StreamExt;
use pulseiq_identifiers::SessionId;
use pulseiq_models::{ClientFrame, ServerFrame};

use super::send_text;
use crate::models::ApiState;

pub async fn upgrade(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let session_id = SessionId::new(session_id);
    ws.on_upgrade(move |socket| handle(socket, state, session_id))
}

async fn handle(socket: WebSocket, state: ApiState, session_id: SessionId) {
    let mut commands = state.ctx.registry().bind(&session_id);
    tracing::info!(session_id = %session_id, "session socket bound");

    let (mut sink, mut source) = socket.split();
    // A page reload rebinds the route; the replaced socket must not tear
    // down the new one's registration on exit.
    let mut replaced = false;

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    replaced = true;
                    break;
                };
                let frame = ServerFrame::from(&command);
                match serde_json::to_string(&frame) {
                    Ok(payload) => {
                        if !send_text(&mut sink, payload).await {
                            break;
                        }
                        tracing::debug!(
                            session_id = %session_id,
                            correlation_id = %command.correlation_id,
                            "intervention frame written"
                        );
                    },
                    Err(error) => {
                        tracing::warn!(error = %error, "intervention frame serialization failed");
                    },
                }
            },
            message = source.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&state, &session_id, text.as_str());
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        use futures_util::SinkExt;
                        if sink.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(error)) => {
                        tracing::debug!(error = %error, "session socket error");
                        break;
                    },
                    Some(Ok(_)) => {},
                }
            },
        }
    }

    if !replaced {
        state.ctx.registry().unbind(&session_id);
    }
    tracing::info!(session_id = %session_id, "session socket closed");
}

fn handle_client_frame(state: &ApiState, session_id: &SessionId, text: &str) {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Ack { correlation_id }) => {
            let engine_ack = state.ctx.engine().ack(session_id, &correlation_id);
            let store_ack = state
                .ctx
                .store()
                .ack_intervention(session_id, &correlation_id)
                .unwrap_or(false);
            tracing::info!(
                session_id = %session_id,
                correlation_id = %correlation_id,
                engine_ack,
                store_ack,
                "intervention acknowledged"
            );
        },
        Ok(_) => {},
        Err(error) => {
            tracing::debug!(error = %error, "ignoring malformed session frame");
        },
    }
}
