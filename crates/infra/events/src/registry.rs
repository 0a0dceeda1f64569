//! Routing table for targeted intervention delivery.
//!
//! Exactly one WebSocket may be bound per `session_id`; connects and
//! disconnects are the only writers. When no socket is bound the command is
//! acknowledged undelivered and dropped; there is no queueing across
//! reconnects.

use dashmap::DashMap;
use pulseiq_identifiers::SessionId;
use pulseiq_models::{DeliveryAck, InterventionCommand};
use tokio::sync::mpsc;

use crate::counters;

#[derive(Debug, Default)]
pub struct SessionSocketRegistry {
    sockets: DashMap<SessionId, mpsc::UnboundedSender<InterventionCommand>>,
}

impl SessionSocketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the session's socket, replacing any previous binding (a page
    /// reload reconnects before the old socket times out).
    pub fn bind(&self, session_id: &SessionId) -> mpsc::UnboundedReceiver<InterventionCommand> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.sockets.insert(session_id.clone(), sender);
        receiver
    }

    pub fn unbind(&self, session_id: &SessionId) {
        self.sockets.remove(session_id);
    }

    /// Route a command to the session's socket. Best-effort: an absent or
    /// closed socket yields `delivered=false`; cooldown bookkeeping upstream
    /// applies either way.
    pub fn deliver(&self, command: InterventionCommand) -> DeliveryAck {
        let correlation_id = command.correlation_id.clone();
        let session_id = command.session_id.clone();

        let delivered = match self.sockets.get(&session_id) {
            Some(sender) => sender.send(command).is_ok(),
            None => false,
        };

        if !delivered {
            counters::UNDELIVERED_INTERVENTIONS.increment();
            tracing::info!(
                session_id = %session_id,
                correlation_id = %correlation_id,
                "intervention not delivered, no live socket"
            );
        }

        DeliveryAck {
            delivered,
            correlation_id,
        }
    }

    pub fn is_bound(&self, session_id: &SessionId) -> bool {
        self.sockets.contains_key(session_id)
    }

    pub fn bound_count(&self) -> usize {
        self.sockets.len()
    }
}
