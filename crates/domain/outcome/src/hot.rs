//! Hot snapshot store: latest outcome per session, upserted on termination
//! and read by dashboard queries.

use dashmap::DashMap;
use pulseiq_identifiers::{SessionId, TenantId};
use pulseiq_models::SessionOutcome;

#[derive(Debug, Default)]
pub struct HotSnapshotStore {
    outcomes: DashMap<SessionId, SessionOutcome>,
}

impl HotSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, outcome: SessionOutcome) {
        self.outcomes.insert(outcome.session_id.clone(), outcome);
    }

    pub fn get(&self, session_id: &SessionId) -> Option<SessionOutcome> {
        self.outcomes.get(session_id).map(|entry| entry.clone())
    }

    /// Most recent outcomes, newest first, optionally narrowed to a tenant.
    pub fn recent(&self, tenant: Option<&TenantId>, limit: usize) -> Vec<SessionOutcome> {
        let mut outcomes: Vec<SessionOutcome> = self
            .outcomes
            .iter()
            .filter(|entry| tenant.is_none_or(|t| &entry.tenant_id == t))
            .map(|entry| entry.clone())
            .collect();
        outcomes.sort_by(|a, b| b.ended_at.cmp(&a.ended_at));
        outcomes.truncate(limit);
        outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
