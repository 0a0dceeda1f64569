//! Read-through identity cache with negative caching and in-flight
//! coalescing.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use pulseiq_events::counters;
use pulseiq_identifiers::SessionId;
use pulseiq_models::Identity;

use crate::error::IdentityError;
use crate::view::IdentityView;

/// Known identities are kept this long.
pub const POSITIVE_TTL: Duration = Duration::from_secs(300);
/// Confirmed absence is cached briefly to stop thundering-herd lookups.
pub const NEGATIVE_TTL: Duration = Duration::from_secs(30);
/// Deadline on one view fetch; past it we fail open to anonymous.
pub const FETCH_TIMEOUT: Duration = Duration::from_millis(200);

const MAX_ENTRIES: u64 = 50_000;

pub struct IdentityResolver {
    view: Arc<dyn IdentityView>,
    known: Cache<SessionId, Identity>,
    absent: Cache<SessionId, ()>,
    fetch_timeout: Duration,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("known_entries", &self.known.entry_count())
            .field("absent_entries", &self.absent.entry_count())
            .finish_non_exhaustive()
    }
}

impl IdentityResolver {
    pub fn new(view: Arc<dyn IdentityView>) -> Self {
        Self::with_timeout(view, FETCH_TIMEOUT)
    }

    pub fn with_timeout(view: Arc<dyn IdentityView>, fetch_timeout: Duration) -> Self {
        Self {
            view,
            known: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(POSITIVE_TTL)
                .build(),
            absent: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(NEGATIVE_TTL)
                .build(),
            fetch_timeout,
        }
    }

    /// Resolve a session to an identity. Never errors and never blocks past
    /// the fetch deadline: every failure path degrades to anonymous.
    pub async fn resolve(&self, session_id: &SessionId) -> Identity {
        if self.absent.get(session_id).await.is_some() {
            return Identity::anonymous();
        }

        let view = Arc::clone(&self.view);
        let timeout = self.fetch_timeout;
        let lookup_id = session_id.clone();

        // `try_get_with` coalesces concurrent misses for the same key into
        // one in-flight fetch.
        let result = self
            .known
            .try_get_with(session_id.clone(), async move {
                match tokio::time::timeout(timeout, view.fetch(&lookup_id)).await {
                    Ok(Ok(Some(identity))) => Ok(identity),
                    Ok(Ok(None)) => Err(IdentityError::NotFound),
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(IdentityError::Timeout),
                }
            })
            .await;

        match result {
            Ok(identity) => identity,
            Err(error) => {
                match error.as_ref() {
                    IdentityError::NotFound => {
                        self.absent.insert(session_id.clone(), ()).await;
                    },
                    other => {
                        counters::IDENTITY_FAILURES.increment();
                        tracing::warn!(
                            session_id = %session_id,
                            error = %other,
                            "identity fetch degraded to anonymous"
                        );
                    },
                }
                Identity::anonymous()
            },
        }
    }

    /// Startup reachability check against the backing view.
    pub async fn probe(&self) -> crate::error::Result<()> {
        self.view.probe().await
    }
}
