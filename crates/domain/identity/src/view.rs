//! The identity-view seam: an async lookup the resolver caches over.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use pulseiq_identifiers::SessionId;
use pulseiq_models::Identity;

use crate::error::{IdentityError, Result};

#[async_trait]
pub trait IdentityView: Send + Sync {
    /// Look one session up. `Ok(None)` means the view answered and the
    /// session is anonymous; errors mean the view itself misbehaved.
    async fn fetch(&self, session_id: &SessionId) -> Result<Option<Identity>>;

    /// Startup reachability probe. Views without a health surface answer
    /// `Ok(())`.
    async fn probe(&self) -> Result<()> {
        Ok(())
    }
}

/// HTTP implementation against the identity store
/// (`GET {base}/identities/{session_id}`).
#[derive(Debug, Clone)]
pub struct HttpIdentityView {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityView {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IdentityView for HttpIdentityView {
    async fn fetch(&self, session_id: &SessionId) -> Result<Option<Identity>> {
        let url = format!("{}/identities/{}", self.base_url, session_id);
        let response = self.client.get(&url).send().await?;

        match response.status().as_u16() {
            200 => Ok(Some(response.json::<Identity>().await?)),
            404 => Ok(None),
            status => Err(IdentityError::Status(status)),
        }
    }

    async fn probe(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(IdentityError::Unavailable(format!(
                "health returned {}",
                response.status()
            )))
        }
    }
}

/// Fixed in-memory view. Used in tests and as the degraded default when no
/// identity store is configured.
#[derive(Debug, Default)]
pub struct StaticIdentityView {
    identities: HashMap<SessionId, Identity>,
}

impl StaticIdentityView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, session_id: SessionId, identity: Identity) -> Self {
        self.identities.insert(session_id, identity);
        self
    }
}

#[async_trait]
impl IdentityView for StaticIdentityView {
    async fn fetch(&self, session_id: &SessionId) -> Result<Option<Identity>> {
        Ok(self.identities.get(session_id).cloned())
    }
}
