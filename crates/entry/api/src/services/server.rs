//! Server lifecycle: bind, serve, drain on shutdown.

use anyhow::Result;
use axum::Router;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Serve until the shutdown token fires, then stop accepting and let
    /// the runtime flush within its grace period.
    pub async fn serve(self, addr: &str, shutdown: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
        tracing::info!(addr = %addr, "listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await?;
        Ok(())
    }
}
