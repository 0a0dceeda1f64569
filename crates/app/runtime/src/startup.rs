//! Startup reachability probes. Failures map to the documented exit codes
//! in `main`.

use std::time::Duration;

use pulseiq_models::Config;
use thiserror::Error;

use crate::context::AppContext;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("bus unreachable at {0}")]
    BusUnreachable(String),

    #[error("identity store unreachable: {0}")]
    IdentityUnreachable(String),
}

/// When `BUS_URL` is set, the broker must answer a TCP connect at startup.
pub async fn probe_bus(config: &Config) -> Result<(), StartupError> {
    let Some(ref url) = config.bus_url else {
        return Ok(());
    };

    let addr = url
        .trim_start_matches("nats://")
        .trim_start_matches("tcp://")
        .to_string();

    match tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect(&addr)).await {
        Ok(Ok(_)) => {
            tracing::info!(bus = %addr, "bus reachable");
            Ok(())
        },
        Ok(Err(e)) => Err(StartupError::BusUnreachable(format!("{addr}: {e}"))),
        Err(_) => Err(StartupError::BusUnreachable(format!("{addr}: timeout"))),
    }
}

/// When an identity store is configured, probe it. Unreachable is fatal
/// only when `IDENTITY_REQUIRED` says so; otherwise the service starts
/// degraded and resolves everyone as anonymous.
pub async fn probe_identity(ctx: &AppContext) -> Result<(), StartupError> {
    if ctx.config().identity_store_url.is_none() {
        return Ok(());
    }

    match ctx.resolver().probe().await {
        Ok(()) => {
            tracing::info!("identity store reachable");
            Ok(())
        },
        Err(error) if ctx.config().identity_required => {
            Err(StartupError::IdentityUnreachable(error.to_string()))
        },
        Err(error) => {
            tracing::warn!(error = %error, "identity store unreachable, starting degraded");
            Ok(())
        },
    }
}
