//! The `pulseiq` service binary.
//!
//! Exit codes: 0 normal, 64 invalid config, 69 bus unreachable at startup,
//! 74 identity store unreachable (when required).

use std::sync::Arc;
use std::time::Duration;

use pulseiq_api::{configure_routes, ApiServer, ApiState};
use pulseiq_models::config::exit;
use pulseiq_models::Config;
use pulseiq_runtime::{probe_bus, probe_identity, shards, AppContext};
use tokio_util::sync::CancellationToken;

/// Runtime tasks get this long to flush after the listener stops.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(6);

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    pulseiq_logging::init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(error = %error, "invalid configuration");
            return exit::INVALID_CONFIG;
        },
    };

    if config.tls_cert_path.is_some() {
        tracing::info!("TLS_CERT_PATH set; TLS termination is handled by the fronting proxy");
    }

    if let Err(error) = probe_bus(&config).await {
        tracing::error!(error = %error, "bus probe failed");
        return exit::BUS_UNREACHABLE;
    }

    let listen_addr = config.listen_addr.clone();
    let ctx = match AppContext::builder(config).build() {
        Ok(ctx) => Arc::new(ctx),
        Err(error) => {
            tracing::error!(error = %error, "context construction failed");
            return exit::INVALID_CONFIG;
        },
    };

    if let Err(error) = probe_identity(&ctx).await {
        tracing::error!(error = %error, "identity probe failed");
        return exit::IDENTITY_UNREACHABLE;
    }

    let shutdown = CancellationToken::new();
    let handles = shards::start(Arc::clone(&ctx), shutdown.clone());
    let state = ApiState::new(Arc::clone(&ctx), Arc::clone(&handles.pool));
    let router = configure_routes(state);

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let served = ApiServer::new(router).serve(&listen_addr, shutdown.clone()).await;
    shutdown.cancel();

    // Give the workers their flush grace, then leave.
    let join_all = async {
        for task in handles.tasks {
            let _ = task.await;
        }
    };
    if tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, join_all).await.is_err() {
        tracing::warn!("runtime tasks did not stop within the grace period");
    }

    match served {
        Ok(()) => {
            tracing::info!("shutdown complete");
            exit::OK
        },
        Err(error) => {
            tracing::error!(error = %error, "server error");
            exit::INVALID_CONFIG
        },
    }
}
