//! Tracing subscriber setup for the PulseIQ service binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber: env-filtered (`RUST_LOG`), compact output
/// with targets, `pulseiq=info` when nothing is configured.
///
/// Safe to call more than once; later calls are no-ops (tests share a
/// process).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pulseiq=info,tower_http=warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .compact(),
        )
        .try_init();
}
