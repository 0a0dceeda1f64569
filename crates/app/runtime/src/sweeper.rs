//! Expiry sweeper: the only component besides the ingest path allowed to
//! move session state.
//!
//! Ticks every few seconds to finalize `closing` sessions past their grace
//! window; the full idle sweep runs on the contract's 60 s cadence.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pulseiq_events::counters;
use pulseiq_models::SessionLifecycleEvent;
use pulseiq_session::TerminatedSession;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

const TICK: Duration = Duration::from_secs(5);
const IDLE_SWEEP_EVERY: u32 = 12;

pub fn spawn(ctx: Arc<AppContext>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut tick = 0_u32;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {},
            }

            let now = Utc::now();
            ctx.sweeper_heartbeat()
                .store(now.timestamp(), Ordering::Relaxed);

            terminate(&ctx, ctx.store().finalize_closing(now), false);

            tick += 1;
            if tick % IDLE_SWEEP_EVERY == 0 {
                terminate(&ctx, ctx.store().expire_idle(now), true);
            }
        }
        tracing::info!("sweeper stopped");
    })
}

fn terminate(ctx: &AppContext, sessions: Vec<TerminatedSession>, idle: bool) {
    for terminated in sessions {
        if idle {
            counters::IDLE_EVICTIONS.increment();
        }
        tracing::info!(
            session_id = %terminated.session_id,
            outcome = %terminated.outcome.final_outcome,
            "session terminated"
        );
        ctx.engine().clear_session(&terminated.session_id);
        ctx.registry().unbind(&terminated.session_id);
        ctx.bus().publish_lifecycle(SessionLifecycleEvent::Terminated {
            outcome: Box::new(terminated.outcome),
            ts: Utc::now(),
        });
    }
}
