//! The per-event pipeline: ingest → physics → classify → pattern → decide →
//! emit, run inline on the owning shard worker.
//!
//! The only awaits are the identity fetch (200 ms deadline inside the
//! resolver) and bus/socket handoffs, which are channel sends. Physics,
//! classification, and pattern detection never suspend.

use std::time::Instant;

use pulseiq_emotion::{ClassifyInput, PatternDetector};
use pulseiq_events::counters;
use pulseiq_intervention::DecideInput;
use pulseiq_models::{SessionLifecycleEvent, TelemetryEvent};

use crate::context::AppContext;

/// Classify→decide must finish inside this budget; overruns are logged,
/// never blocking.
const PIPELINE_BUDGET_MS: u128 = 50;

pub async fn process_event(ctx: &AppContext, event: TelemetryEvent) {
    let outcome = ctx.store().append_event(&event);

    if outcome.duplicate {
        counters::DUPLICATE_EVENTS.increment();
        return;
    }

    if outcome.created {
        ctx.bus().publish_lifecycle(SessionLifecycleEvent::Created {
            session_id: event.session_id.clone(),
            tenant_id: event.tenant_id.clone(),
            ts: event.ts,
        });
    }
    if let Some((from, to)) = outcome.state_change {
        ctx.bus()
            .publish_lifecycle(SessionLifecycleEvent::StateChanged {
                session_id: event.session_id.clone(),
                from,
                to,
                ts: event.ts,
            });
    }

    let snapshot = outcome.snapshot;

    // Identity is the one upstream I/O dependency; it fails open and
    // carries its own deadline, so the classify→decide budget starts after.
    let identity = ctx.resolver().resolve(&event.session_id).await;
    let started = Instant::now();

    let input = ClassifyInput {
        event: &event,
        physics: &snapshot.physics,
        session_age_ms: snapshot.session_age_ms,
    };

    let Some(finding) = ctx.classifier().classify(&input) else {
        return;
    };
    if !ctx
        .classifier()
        .passes_cooldown(&snapshot.recent_emotions, finding.emotion, event.ts)
    {
        return;
    }

    let sample = ctx
        .classifier()
        .build_sample(&input, finding, identity.ltv_usd);

    if let Err(error) = ctx.store().record_emotion(&event.session_id, sample.clone()) {
        tracing::debug!(error = %error, "emotion for vanished session dropped");
        return;
    }

    ctx.pulse().lock().await.record(sample.ts, sample.emotion);
    ctx.bus().publish_emotion(sample.clone());
    ctx.hub().publish(&event.tenant_id, &sample);

    // Pattern detection sees the history including the fresh sample.
    let mut history = snapshot.recent_emotions;
    history.push(sample.clone());
    let patterns = PatternDetector::detect(&history, &snapshot.recent_event_types);

    let decision = ctx.engine().decide(&DecideInput {
        session_id: &event.session_id,
        session_state: snapshot.state,
        now: event.ts,
        ltv_usd: identity.ltv_usd,
        patterns: &patterns,
        sample: &sample,
    });

    if let Some((command, record)) = decision {
        if let Err(error) = ctx.store().record_intervention(&event.session_id, record) {
            tracing::debug!(error = %error, "intervention for vanished session dropped");
        }
        tracing::info!(
            session_id = %command.session_id,
            intervention = %command.intervention_type,
            priority = %command.priority,
            correlation_id = %command.correlation_id,
            "intervention dispatched"
        );
        ctx.bus().publish_intervention(command.clone());
        let ack = ctx.registry().deliver(command);
        if ack.delivered {
            tracing::debug!(correlation_id = %ack.correlation_id, "intervention delivered");
        }
    }

    let elapsed = started.elapsed().as_millis();
    if elapsed > PIPELINE_BUDGET_MS {
        counters::PIPELINE_BUDGET_OVERRUNS.increment();
        tracing::warn!(
            session_id = %event.session_id,
            elapsed_ms = elapsed as u64,
            "classify→decide budget overrun"
        );
    }
}
