//! Physics accumulator: a pure function from (previous physics, event) to
//! new physics.
//!
//! Determinism is a contract: replaying the same event sequence yields
//! bit-for-bit identical scalars. Nothing here is random or interpolated.

use pulseiq_models::{EventType, Section, SessionPhysics, TelemetryEvent, VELOCITY_HISTORY_LEN};

pub mod thresholds {
    /// dt clamp bounds, milliseconds.
    pub const MIN_DT_MS: i64 = 10;
    pub const MAX_DT_MS: i64 = 2_000;

    /// Recoil: a fast upward jump away from content.
    pub const RECOIL_VELOCITY: f64 = 600.0;
    pub const RECOIL_DY: f64 = -50.0;

    /// Reading band, px/s.
    pub const SLOW_READ_MIN: f64 = 10.0;
    pub const SLOW_READ_MAX: f64 = 100.0;

    /// Deliberate-approach band.
    pub const POSITIVE_ACCEL_MIN: f64 = 100.0;
    pub const POSITIVE_ACCEL_MAX: f64 = 500.0;
    pub const POSITIVE_ACCEL_VELOCITY_CAP: f64 = 500.0;

    /// |dx| above this with a sign flip counts as back-and-forth scanning.
    pub const BACK_FORTH_DX: f64 = 100.0;
    pub const OSCILLATION_COUNT: u32 = 3;

    /// Steady programmatic scrolling.
    pub const AUTO_SCROLL_VELOCITY: f64 = 200.0;
    pub const AUTO_SCROLL_ACCEL_BAND: f64 = 10.0;

    /// Entropy normalization divisor for velocity-history variance.
    pub const ENTROPY_NORMALIZER: f64 = 1e6;
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Pure kinematics updater. Holds no state of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicsEngine;

impl PhysicsEngine {
    pub const fn new() -> Self {
        Self
    }

    /// Fold one event into the physics record.
    pub fn update(prev: &SessionPhysics, event: &TelemetryEvent) -> SessionPhysics {
        let mut next = prev.clone();

        Self::apply_section(&mut next, event);
        Self::apply_counters(&mut next, event);
        Self::apply_presence_flags(&mut next, event);

        if let Some(motion) = event.motion {
            Self::apply_kinematics(&mut next, event, motion.x, motion.y, motion.scroll_y);
        }

        next.last_event_ts = Some(event.ts);
        next
    }

    fn apply_section(next: &mut SessionPhysics, event: &TelemetryEvent) {
        if let Some(section) = event.section {
            if section != next.section || next.section_start_time.is_none() {
                next.section = section;
                next.section_start_time = Some(event.ts);
                next.time_in_section_ms = 0;
                return;
            }
        }
        if let Some(started) = next.section_start_time {
            next.time_in_section_ms = (event.ts - started).num_milliseconds().max(0);
        }
    }

    fn apply_counters(next: &mut SessionPhysics, event: &TelemetryEvent) {
        if event.event_type.category() == "interaction" {
            next.interaction_count += 1;
        }
        match event.event_type {
            EventType::HoverStart => {
                next.hover_count += 1;
                if next.section == Section::Pricing {
                    next.hovering_pricing = true;
                }
            },
            EventType::HoverEnd => {
                next.hovering_pricing = false;
                if let Some(duration) = event.duration_ms {
                    next.hover_duration_ms += duration.max(0);
                }
            },
            _ => {},
        }
    }

    fn apply_presence_flags(next: &mut SessionPhysics, event: &TelemetryEvent) {
        match event.event_type {
            EventType::MouseExit | EventType::ViewportBoundary => next.mouse_gone = true,
            EventType::MouseReturn => next.mouse_gone = false,
            _ => {},
        }
    }

    fn apply_kinematics(
        next: &mut SessionPhysics,
        event: &TelemetryEvent,
        x: f64,
        y: f64,
        scroll_y: f64,
    ) {
        if !x.is_finite() || !y.is_finite() || !scroll_y.is_finite() {
            // Invariant violation: poisoned input resets the chain rather
            // than propagating NaN into every downstream sample.
            tracing::debug!(session_id = %event.session_id, "non-finite motion, kinematics reset");
            next.reset_kinematics();
            next.has_position = false;
            next.x = 0.0;
            next.y = 0.0;
            next.scroll_y = 0.0;
            return;
        }

        if !next.has_position {
            // First observation: position only, no derivatives yet.
            next.has_position = true;
            next.x = x;
            next.y = y;
            next.scroll_y = scroll_y;
            return;
        }
        let Some(last_ts) = next.last_event_ts else {
            next.x = x;
            next.y = y;
            next.scroll_y = scroll_y;
            return;
        };

        let raw_dt_ms = (event.ts - last_ts).num_milliseconds();
        if raw_dt_ms < 0 {
            tracing::debug!(session_id = %event.session_id, raw_dt_ms, "negative dt, kinematics reset");
            next.reset_kinematics();
            next.x = x;
            next.y = y;
            next.scroll_y = scroll_y;
            return;
        }
        if raw_dt_ms > thresholds::MAX_DT_MS {
            // Session gap: never interpolate across it.
            next.reset_kinematics();
            next.x = x;
            next.y = y;
            next.scroll_y = scroll_y;
            return;
        }

        let dt_ms = raw_dt_ms.max(thresholds::MIN_DT_MS);
        let dt_s = dt_ms as f64 / 1_000.0;

        let dx = x - next.x;
        let mut dy = y - next.y;
        if event.event_type == EventType::Scroll && dy == 0.0 {
            dy = scroll_y - next.scroll_y;
        }

        let velocity = round3(dx.hypot(dy) / dt_s);
        let acceleration = round3((velocity - next.velocity) / dt_s);
        let jerk = ((acceleration - next.acceleration) / dt_s).round();

        next.last_velocity = next.velocity;
        next.velocity = velocity;
        next.acceleration = acceleration;
        next.jerk = jerk;

        if next.velocity_history.len() == VELOCITY_HISTORY_LEN {
            next.velocity_history.remove(0);
        }
        next.velocity_history.push(velocity);
        next.entropy =
            (variance(&next.velocity_history) / thresholds::ENTROPY_NORMALIZER).min(1.0);

        let dx_sign = sign(dx);
        let dy_sign = sign(dy);
        if (dx_sign != 0 && next.last_dx_sign != 0 && dx_sign != next.last_dx_sign)
            || (dy_sign != 0 && next.last_dy_sign != 0 && dy_sign != next.last_dy_sign)
        {
            next.direction_changes += 1;
        }
        if dx.abs() > thresholds::BACK_FORTH_DX
            && dx_sign != 0
            && next.last_dx_sign != 0
            && dx_sign != next.last_dx_sign
        {
            next.back_forth_count += 1;
        }
        if dx_sign != 0 {
            next.last_dx_sign = dx_sign;
        }
        if dy_sign != 0 {
            next.last_dy_sign = dy_sign;
        }

        next.mouse_recoil =
            velocity > thresholds::RECOIL_VELOCITY && dy < thresholds::RECOIL_DY;
        next.slow_read =
            velocity > thresholds::SLOW_READ_MIN && velocity < thresholds::SLOW_READ_MAX;
        next.positive_acceleration = acceleration > thresholds::POSITIVE_ACCEL_MIN
            && acceleration < thresholds::POSITIVE_ACCEL_MAX
            && velocity < thresholds::POSITIVE_ACCEL_VELOCITY_CAP;
        next.oscillating = next.back_forth_count >= thresholds::OSCILLATION_COUNT;
        if event.event_type == EventType::Scroll {
            next.auto_scroll = velocity > thresholds::AUTO_SCROLL_VELOCITY
                && acceleration.abs() < thresholds::AUTO_SCROLL_ACCEL_BAND;
        }

        next.x = x;
        next.y = y;
        next.scroll_y = scroll_y;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::{DateTime, TimeZone, Utc};
    use pulseiq_identifiers::{SessionId, TenantId};
    use pulseiq_models::Motion;

    use super::*;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn motion_event(ms: i64, x: f64, y: f64) -> TelemetryEvent {
        TelemetryEvent {
            session_id: SessionId::new("s1"),
            tenant_id: TenantId::new("t1"),
            ts: ts(ms),
            event_type: EventType::MouseMove,
            target: None,
            context: None,
            section: None,
            motion: Some(Motion {
                x,
                y,
                scroll_y: 0.0,
            }),
            interactions: None,
            duration_ms: None,
        }
    }

    fn bare_event(ms: i64, event_type: EventType) -> TelemetryEvent {
        TelemetryEvent {
            session_id: SessionId::new("s1"),
            tenant_id: TenantId::new("t1"),
            ts: ts(ms),
            event_type,
            target: None,
            context: None,
            section: None,
            motion: None,
            interactions: None,
            duration_ms: None,
        }
    }

    #[test]
    fn first_motion_event_sets_position_without_velocity() {
        let physics = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 100.0, 200.0));
        assert_eq!(physics.x, 100.0);
        assert_eq!(physics.y, 200.0);
        assert_eq!(physics.velocity, 0.0);
        assert!(physics.velocity_history.is_empty());
    }

    #[test]
    fn velocity_is_distance_over_elapsed_time() {
        let p0 = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 0.0, 0.0));
        // 300 px in 500 ms → 600 px/s.
        let p1 = PhysicsEngine::update(&p0, &motion_event(500, 300.0, 0.0));
        assert_eq!(p1.velocity, 600.0);
        assert_eq!(p1.last_velocity, 0.0);
        assert_eq!(p1.velocity_history, vec![600.0]);
    }

    #[test]
    fn update_is_deterministic_bit_for_bit() {
        let events: Vec<TelemetryEvent> = (1..=20)
            .map(|i| motion_event(i * 50, (i * 37) as f64 % 800.0, (i * 91) as f64 % 600.0))
            .collect();

        let replay = |events: &[TelemetryEvent]| {
            let mut physics = SessionPhysics::default();
            for event in events {
                physics = PhysicsEngine::update(&physics, event);
            }
            physics
        };

        let a = replay(&events);
        let b = replay(&events);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn gap_over_two_seconds_resets_kinematics() {
        let p0 = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 0.0, 0.0));
        let p1 = PhysicsEngine::update(&p0, &motion_event(400, 400.0, 0.0));
        assert!(p1.velocity > 0.0);

        let p2 = PhysicsEngine::update(&p1, &motion_event(3_000, 500.0, 100.0));
        assert_eq!(p2.velocity, 0.0);
        assert_eq!(p2.acceleration, 0.0);
        assert_eq!(p2.jerk, 0.0);
        assert!(p2.velocity_history.is_empty());
        assert_eq!(p2.x, 500.0);
    }

    #[test]
    fn tiny_dt_is_clamped_to_ten_milliseconds() {
        let p0 = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 0.0, 0.0));
        // 2 ms raw dt clamps to 10 ms: 50 px / 0.01 s = 5000 px/s.
        let p1 = PhysicsEngine::update(&p0, &motion_event(2, 50.0, 0.0));
        assert_eq!(p1.velocity, 5_000.0);
    }

    #[test]
    fn recoil_requires_fast_upward_jump() {
        let p0 = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 100.0, 400.0));
        // 60 px up in 80 ms → 750 px/s with dy = -60.
        let p1 = PhysicsEngine::update(&p0, &motion_event(80, 100.0, 340.0));
        assert!(p1.mouse_recoil, "velocity {} dy -60", p1.velocity);

        // Same speed moving down is not recoil.
        let p2 = PhysicsEngine::update(&p1, &motion_event(160, 100.0, 400.0));
        assert!(!p2.mouse_recoil);
    }

    #[test]
    fn slow_read_band_sets_flag() {
        let p0 = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 0.0, 0.0));
        // 30 px in 600 ms → 50 px/s.
        let p1 = PhysicsEngine::update(&p0, &motion_event(600, 30.0, 0.0));
        assert!(p1.slow_read);
    }

    #[test]
    fn direction_changes_count_sign_flips() {
        let mut physics = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 0.0, 0.0));
        let path = [(100, 200.0), (200, 50.0), (300, 250.0), (400, 100.0)];
        for (ms, x) in path {
            physics = PhysicsEngine::update(&physics, &motion_event(ms, x, 0.0));
        }
        // Flips at 200, 300, 400.
        assert_eq!(physics.direction_changes, 3);
        assert_eq!(physics.back_forth_count, 3);
        assert!(physics.oscillating);
    }

    #[test]
    fn small_jitter_does_not_count_as_back_forth() {
        let mut physics = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 0.0, 0.0));
        for (ms, x) in [(100, 50.0), (200, 20.0), (300, 60.0)] {
            physics = PhysicsEngine::update(&physics, &motion_event(ms, x, 0.0));
        }
        assert!(physics.direction_changes >= 2);
        assert_eq!(physics.back_forth_count, 0);
    }

    #[test]
    fn velocity_history_is_a_bounded_ring() {
        let mut physics = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 0.0, 0.0));
        for i in 1..=15 {
            physics = PhysicsEngine::update(&physics, &motion_event(i * 100, (i * 40) as f64, 0.0));
        }
        assert_eq!(physics.velocity_history.len(), VELOCITY_HISTORY_LEN);
    }

    #[test]
    fn entropy_stays_in_unit_interval() {
        let mut physics = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 0.0, 0.0));
        // Wildly alternating speeds.
        for (i, x) in [2_000.0, 0.0, 1_800.0, 10.0, 1_500.0, 5.0].iter().enumerate() {
            physics = PhysicsEngine::update(
                &physics,
                &motion_event((i as i64 + 1) * 100, *x, 0.0),
            );
        }
        assert!(physics.entropy > 0.0);
        assert!(physics.entropy <= 1.0);
    }

    #[test]
    fn hover_events_accumulate_counters() {
        let physics = SessionPhysics {
            section: Section::Pricing,
            section_start_time: Some(ts(0)),
            ..SessionPhysics::default()
        };

        let started = PhysicsEngine::update(&physics, &bare_event(100, EventType::HoverStart));
        assert_eq!(started.hover_count, 1);
        assert!(started.hovering_pricing);

        let mut end = bare_event(1_400, EventType::HoverEnd);
        end.duration_ms = Some(1_300);
        let ended = PhysicsEngine::update(&started, &end);
        assert_eq!(ended.hover_duration_ms, 1_300);
        assert!(!ended.hovering_pricing);
    }

    #[test]
    fn mouse_exit_and_return_toggle_presence() {
        let gone = PhysicsEngine::update(&SessionPhysics::default(), &bare_event(0, EventType::MouseExit));
        assert!(gone.mouse_gone);
        let back = PhysicsEngine::update(&gone, &bare_event(100, EventType::MouseReturn));
        assert!(!back.mouse_gone);
    }

    #[test]
    fn section_change_resets_dwell_clock() {
        let mut enter = bare_event(0, EventType::SectionEnter);
        enter.section = Some(Section::Pricing);
        let p0 = PhysicsEngine::update(&SessionPhysics::default(), &enter);
        assert_eq!(p0.section, Section::Pricing);
        assert_eq!(p0.time_in_section_ms, 0);

        let p1 = PhysicsEngine::update(&p0, &bare_event(1_500, EventType::Click));
        assert_eq!(p1.time_in_section_ms, 1_500);

        let mut leave = bare_event(2_000, EventType::SectionEnter);
        leave.section = Some(Section::Demo);
        let p2 = PhysicsEngine::update(&p1, &leave);
        assert_eq!(p2.section, Section::Demo);
        assert_eq!(p2.time_in_section_ms, 0);
    }

    #[test]
    fn non_finite_motion_resets_instead_of_poisoning() {
        let p0 = PhysicsEngine::update(&SessionPhysics::default(), &motion_event(0, 0.0, 0.0));
        let p1 = PhysicsEngine::update(&p0, &motion_event(100, 300.0, 0.0));
        assert!(p1.velocity > 0.0);

        let poisoned = PhysicsEngine::update(&p1, &motion_event(200, f64::NAN, 50.0));
        assert_eq!(poisoned.velocity, 0.0);
        assert!(!poisoned.velocity.is_nan());
    }

    #[test]
    fn sticker_shock_kinematics_from_the_pricing_scenario() {
        // Hover ends at (400, 360); 1200 ms later the pointer has jumped
        // 60 px straight up in ~80 ms of motion.
        let physics = SessionPhysics {
            section: Section::Pricing,
            section_start_time: Some(ts(0)),
            ..SessionPhysics::default()
        };

        let p0 = PhysicsEngine::update(&physics, &motion_event(1_120, 400.0, 360.0));
        let p1 = PhysicsEngine::update(&p0, &motion_event(1_200, 400.0, 300.0));
        assert!(p1.velocity > 600.0);
        assert!(p1.mouse_recoil);
        assert!(p1.acceleration > 500.0);
    }
}
