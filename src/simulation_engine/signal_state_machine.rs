use chrono::{DateTime, Utc};

use crate::global_variables::{
    CO2_FALL, CO2_MAX, CO2_MIN, CO2_RISE, CO2_RISE_FLOW_THRESHOLD, CRITICAL_USAGE,
    EMERGENCY_FLOW_RELIEF, EMERGENCY_GRACE_TIMER, EMERGENCY_HOLD_TIMER,
    EMERGENCY_MODERATE_FLOW, FALLBACK_WARNING_PROBABILITY, GREEN_DURATION,
    GREEN_DURATION_LOADED, GREEN_LOADED_USAGE, HIGH_USAGE, MODERATE_USAGE, RED_DURATION,
    RED_DURATION_LOADED, RED_LOADED_USAGE, YELLOW_DURATION,
};
use crate::shared_data::{LogEntry, LogSource, Severity};
use crate::simulation_engine::intersections::{
    CongestionLevel, Environment, Intersection, SignalState,
};
use crate::simulation_engine::random::TickRandom;

/// Classifies flow / capacity usage.
pub fn classify_congestion(usage: f64) -> CongestionLevel {
    if usage > CRITICAL_USAGE {
        CongestionLevel::Critical
    } else if usage > HIGH_USAGE {
        CongestionLevel::High
    } else if usage > MODERATE_USAGE {
        CongestionLevel::Moderate
    } else {
        CongestionLevel::Low
    }
}

/// The phase that follows `state` once its timer runs out, with the new timer.
/// Always cycles GREEN -> YELLOW -> RED -> GREEN.
pub fn next_phase(state: SignalState, usage: f64) -> (SignalState, u32) {
    match state {
        SignalState::Green => (SignalState::Yellow, YELLOW_DURATION),
        SignalState::Yellow => {
            let red = if usage > RED_LOADED_USAGE {
                RED_DURATION_LOADED
            } else {
                RED_DURATION
            };
            (SignalState::Red, red)
        }
        SignalState::Red => {
            let green = if usage > GREEN_LOADED_USAGE {
                GREEN_DURATION_LOADED
            } else {
                GREEN_DURATION
            };
            (SignalState::Green, green)
        }
    }
}

/// Priority clearing for an emergency route. Never leaves GREEN while active.
/// A light that was not yet green gets a short grace timer before locking.
pub fn apply_emergency_override(intersection: &Intersection) -> Intersection {
    let signal_timer = if intersection.signal_state == SignalState::Green {
        EMERGENCY_HOLD_TIMER
    } else {
        EMERGENCY_GRACE_TIMER
    };
    // classified on the flow seen before relief
    let congestion_level = if intersection.current_flow > EMERGENCY_MODERATE_FLOW {
        CongestionLevel::Moderate
    } else {
        CongestionLevel::Low
    };
    Intersection {
        signal_state: SignalState::Green,
        signal_timer,
        current_flow: intersection.current_flow.saturating_sub(EMERGENCY_FLOW_RELIEF),
        congestion_level,
        ..intersection.clone()
    }
}

/// Local blinking-caution fallback used while the controller is unreachable.
/// The timer is left untouched.
pub fn apply_controller_fallback<R: TickRandom + ?Sized>(
    intersection: &Intersection,
    now: DateTime<Utc>,
    rng: &mut R,
    logs: &mut Vec<LogEntry>,
) -> Intersection {
    if rng.chance(FALLBACK_WARNING_PROBABILITY) {
        logs.push(LogEntry::new(
            rng.entry_id(),
            now,
            LogSource::AiCore,
            Severity::Warn,
            format!(
                "Lost contact with {}. Switching to local fallback.",
                intersection.name
            ),
        ));
    }
    Intersection {
        signal_state: SignalState::Yellow,
        congestion_level: CongestionLevel::High,
        ..intersection.clone()
    }
}

/// Default timer-driven step: perturb flow, drift CO2, reclassify congestion
/// and count the signal timer down, switching phase when it expires.
pub fn advance_default<R: TickRandom + ?Sized>(
    intersection: &Intersection,
    rng: &mut R,
) -> Intersection {
    let step = rng.flow_step();
    let ceiling = intersection.flow_ceiling() as i64;
    let current_flow = (intersection.current_flow as i64 + step as i64).clamp(0, ceiling) as u32;

    let co2_level = if current_flow > CO2_RISE_FLOW_THRESHOLD {
        intersection.environment.co2_level.saturating_add(CO2_RISE)
    } else {
        intersection.environment.co2_level.saturating_sub(CO2_FALL)
    }
    .clamp(CO2_MIN, CO2_MAX);

    let usage = if intersection.capacity == 0 {
        0.0
    } else {
        current_flow as f64 / intersection.capacity as f64
    };

    let mut signal_state = intersection.signal_state;
    let mut signal_timer = intersection.signal_timer.saturating_sub(1);
    if signal_timer == 0 {
        (signal_state, signal_timer) = next_phase(signal_state, usage);
    }

    Intersection {
        current_flow,
        congestion_level: classify_congestion(usage),
        signal_state,
        signal_timer,
        environment: Environment {
            co2_level,
            ..intersection.environment.clone()
        },
        ..intersection.clone()
    }
}
