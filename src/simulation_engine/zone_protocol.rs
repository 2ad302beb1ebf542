use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ControlError;
use crate::global_variables::{
    LOCKDOWN_FLOW_RELIEF, LOCKDOWN_TIMER, VIP_FLOW_RELIEF, VIP_GREEN_TIMER,
};
use crate::simulation_engine::intersections::{CongestionLevel, Intersection, SignalState};

/// Process-wide administrative mode, supplied by the caller on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneMode {
    #[default]
    Normal,
    Vip,
    Lockdown,
}

impl fmt::Display for ZoneMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            ZoneMode::Normal => "NORMAL",
            ZoneMode::Vip => "VIP",
            ZoneMode::Lockdown => "LOCKDOWN",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for ZoneMode {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(ZoneMode::Normal),
            "VIP" => Ok(ZoneMode::Vip),
            "LOCKDOWN" => Ok(ZoneMode::Lockdown),
            _ => Err(ControlError::Parse(format!("unknown zone mode: {:?}", s))),
        }
    }
}

/// Freezes the intersection on RED and lets queued traffic drain.
pub fn apply_lockdown(intersection: &Intersection) -> Intersection {
    Intersection {
        signal_state: SignalState::Red,
        signal_timer: LOCKDOWN_TIMER,
        congestion_level: CongestionLevel::Low,
        current_flow: intersection.current_flow.saturating_sub(LOCKDOWN_FLOW_RELIEF),
        ..intersection.clone()
    }
}

/// Holds a hub on GREEN for a VIP motorcade and marks it as overridden.
/// The override flag stays set after the zone returns to NORMAL.
pub fn apply_vip_priority(intersection: &Intersection) -> Intersection {
    Intersection {
        signal_state: SignalState::Green,
        signal_timer: VIP_GREEN_TIMER,
        current_flow: intersection.current_flow.saturating_sub(VIP_FLOW_RELIEF),
        is_emergency_override: true,
        ..intersection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::intersections::{GeoPoint, IntersectionId};

    fn junction(flow: u32) -> Intersection {
        let mut i = Intersection::new(
            IntersectionId(4),
            "Silk Board Junction",
            "Bangalore, IN",
            GeoPoint { lat: 12.9, lng: 77.6 },
        );
        i.current_flow = flow;
        i.signal_state = SignalState::Green;
        i.signal_timer = 17;
        i.congestion_level = CongestionLevel::High;
        i
    }

    #[test]
    fn lockdown_freezes_red_and_drains() {
        let next = apply_lockdown(&junction(40));
        assert_eq!(next.signal_state, SignalState::Red);
        assert_eq!(next.signal_timer, 999);
        assert_eq!(next.current_flow, 35);
        assert_eq!(next.congestion_level, CongestionLevel::Low);
    }

    #[test]
    fn lockdown_flow_floors_at_zero() {
        assert_eq!(apply_lockdown(&junction(3)).current_flow, 0);
    }

    #[test]
    fn vip_priority_forces_green_and_sets_override() {
        let before = junction(50);
        let next = apply_vip_priority(&before);
        assert_eq!(next.signal_state, SignalState::Green);
        assert_eq!(next.signal_timer, 60);
        assert_eq!(next.current_flow, 40);
        assert!(next.is_emergency_override);
        // congestion is left as it was
        assert_eq!(next.congestion_level, before.congestion_level);
        assert_eq!(apply_vip_priority(&junction(4)).current_flow, 0);
    }

    #[test]
    fn zone_mode_labels() {
        assert_eq!(ZoneMode::default(), ZoneMode::Normal);
        assert_eq!(ZoneMode::Lockdown.to_string(), "LOCKDOWN");
        assert_eq!(serde_json::to_string(&ZoneMode::Vip).unwrap(), "\"VIP\"");
        assert_eq!("lockdown".parse::<ZoneMode>(), Ok(ZoneMode::Lockdown));
        assert!("panic".parse::<ZoneMode>().is_err());
    }
}
