use chrono::{DateTime, Utc};

use crate::shared_data::LogEntry;
use crate::simulation_engine::devices::DeviceStatus;
use crate::simulation_engine::intersections::Intersection;
use crate::simulation_engine::random::TickRandom;
use crate::simulation_engine::signal_state_machine::{
    advance_default, apply_controller_fallback, apply_emergency_override,
};
use crate::simulation_engine::zone_protocol::{apply_lockdown, apply_vip_priority, ZoneMode};

/// The rule that drives an intersection for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRule {
    Lockdown,
    VipPriority,
    EmergencyOverride,
    ControllerFallback,
    Default,
}

/// Guards are evaluated in this order; the first match wins.
pub const PRECEDENCE: [ControlRule; 5] = [
    ControlRule::Lockdown,
    ControlRule::VipPriority,
    ControlRule::EmergencyOverride,
    ControlRule::ControllerFallback,
    ControlRule::Default,
];

/// Inputs the guards look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub intersection: &'a Intersection,
    pub zone_mode: ZoneMode,
    /// Status of the intersection's controller, if it has one.
    pub controller_status: Option<DeviceStatus>,
}

impl ControlRule {
    pub fn matches(self, ctx: &RuleContext) -> bool {
        match self {
            ControlRule::Lockdown => ctx.zone_mode == ZoneMode::Lockdown,
            ControlRule::VipPriority => ctx.zone_mode == ZoneMode::Vip && ctx.intersection.is_hub,
            ControlRule::EmergencyOverride => ctx.intersection.is_emergency_override,
            ControlRule::ControllerFallback => {
                ctx.controller_status == Some(DeviceStatus::Offline)
            }
            ControlRule::Default => true,
        }
    }

    pub fn resolve(ctx: &RuleContext) -> ControlRule {
        PRECEDENCE
            .iter()
            .copied()
            .find(|rule| rule.matches(ctx))
            .unwrap_or(ControlRule::Default)
    }

    pub fn apply<R: TickRandom + ?Sized>(
        self,
        intersection: &Intersection,
        now: DateTime<Utc>,
        rng: &mut R,
        logs: &mut Vec<LogEntry>,
    ) -> Intersection {
        match self {
            ControlRule::Lockdown => apply_lockdown(intersection),
            ControlRule::VipPriority => apply_vip_priority(intersection),
            ControlRule::EmergencyOverride => apply_emergency_override(intersection),
            ControlRule::ControllerFallback => {
                apply_controller_fallback(intersection, now, rng, logs)
            }
            ControlRule::Default => advance_default(intersection, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::intersections::{GeoPoint, IntersectionId};

    fn intersection(name: &str, emergency: bool) -> Intersection {
        let mut i = Intersection::new(IntersectionId(9), name, "Tokyo, JP", GeoPoint { lat: 35.6, lng: 139.7 });
        i.is_emergency_override = emergency;
        i
    }

    fn resolve(i: &Intersection, zone_mode: ZoneMode, controller: Option<DeviceStatus>) -> ControlRule {
        ControlRule::resolve(&RuleContext {
            intersection: i,
            zone_mode,
            controller_status: controller,
        })
    }

    #[test]
    fn lockdown_beats_everything() {
        let hub = intersection("Shibuya Crossing", true);
        assert_eq!(
            resolve(&hub, ZoneMode::Lockdown, Some(DeviceStatus::Offline)),
            ControlRule::Lockdown
        );
    }

    #[test]
    fn vip_only_applies_to_hubs() {
        let hub = intersection("Shibuya Crossing", false);
        let plain = intersection("Omotesando", false);
        assert_eq!(resolve(&hub, ZoneMode::Vip, None), ControlRule::VipPriority);
        assert_eq!(resolve(&plain, ZoneMode::Vip, None), ControlRule::Default);
        assert_eq!(resolve(&hub, ZoneMode::Normal, None), ControlRule::Default);
    }

    #[test]
    fn emergency_beats_controller_loss() {
        let i = intersection("Omotesando", true);
        assert_eq!(
            resolve(&i, ZoneMode::Vip, Some(DeviceStatus::Offline)),
            ControlRule::EmergencyOverride
        );
    }

    #[test]
    fn only_an_offline_controller_triggers_fallback() {
        let i = intersection("Omotesando", false);
        assert_eq!(
            resolve(&i, ZoneMode::Normal, Some(DeviceStatus::Offline)),
            ControlRule::ControllerFallback
        );
        assert_eq!(
            resolve(&i, ZoneMode::Normal, Some(DeviceStatus::Maintenance)),
            ControlRule::Default
        );
        assert_eq!(resolve(&i, ZoneMode::Normal, None), ControlRule::Default);
    }

    #[test]
    fn precedence_ends_with_catch_all() {
        assert_eq!(PRECEDENCE.last(), Some(&ControlRule::Default));
    }
}
