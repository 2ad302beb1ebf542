// simulation.rs
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared_data::LogEntry;
use crate::simulation_engine::control_rules::{ControlRule, RuleContext};
use crate::simulation_engine::device_health::update_devices;
use crate::simulation_engine::devices::{create_devices, DeviceStatus, DeviceType, IoTDevice};
use crate::simulation_engine::intersections::{create_intersections, Intersection, IntersectionId};
use crate::simulation_engine::random::TickRandom;
use crate::simulation_engine::zone_protocol::ZoneMode;

/// One consistent view of the whole network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub intersections: Vec<Intersection>,
    pub devices: Vec<IoTDevice>,
}

impl NetworkSnapshot {
    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.intersections.iter().find(|i| i.id == id)
    }

    pub fn devices_at(&self, id: IntersectionId) -> impl Iterator<Item = &IoTDevice> {
        self.devices.iter().filter(move |d| d.intersection_id == id)
    }

    pub fn into_parts(self) -> (Vec<Intersection>, Vec<IoTDevice>) {
        (self.intersections, self.devices)
    }
}

/// Result of a single tick: the next snapshot plus the transitions it logged,
/// device entries first.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub intersections: Vec<Intersection>,
    pub devices: Vec<IoTDevice>,
    pub logs: Vec<LogEntry>,
}

impl TickOutcome {
    pub fn into_snapshot(self) -> (NetworkSnapshot, Vec<LogEntry>) {
        (
            NetworkSnapshot {
                intersections: self.intersections,
                devices: self.devices,
            },
            self.logs,
        )
    }
}

/// Builds the fixed city network with its device bundles.
pub fn initialize_network<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> NetworkSnapshot {
    let intersections = create_intersections(rng);
    let devices = create_devices(&intersections, rng, now);
    log::info!(
        "Initialized network with {} intersections and {} devices",
        intersections.len(),
        devices.len()
    );
    NetworkSnapshot {
        intersections,
        devices,
    }
}

/// Advances every device and intersection by one step.
///
/// Devices are updated first; intersections then check their controller in
/// the updated device list. Inputs are never modified.
pub fn tick<R: TickRandom + ?Sized>(
    intersections: &[Intersection],
    devices: &[IoTDevice],
    zone_mode: ZoneMode,
    now: DateTime<Utc>,
    rng: &mut R,
) -> TickOutcome {
    let (devices, mut logs) = update_devices(devices, now, rng);

    let controllers: HashMap<IntersectionId, DeviceStatus> = devices
        .iter()
        .filter(|d| d.device_type == DeviceType::Controller)
        .map(|d| (d.intersection_id, d.status))
        .collect();

    let intersections = intersections
        .iter()
        .map(|intersection| {
            let ctx = RuleContext {
                intersection,
                zone_mode,
                controller_status: controllers.get(&intersection.id).copied(),
            };
            let rule = ControlRule::resolve(&ctx);
            rule.apply(intersection, now, rng, &mut logs)
        })
        .collect();

    log::debug!("tick at {} in {} mode produced {} log entries", now, zone_mode, logs.len());

    TickOutcome {
        intersections,
        devices,
        logs,
    }
}

/// Convenience wrapper over [`tick`] for a whole snapshot.
pub fn advance<R: TickRandom + ?Sized>(
    snapshot: &NetworkSnapshot,
    zone_mode: ZoneMode,
    now: DateTime<Utc>,
    rng: &mut R,
) -> (NetworkSnapshot, Vec<LogEntry>) {
    tick(&snapshot.intersections, &snapshot.devices, zone_mode, now, rng).into_snapshot()
}
