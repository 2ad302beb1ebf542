use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ControlError;
use crate::simulation_engine::intersections::{Intersection, IntersectionId};

/// Kinds of IoT hardware bundled with each intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Camera,
    InductiveLoop,
    EnvSensor,
    Controller,
}

impl DeviceType {
    /// Battery-powered hardware reports a battery level.
    pub fn is_battery_powered(self) -> bool {
        matches!(self, DeviceType::InductiveLoop | DeviceType::EnvSensor)
    }

    fn id_prefix(self) -> &'static str {
        match self {
            DeviceType::Controller => "CTL",
            DeviceType::Camera => "CAM",
            DeviceType::InductiveLoop => "SENS-A",
            DeviceType::EnvSensor => "ENV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Online,
    Offline,
    Maintenance,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            DeviceStatus::Online => "ONLINE",
            DeviceStatus::Offline => "OFFLINE",
            DeviceStatus::Maintenance => "MAINTENANCE",
        };
        write!(f, "{}", label)
    }
}

/// Device identity, derived from its type and owning intersection.
/// Rendered as e.g. `DEV-CTL-INT-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId {
    pub device_type: DeviceType,
    pub intersection_id: IntersectionId,
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DEV-{}-{}",
            self.device_type.id_prefix(),
            self.intersection_id
        )
    }
}

impl FromStr for DeviceId {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ControlError::Parse(format!("not a device id: {:?}", s));
        let rest = s.trim().strip_prefix("DEV-").ok_or_else(invalid)?;
        // SENS-A contains a dash, so match whole prefixes
        let (device_type, intersection) = [
            DeviceType::Controller,
            DeviceType::Camera,
            DeviceType::InductiveLoop,
            DeviceType::EnvSensor,
        ]
        .into_iter()
        .find_map(|t| {
            rest.strip_prefix(t.id_prefix())
                .and_then(|r| r.strip_prefix('-'))
                .map(|r| (t, r))
        })
        .ok_or_else(invalid)?;
        Ok(DeviceId {
            device_type,
            intersection_id: intersection.parse()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoTDevice {
    pub id: DeviceId,
    pub device_type: DeviceType,
    pub status: DeviceStatus,
    pub intersection_id: IntersectionId,
    /// Percentage; only present for battery-powered hardware and never increases.
    pub battery_level: Option<u8>,
    /// Informational round-trip time in milliseconds.
    pub latency_ms: u32,
    pub last_ping: DateTime<Utc>,
}

impl IoTDevice {
    pub fn new(
        device_type: DeviceType,
        intersection_id: IntersectionId,
        latency_ms: u32,
        battery_level: Option<u8>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DeviceId {
                device_type,
                intersection_id,
            },
            device_type,
            status: DeviceStatus::Online,
            intersection_id,
            battery_level: battery_level.map(|level| level.min(100)),
            latency_ms,
            last_ping: now,
        }
    }

    pub fn tracks_battery(&self) -> bool {
        self.battery_level.is_some()
    }
}

/// Creates the fixed four-device bundle for every intersection:
/// one controller, one camera, one inductive loop and one environment sensor.
pub fn create_devices<R: Rng + ?Sized>(
    intersections: &[Intersection],
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<IoTDevice> {
    let mut devices = Vec::with_capacity(intersections.len() * 4);
    for intersection in intersections {
        let id = intersection.id;
        devices.push(IoTDevice::new(
            DeviceType::Controller,
            id,
            rng.random_range(10..60),
            None,
            now,
        ));
        devices.push(IoTDevice::new(
            DeviceType::Camera,
            id,
            rng.random_range(20..120),
            None,
            now,
        ));
        devices.push(IoTDevice::new(
            DeviceType::InductiveLoop,
            id,
            rng.random_range(5..25),
            Some(rng.random_range(60..100)),
            now,
        ));
        let mut env_sensor = IoTDevice::new(
            DeviceType::EnvSensor,
            id,
            rng.random_range(5..35),
            Some(rng.random_range(0..100)),
            now,
        );
        if rng.random_bool(0.05) {
            env_sensor.status = DeviceStatus::Offline;
        }
        devices.push(env_sensor);
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::intersections::create_intersections;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn device_ids_are_derived_from_type_and_intersection() {
        let id = DeviceId {
            device_type: DeviceType::InductiveLoop,
            intersection_id: IntersectionId(12),
        };
        assert_eq!(id.to_string(), "DEV-SENS-A-INT-12");
        let ctl = DeviceId {
            device_type: DeviceType::Controller,
            intersection_id: IntersectionId(1),
        };
        assert_eq!(ctl.to_string(), "DEV-CTL-INT-1");
    }

    #[test]
    fn device_ids_parse_back() {
        let id: DeviceId = "DEV-SENS-A-INT-12".parse().unwrap();
        assert_eq!(id.device_type, DeviceType::InductiveLoop);
        assert_eq!(id.intersection_id, IntersectionId(12));
        let env: DeviceId = "DEV-ENV-INT-3".parse().unwrap();
        assert_eq!(env.to_string(), "DEV-ENV-INT-3");
        assert!("DEV-XYZ-INT-3".parse::<DeviceId>().is_err());
        assert!("CTL-INT-3".parse::<DeviceId>().is_err());
    }

    #[test]
    fn every_intersection_gets_a_four_device_bundle() {
        let mut rng = StdRng::seed_from_u64(21);
        let now = Utc::now();
        let intersections = create_intersections(&mut rng);
        let devices = create_devices(&intersections, &mut rng, now);
        assert_eq!(devices.len(), intersections.len() * 4);

        for intersection in &intersections {
            let bundle: Vec<_> = devices
                .iter()
                .filter(|d| d.intersection_id == intersection.id)
                .collect();
            let types: Vec<_> = bundle.iter().map(|d| d.device_type).collect();
            assert_eq!(
                types,
                vec![
                    DeviceType::Controller,
                    DeviceType::Camera,
                    DeviceType::InductiveLoop,
                    DeviceType::EnvSensor
                ]
            );
            for device in bundle {
                assert_eq!(device.id.device_type, device.device_type);
                assert_eq!(device.tracks_battery(), device.device_type.is_battery_powered());
                assert_eq!(device.last_ping, now);
            }
        }
    }

    #[test]
    fn only_env_sensors_may_start_offline() {
        let mut rng = StdRng::seed_from_u64(99);
        let intersections = create_intersections(&mut rng);
        let devices = create_devices(&intersections, &mut rng, Utc::now());
        assert!(devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Offline)
            .all(|d| d.device_type == DeviceType::EnvSensor));
        assert!(devices
            .iter()
            .filter(|d| d.device_type == DeviceType::InductiveLoop)
            .all(|d| matches!(d.battery_level, Some(60..=99))));
    }
}
