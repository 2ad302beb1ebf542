use chrono::{DateTime, Utc};

use crate::global_variables::{
    BATTERY_DRAIN_PROBABILITY, BATTERY_DRAIN_STEP, DEVICE_FLIP_PROBABILITY,
};
use crate::shared_data::{LogEntry, LogSource, Severity};
use crate::simulation_engine::devices::{DeviceStatus, IoTDevice};
use crate::simulation_engine::random::TickRandom;

/// Advances the health of every device by one tick.
///
/// ONLINE and OFFLINE devices may swap status with a small probability;
/// MAINTENANCE is left alone. Devices that were ONLINE at the start of the
/// tick and report a battery may lose one percent. Every device gets its
/// `last_ping` refreshed to `now`. Each status flip yields one log entry.
pub fn update_devices<R: TickRandom + ?Sized>(
    devices: &[IoTDevice],
    now: DateTime<Utc>,
    rng: &mut R,
) -> (Vec<IoTDevice>, Vec<LogEntry>) {
    let mut logs = Vec::new();
    let updated = devices
        .iter()
        .map(|device| {
            let next = update_device(device, now, rng);
            if next.status != device.status {
                let severity = match next.status {
                    DeviceStatus::Online => Severity::Success,
                    _ => Severity::Error,
                };
                log::debug!("device {} flipped to {}", next.id, next.status);
                logs.push(LogEntry::new(
                    rng.entry_id(),
                    now,
                    LogSource::IotNetwork,
                    severity,
                    format!("Device {} state changed to {}", next.id, next.status),
                ));
            }
            next
        })
        .collect();
    (updated, logs)
}

fn update_device<R: TickRandom + ?Sized>(
    device: &IoTDevice,
    now: DateTime<Utc>,
    rng: &mut R,
) -> IoTDevice {
    let was_online = device.status == DeviceStatus::Online;
    let status = match device.status {
        DeviceStatus::Online if rng.chance(DEVICE_FLIP_PROBABILITY) => DeviceStatus::Offline,
        DeviceStatus::Offline if rng.chance(DEVICE_FLIP_PROBABILITY) => DeviceStatus::Online,
        other => other,
    };

    let battery_level = match device.battery_level {
        Some(level) if was_online && rng.chance(BATTERY_DRAIN_PROBABILITY) => {
            Some(level.saturating_sub(BATTERY_DRAIN_STEP))
        }
        other => other,
    };

    IoTDevice {
        status,
        battery_level,
        last_ping: now,
        ..device.clone()
    }
}
