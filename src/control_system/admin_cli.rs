use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{stdin, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use crate::control_system::traffic_control_center::{run_reboot_sequence, TrafficControlCenter};
use crate::error::ControlError;
use crate::shared_data::current_timestamp;
use crate::simulation_engine::devices::DeviceId;
use crate::simulation_engine::intersections::IntersectionId;
use crate::simulation_engine::zone_protocol::ZoneMode;

/// Operator commands accepted on stdin while the simulation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Zone(ZoneMode),
    Emergency(IntersectionId),
    Reboot(DeviceId),
    Stats,
    Logs,
    Help,
    Quit,
}

impl FromStr for AdminCommand {
    type Err = ControlError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();
        match (verb.as_str(), arg) {
            ("zone", Some(mode)) => Ok(AdminCommand::Zone(mode.parse()?)),
            ("emergency", Some(id)) => Ok(AdminCommand::Emergency(id.parse()?)),
            ("reboot", Some(id)) => Ok(AdminCommand::Reboot(id.parse()?)),
            ("stats", None) => Ok(AdminCommand::Stats),
            ("logs", None) => Ok(AdminCommand::Logs),
            ("help", None) => Ok(AdminCommand::Help),
            ("quit", None) | ("exit", None) => Ok(AdminCommand::Quit),
            _ => Err(ControlError::Parse(format!("unrecognised command: {:?}", line.trim()))),
        }
    }
}

const HELP: &str = "Commands:
  zone <NORMAL|VIP|LOCKDOWN>   switch the zone protocol
  emergency <INT-n>            toggle the emergency override
  reboot <DEV-...>             reboot a device
  stats                        show current statistics
  logs                         show the recent event log
  quit                         stop the simulation";

/// Applies one command to the control center. Returns `false` on quit.
pub async fn execute(
    center: &Arc<Mutex<TrafficControlCenter>>,
    command: AdminCommand,
    reboot_delay: Duration,
) -> Result<bool, ControlError> {
    match command {
        AdminCommand::Zone(mode) => {
            center.lock().await.set_zone_mode(mode, current_timestamp());
        }
        AdminCommand::Emergency(id) => {
            let enabled = center
                .lock()
                .await
                .toggle_emergency_override(id, current_timestamp())?;
            println!("Emergency override for {} is now {}", id, if enabled { "ON" } else { "OFF" });
        }
        AdminCommand::Reboot(device_id) => {
            // fail fast on unknown ids before going async
            if !center.lock().await.snapshot().devices.iter().any(|d| d.id == device_id) {
                return Err(ControlError::UnknownDevice(device_id));
            }
            let center = Arc::clone(center);
            tokio::spawn(async move {
                if let Err(e) = run_reboot_sequence(center, device_id, reboot_delay).await {
                    log::warn!("Reboot of {} failed: {}", device_id, e);
                }
            });
        }
        AdminCommand::Stats => {
            let guard = center.lock().await;
            let stats = guard.stats();
            println!(
                "Cars: {} | Congestion: {}% | Alerts: {} | CO2: {} ppm | Health: {}% | Zone: {}",
                stats.total_cars,
                stats.average_congestion,
                stats.active_alerts,
                stats.avg_co2,
                stats.system_health,
                stats.zone_mode
            );
        }
        AdminCommand::Logs => {
            let guard = center.lock().await;
            for entry in guard.logs() {
                println!(
                    "{} [{}] {:?}: {}",
                    entry.timestamp.format("%H:%M:%S"),
                    entry.source,
                    entry.severity,
                    entry.message
                );
            }
        }
        AdminCommand::Help => println!("{}", HELP),
        AdminCommand::Quit => return Ok(false),
    }
    Ok(true)
}

/// Reads operator commands from stdin. Returns `true` when the operator
/// asked to quit and `false` when input ended without a `quit`.
pub async fn run_cli(center: Arc<Mutex<TrafficControlCenter>>, reboot_delay: Duration) -> bool {
    println!("{}", HELP);
    run_console(center, BufReader::new(stdin()), reboot_delay).await
}

/// Applies commands read line by line from `input`. Same return value as
/// [`run_cli`].
pub async fn run_console<R: AsyncBufRead + Unpin>(
    center: Arc<Mutex<TrafficControlCenter>>,
    input: R,
    reboot_delay: Duration,
) -> bool {
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                log::info!("Admin input closed; console disabled");
                return false;
            }
            Err(e) => {
                log::warn!("Failed to read admin input: {}", e);
                return false;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let outcome = match line.parse::<AdminCommand>() {
            Ok(command) => execute(&center, command, reboot_delay).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(true) => {}
            Ok(false) => {
                println!("Exiting CLI.");
                return true;
            }
            Err(e) => println!("Error: {}", e),
        }
    }
}
