use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{self, sleep, MissedTickBehavior};

use crate::config::SimulationConfig;
use crate::error::ControlError;
use crate::flow_analyzer::CongestionHistory;
use crate::global_variables::REBOOT_BASELINE_LATENCY_MS;
use crate::monitoring::traffic_monitoring_system::{export_log_entries, export_stats};
use crate::shared_data::{current_timestamp, LogEntry, LogSource, Severity};
use crate::simulation_engine::devices::{DeviceId, DeviceStatus};
use crate::simulation_engine::intersections::IntersectionId;
use crate::simulation_engine::random::{SimRng, TickRandom};
use crate::simulation_engine::{advance, compute_stats, initialize_network};
use crate::simulation_engine::{NetworkSnapshot, TrafficStats, ZoneMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingReboot {
    device_id: DeviceId,
    due: DateTime<Utc>,
}

/// Owns the live network snapshot and is the only place it changes.
///
/// Ticks swap in a fresh `Arc<NetworkSnapshot>`, so a renderer holding the
/// previous one keeps a consistent view. Administrative edits are applied
/// between ticks through the same owner.
pub struct TrafficControlCenter {
    snapshot: Arc<NetworkSnapshot>,
    zone_mode: ZoneMode,
    rng: SimRng,
    seed: u64,
    logs: VecDeque<LogEntry>,
    log_window: usize,
    stats: TrafficStats,
    history: CongestionHistory,
    pending_reboots: Vec<PendingReboot>,
    reboot_delay: TimeDelta,
    ticks: u64,
    /// Entries logged since the last CSV export; only kept when exporting.
    unexported: Vec<LogEntry>,
    exporting: bool,
}

impl TrafficControlCenter {
    /// Seeds the RNG from the config (or OS entropy) and builds the city network.
    pub fn new(config: &SimulationConfig, now: DateTime<Utc>) -> Self {
        let (mut rng, seed) = match config.seed {
            Some(seed) => (SimRng::from_seed_u64(seed), seed),
            None => SimRng::from_entropy(),
        };
        log::info!("Simulation seed: {}", seed);
        let snapshot = initialize_network(&mut rng.0, now);
        Self::assemble(snapshot, rng, seed, config, now)
    }

    /// Takes over an existing snapshot instead of building the default network.
    pub fn with_snapshot(
        snapshot: NetworkSnapshot,
        config: &SimulationConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let (rng, seed) = match config.seed {
            Some(seed) => (SimRng::from_seed_u64(seed), seed),
            None => SimRng::from_entropy(),
        };
        log::info!("Simulation seed: {}", seed);
        Self::assemble(snapshot, rng, seed, config, now)
    }

    fn assemble(
        snapshot: NetworkSnapshot,
        rng: SimRng,
        seed: u64,
        config: &SimulationConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let zone_mode = ZoneMode::default();
        let stats = compute_stats(&snapshot.intersections, zone_mode);
        let mut center = Self {
            snapshot: Arc::new(snapshot),
            zone_mode,
            rng,
            seed,
            logs: VecDeque::with_capacity(config.log_window),
            log_window: config.log_window.max(1),
            stats,
            history: CongestionHistory::new(config.history_capacity, config.prediction_alpha),
            pending_reboots: Vec::new(),
            reboot_delay: TimeDelta::milliseconds(config.reboot_delay_ms as i64),
            ticks: 0,
            unexported: Vec::new(),
            exporting: config.export_dir.is_some(),
        };
        center.record(
            now,
            LogSource::System,
            Severity::Info,
            "ATMS Core Initialized. Connecting to Sensor Network...".to_string(),
        );
        center
    }

    /// Runs one simulation step at `now` and returns every entry it logged.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<LogEntry> {
        let mut emitted = self.complete_due_reboots(now);

        let (next, logs) = advance(&self.snapshot, self.zone_mode, now, &mut self.rng);
        self.snapshot = Arc::new(next);
        for entry in &logs {
            self.push_log(entry.clone());
        }
        emitted.extend(logs);

        self.stats = compute_stats(&self.snapshot.intersections, self.zone_mode);
        self.history.record(now, self.stats.average_congestion);
        self.ticks += 1;
        emitted
    }

    pub fn set_zone_mode(&mut self, mode: ZoneMode, now: DateTime<Utc>) {
        self.zone_mode = mode;
        self.stats = compute_stats(&self.snapshot.intersections, mode);
        self.record(
            now,
            LogSource::AdminProtocol,
            Severity::Warn,
            format!("ZONE MODE SWITCHED TO: {}", mode),
        );
    }

    /// Sets the emergency flag on one intersection. Logs only when it changes.
    pub fn set_emergency_override(
        &mut self,
        id: IntersectionId,
        enabled: bool,
        now: DateTime<Utc>,
    ) -> Result<(), ControlError> {
        let snapshot = Arc::make_mut(&mut self.snapshot);
        let intersection = snapshot
            .intersections
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(ControlError::UnknownIntersection(id))?;
        if intersection.is_emergency_override == enabled {
            return Ok(());
        }
        intersection.is_emergency_override = enabled;
        let name = intersection.name.clone();

        let (label, severity) = if enabled {
            ("ENABLED", Severity::Warn)
        } else {
            ("DISABLED", Severity::Info)
        };
        self.record(
            now,
            LogSource::UserAction,
            severity,
            format!("Emergency Override {} for {}", label, name),
        );
        Ok(())
    }

    /// Flips the emergency flag and returns its new value.
    pub fn toggle_emergency_override(
        &mut self,
        id: IntersectionId,
        now: DateTime<Utc>,
    ) -> Result<bool, ControlError> {
        let current = self
            .snapshot
            .intersection(id)
            .map(|i| i.is_emergency_override)
            .ok_or(ControlError::UnknownIntersection(id))?;
        self.set_emergency_override(id, !current, now)?;
        Ok(!current)
    }

    /// Starts a reboot; the device comes back ONLINE once the reboot delay
    /// has passed. Returns when that will be.
    pub fn request_device_reboot(
        &mut self,
        device_id: DeviceId,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ControlError> {
        if !self.snapshot.devices.iter().any(|d| d.id == device_id) {
            return Err(ControlError::UnknownDevice(device_id));
        }
        self.record(
            now,
            LogSource::Admin,
            Severity::Info,
            format!("Initiating Reboot Sequence for {}...", device_id),
        );
        let due = now + self.reboot_delay;
        self.pending_reboots.push(PendingReboot { device_id, due });
        Ok(due)
    }

    /// Finishes every reboot due at or before `now`.
    pub fn complete_due_reboots(&mut self, now: DateTime<Utc>) -> Vec<LogEntry> {
        let (due, waiting): (Vec<_>, Vec<_>) = self
            .pending_reboots
            .drain(..)
            .partition(|pending| pending.due <= now);
        self.pending_reboots = waiting;

        let mut emitted = Vec::with_capacity(due.len());
        for pending in due {
            let snapshot = Arc::make_mut(&mut self.snapshot);
            if let Some(device) = snapshot.devices.iter_mut().find(|d| d.id == pending.device_id) {
                device.status = DeviceStatus::Online;
                device.latency_ms = REBOOT_BASELINE_LATENCY_MS;
                emitted.push(self.record(
                    now,
                    LogSource::IotNetwork,
                    Severity::Success,
                    format!("Device {} successfully rebooted and online.", pending.device_id),
                ));
            }
        }
        emitted
    }

    fn record(
        &mut self,
        now: DateTime<Utc>,
        source: LogSource,
        severity: Severity,
        message: String,
    ) -> LogEntry {
        let entry = LogEntry::new(self.rng.entry_id(), now, source, severity, message);
        self.push_log(entry.clone());
        entry
    }

    fn push_log(&mut self, entry: LogEntry) {
        entry.emit();
        if self.exporting {
            self.unexported.push(entry.clone());
        }
        self.logs.push_back(entry);
        while self.logs.len() > self.log_window {
            self.logs.pop_front();
        }
    }

    /// Shared handle to the current snapshot.
    pub fn snapshot(&self) -> Arc<NetworkSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn zone_mode(&self) -> ZoneMode {
        self.zone_mode
    }

    pub fn stats(&self) -> &TrafficStats {
        &self.stats
    }

    /// Trailing window of log entries, oldest first.
    pub fn logs(&self) -> impl Iterator<Item = &LogEntry> {
        self.logs.iter()
    }

    pub fn history(&self) -> &CongestionHistory {
        &self.history
    }

    /// Drains every entry logged since the previous call, including admin
    /// actions taken between ticks. Always empty when exporting is off.
    pub fn take_unexported(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.unexported)
    }

    pub fn pending_reboots(&self) -> usize {
        self.pending_reboots.len()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Drives the control center at a fixed interval until `max_ticks` is reached
/// (or forever). Ticks never overlap: a late tick delays the schedule.
/// Returns the number of ticks run.
pub async fn run_update_loop(
    center: Arc<Mutex<TrafficControlCenter>>,
    config: SimulationConfig,
) -> u64 {
    let mut interval = time::interval(config.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick of a tokio interval fires immediately
    interval.tick().await;

    let mut ticks = 0;
    while config.max_ticks.map_or(true, |max| ticks < max) {
        interval.tick().await;
        let now = current_timestamp();
        let (unexported, stats) = {
            let mut guard = center.lock().await;
            guard.tick(now);
            (guard.take_unexported(), guard.stats().clone())
        };
        ticks += 1;

        log::info!(
            "Tick {}: {} cars, {}% congestion, {} alerts, {} ppm CO2 [{}]",
            ticks,
            stats.total_cars,
            stats.average_congestion,
            stats.active_alerts,
            stats.avg_co2,
            stats.zone_mode
        );

        if let Some(dir) = &config.export_dir {
            if let Err(e) = export_log_entries(dir, &unexported) {
                log::warn!("Failed to export log entries: {}", e);
            }
            if let Err(e) = export_stats(dir, now, &stats) {
                log::warn!("Failed to export stats: {}", e);
            }
        }
    }
    ticks
}

/// Requests a reboot and completes it after the configured delay,
/// without waiting for the next tick.
pub async fn run_reboot_sequence(
    center: Arc<Mutex<TrafficControlCenter>>,
    device_id: DeviceId,
    delay: std::time::Duration,
) -> Result<(), ControlError> {
    let due = center
        .lock()
        .await
        .request_device_reboot(device_id, current_timestamp())?;
    sleep(delay).await;
    center
        .lock()
        .await
        .complete_due_reboots(due.max(current_timestamp()));
    Ok(())
}
