use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

use crate::shared_data::LogEntry;
use crate::simulation_engine::stats::TrafficStats;
use crate::simulation_engine::zone_protocol::ZoneMode;

pub const EVENT_LOG_FILE: &str = "event_log.csv";
pub const TRAFFIC_STATS_FILE: &str = "traffic_stats.csv";

/// Flat, timestamped row of `TrafficStats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficStatsRecord {
    pub timestamp: DateTime<Utc>,
    pub total_cars: u64,
    pub average_congestion: u32,
    pub active_alerts: usize,
    pub system_health: f64,
    pub avg_co2: u32,
    pub zone_mode: ZoneMode,
}

impl TrafficStatsRecord {
    pub fn new(timestamp: DateTime<Utc>, stats: &TrafficStats) -> Self {
        Self {
            timestamp,
            total_cars: stats.total_cars,
            average_congestion: stats.average_congestion,
            active_alerts: stats.active_alerts,
            system_health: stats.system_health,
            avg_co2: stats.avg_co2,
            zone_mode: stats.zone_mode,
        }
    }
}

/// Row counts of the exported files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub log_entries: usize,
    pub stats_rows: usize,
}

// Appends records to a CSV file, writing the header only for a new file.
fn log_to_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<(), Box<dyn Error>> {
    if records.is_empty() {
        return Ok(());
    }
    let has_content = fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!has_content)
        .from_writer(file);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_log_entries(dir: &Path, entries: &[LogEntry]) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    log_to_csv(&dir.join(EVENT_LOG_FILE), entries)
}

pub fn export_stats(
    dir: &Path,
    at: DateTime<Utc>,
    stats: &TrafficStats,
) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    log_to_csv(&dir.join(TRAFFIC_STATS_FILE), &[TrafficStatsRecord::new(at, stats)])
}

pub fn read_event_log(dir: &Path) -> Result<Vec<LogEntry>, Box<dyn Error>> {
    let file = File::open(dir.join(EVENT_LOG_FILE))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut entries = Vec::new();
    for result in rdr.deserialize() {
        let entry: LogEntry = result?;
        entries.push(entry);
    }
    Ok(entries)
}

pub fn read_stats(dir: &Path) -> Result<Vec<TrafficStatsRecord>, Box<dyn Error>> {
    let file = File::open(dir.join(TRAFFIC_STATS_FILE))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: TrafficStatsRecord = result?;
        records.push(record);
    }
    Ok(records)
}

fn count_csv_records(path: &Path) -> Result<usize, Box<dyn Error>> {
    if !path.exists() {
        return Ok(0);
    }
    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);
    Ok(rdr.records().count())
}

/// Counts the rows exported so far.
pub fn generate_report(dir: &Path) -> Result<ExportReport, Box<dyn Error>> {
    let report = ExportReport {
        log_entries: count_csv_records(&dir.join(EVENT_LOG_FILE))?,
        stats_rows: count_csv_records(&dir.join(TRAFFIC_STATS_FILE))?,
    };
    log::info!(
        "Export report for {}: {} log entries, {} stats rows",
        dir.display(),
        report.log_entries,
        report.stats_rows
    );
    Ok(report)
}
