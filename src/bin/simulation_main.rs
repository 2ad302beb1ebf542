// simulation_main.rs
use chrono::Utc;
use city_traffic_grid::config::SimulationConfig;
use city_traffic_grid::control_system::{run_cli, run_update_loop, TrafficControlCenter};
use city_traffic_grid::monitoring::traffic_monitoring_system::generate_report;
use std::process;
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match SimulationConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let center = Arc::new(Mutex::new(TrafficControlCenter::new(&config, Utc::now())));
    let reboot_delay = config.reboot_delay();

    tokio::select! {
        ticks = run_update_loop(Arc::clone(&center), config.clone()) => {
            log::info!("Simulation finished after {} ticks", ticks);
        }
        // end of stdin disables this branch; only `quit` stops the run
        true = run_cli(Arc::clone(&center), reboot_delay) => {
            log::info!("Quit requested, stopping simulation");
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, stopping simulation");
        }
    }

    if let Some(dir) = &config.export_dir {
        match generate_report(dir) {
            Ok(report) => println!(
                "Exported {} log entries and {} stats rows to {}",
                report.log_entries,
                report.stats_rows,
                dir.display()
            ),
            Err(e) => log::error!("Failed to read exports back: {}", e),
        }
    }
}
