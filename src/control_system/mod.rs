pub mod admin_cli;
pub mod traffic_control_center;

pub use admin_cli::{run_cli, run_console, AdminCommand};
pub use traffic_control_center::{run_reboot_sequence, run_update_loop, TrafficControlCenter};
