// simulation_engine/mod.rs
pub mod control_rules;
pub mod device_health;
pub mod devices;
pub mod intersections;
pub mod random;
pub mod signal_state_machine;
pub mod simulation;
pub mod stats;
pub mod zone_protocol;

pub use simulation::{advance, initialize_network, tick, NetworkSnapshot, TickOutcome};
pub use stats::{compute_stats, TrafficStats};
pub use zone_protocol::ZoneMode;
