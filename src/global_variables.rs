// Scheduler defaults
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_LOG_WINDOW: usize = 50;
pub const DEFAULT_HISTORY_CAPACITY: usize = 11;
pub const DEFAULT_PREDICTION_ALPHA: f64 = 0.8;

// Device reboot sequence
pub const REBOOT_DELAY_MS: u64 = 1500;
pub const REBOOT_BASELINE_LATENCY_MS: u32 = 20;

// Device health probabilities (per device, per tick)
pub const DEVICE_FLIP_PROBABILITY: f64 = 0.001;
pub const BATTERY_DRAIN_PROBABILITY: f64 = 0.1;
pub const BATTERY_DRAIN_STEP: u8 = 1;

// Controller loss warning probability (per intersection, per tick)
pub const FALLBACK_WARNING_PROBABILITY: f64 = 0.02;

// Flow perturbation range (vehicles/minute per tick)
pub const FLOW_STEP_MIN: i32 = -6;
pub const FLOW_STEP_MAX: i32 = 8;

// Flow soft cap, as a fraction of capacity (numerator / denominator)
pub const FLOW_CAP_NUMERATOR: u32 = 13;
pub const FLOW_CAP_DENOMINATOR: u32 = 10;

// CO2 drift (ppm)
pub const CO2_MIN: u32 = 300;
pub const CO2_MAX: u32 = 800;
pub const CO2_RISE: u32 = 2;
pub const CO2_FALL: u32 = 1;
pub const CO2_RISE_FLOW_THRESHOLD: u32 = 80;

// Congestion thresholds on flow / capacity
pub const CRITICAL_USAGE: f64 = 0.9;
pub const HIGH_USAGE: f64 = 0.75;
pub const MODERATE_USAGE: f64 = 0.5;

// Phase durations (seconds)
pub const YELLOW_DURATION: u32 = 4;
pub const RED_DURATION_LOADED: u32 = 20;
pub const RED_DURATION: u32 = 45;
pub const GREEN_DURATION: u32 = 25;
pub const GREEN_DURATION_LOADED: u32 = 55;
pub const RED_LOADED_USAGE: f64 = 0.8;
pub const GREEN_LOADED_USAGE: f64 = 0.7;

// Emergency override
pub const EMERGENCY_GRACE_TIMER: u32 = 5;
pub const EMERGENCY_HOLD_TIMER: u32 = 99;
pub const EMERGENCY_FLOW_RELIEF: u32 = 15;
pub const EMERGENCY_MODERATE_FLOW: u32 = 20;

// Zone protocols
pub const VIP_GREEN_TIMER: u32 = 60;
pub const VIP_FLOW_RELIEF: u32 = 10;
pub const LOCKDOWN_TIMER: u32 = 999;
pub const LOCKDOWN_FLOW_RELIEF: u32 = 5;
pub const HUB_KEYWORDS: [&str; 3] = ["Square", "Crossing", "Junction"];

/// Every value a signal timer may be reset to.
pub const PHASE_DURATIONS: [u32; 9] = [
    YELLOW_DURATION,
    RED_DURATION_LOADED,
    RED_DURATION,
    GREEN_DURATION,
    GREEN_DURATION_LOADED,
    EMERGENCY_GRACE_TIMER,
    EMERGENCY_HOLD_TIMER,
    VIP_GREEN_TIMER,
    LOCKDOWN_TIMER,
];

// Network seeding
pub const INTERSECTION_CAPACITY: u32 = 100;
pub const CONNECTED_SENSORS: u8 = 4;
pub const PLACEHOLDER_SYSTEM_HEALTH: f64 = 98.5;
