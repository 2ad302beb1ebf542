use serde::{Deserialize, Serialize};

use crate::global_variables::PLACEHOLDER_SYSTEM_HEALTH;
use crate::simulation_engine::intersections::{CongestionLevel, Intersection};
use crate::simulation_engine::zone_protocol::ZoneMode;

/// System-wide metrics derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficStats {
    /// Ten vehicles per unit of flow, summed over all intersections.
    pub total_cars: u64,
    /// Mean flow / capacity usage, as a floored percentage.
    pub average_congestion: u32,
    /// Intersections classified CRITICAL.
    pub active_alerts: usize,
    pub system_health: f64,
    /// Floored mean CO2 in ppm.
    pub avg_co2: u32,
    pub zone_mode: ZoneMode,
}

/// Pure aggregation over the intersection snapshot. An empty snapshot
/// yields zero averages.
pub fn compute_stats(intersections: &[Intersection], zone_mode: ZoneMode) -> TrafficStats {
    let total_flow: u64 = intersections.iter().map(|i| i.current_flow as u64).sum();
    let count = intersections.len();

    let (average_congestion, avg_co2) = if count == 0 {
        (0, 0)
    } else {
        let usage_sum: f64 = intersections.iter().map(Intersection::usage).sum();
        let co2_sum: u64 = intersections
            .iter()
            .map(|i| i.environment.co2_level as u64)
            .sum();
        (
            (usage_sum / count as f64 * 100.0).floor() as u32,
            (co2_sum / count as u64) as u32,
        )
    };

    TrafficStats {
        total_cars: total_flow * 10,
        average_congestion,
        active_alerts: intersections
            .iter()
            .filter(|i| i.congestion_level == CongestionLevel::Critical)
            .count(),
        system_health: PLACEHOLDER_SYSTEM_HEALTH,
        avg_co2,
        zone_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation_engine::intersections::{GeoPoint, IntersectionId};

    fn sample(id: u16, flow: u32, co2: u32, level: CongestionLevel) -> Intersection {
        let mut i = Intersection::new(IntersectionId(id), format!("Road {}", id), "Tokyo, JP", GeoPoint { lat: 0.0, lng: 0.0 });
        i.current_flow = flow;
        i.environment.co2_level = co2;
        i.congestion_level = level;
        i
    }

    #[test]
    fn aggregates_flow_usage_alerts_and_co2() {
        let snapshot = vec![
            sample(1, 90, 410, CongestionLevel::High),
            sample(2, 40, 401, CongestionLevel::Low),
            sample(3, 120, 700, CongestionLevel::Critical),
        ];
        let stats = compute_stats(&snapshot, ZoneMode::Vip);
        assert_eq!(stats.total_cars, 2500);
        // (0.90 + 0.40 + 1.20) / 3 = 0.833
        assert_eq!(stats.average_congestion, 83);
        assert_eq!(stats.active_alerts, 1);
        // 1511 / 3 = 503.67
        assert_eq!(stats.avg_co2, 503);
        assert_eq!(stats.system_health, 98.5);
        assert_eq!(stats.zone_mode, ZoneMode::Vip);
    }

    #[test]
    fn repeated_calls_agree() {
        let snapshot = vec![
            sample(1, 33, 433, CongestionLevel::Low),
            sample(2, 77, 512, CongestionLevel::High),
        ];
        let first = compute_stats(&snapshot, ZoneMode::Normal);
        let second = compute_stats(&snapshot, ZoneMode::Normal);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_snapshot_has_zero_averages() {
        let stats = compute_stats(&[], ZoneMode::Lockdown);
        assert_eq!(stats.total_cars, 0);
        assert_eq!(stats.average_congestion, 0);
        assert_eq!(stats.avg_co2, 0);
        assert_eq!(stats.active_alerts, 0);
    }
}
