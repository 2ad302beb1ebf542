use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ControlError;
use crate::global_variables::{
    CONNECTED_SENSORS, FLOW_CAP_DENOMINATOR, FLOW_CAP_NUMERATOR, HUB_KEYWORDS,
    INTERSECTION_CAPACITY,
};

/// Stable identifier of an intersection, rendered as `INT-<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntersectionId(pub u16);

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "INT-{}", self.0)
    }
}

impl FromStr for IntersectionId {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .strip_prefix("INT-")
            .and_then(|n| n.parse::<u16>().ok())
            .map(IntersectionId)
            .ok_or_else(|| ControlError::Parse(format!("not an intersection id: {:?}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalState {
    Red,
    Yellow,
    Green,
}

/// Discrete classification of flow / capacity usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CongestionLevel {
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weather {
    Clear,
    Rain,
    Fog,
    Snow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Ambient readings at an intersection. Only `co2_level` changes while ticking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// ppm, kept within `CO2_MIN..=CO2_MAX`.
    pub co2_level: u32,
    /// Celsius.
    pub temperature: i32,
    pub weather: Weather,
}

/// Represents a signalised intersection in the city network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub id: IntersectionId,
    pub name: String,
    /// City / country label.
    pub location: String,
    pub coordinates: GeoPoint,
    /// Vehicles per minute.
    pub current_flow: u32,
    pub capacity: u32,
    pub signal_state: SignalState,
    /// Seconds until the next phase transition.
    pub signal_timer: u32,
    pub congestion_level: CongestionLevel,
    /// Set by administrative action only; persists until cleared.
    pub is_emergency_override: bool,
    /// Receives green priority while the zone is in VIP mode.
    pub is_hub: bool,
    pub environment: Environment,
    pub connected_sensors: u8,
}

impl Intersection {
    /// Creates an idle intersection at capacity 100 showing RED.
    /// Hub status is seeded from the name.
    pub fn new(
        id: IntersectionId,
        name: impl Into<String>,
        location: impl Into<String>,
        coordinates: GeoPoint,
    ) -> Self {
        let name = name.into();
        let location = location.into();
        let is_hub = is_hub_name(&name);
        let (temperature, weather) = climate_for(&location);
        Self {
            id,
            name,
            location,
            coordinates,
            current_flow: 0,
            capacity: INTERSECTION_CAPACITY,
            signal_state: SignalState::Red,
            signal_timer: 1,
            congestion_level: CongestionLevel::Low,
            is_emergency_override: false,
            is_hub,
            environment: Environment {
                co2_level: 400,
                temperature,
                weather,
            },
            connected_sensors: CONNECTED_SENSORS,
        }
    }

    /// Flow as a fraction of capacity.
    pub fn usage(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.current_flow as f64 / self.capacity as f64
    }

    /// Soft upper bound on `current_flow`.
    pub fn flow_ceiling(&self) -> u32 {
        let ceiling =
            self.capacity as u64 * FLOW_CAP_NUMERATOR as u64 / FLOW_CAP_DENOMINATOR as u64;
        u32::try_from(ceiling).unwrap_or(u32::MAX)
    }
}

/// Name-based hub heuristic used to seed `Intersection::is_hub`.
pub fn is_hub_name(name: &str) -> bool {
    HUB_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

fn climate_for(location: &str) -> (i32, Weather) {
    if location.contains("UK") {
        (12, Weather::Rain)
    } else if location.contains("IN") {
        (32, Weather::Clear)
    } else {
        (18, Weather::Clear)
    }
}

struct Site {
    name: &'static str,
    lat: f64,
    lng: f64,
    location: &'static str,
}

const SITES: [Site; 28] = [
    // USA
    Site { name: "Market St & Van Ness", lat: 37.7749, lng: -122.4194, location: "San Francisco, USA" },
    Site { name: "Mission St & 16th", lat: 37.7651, lng: -122.4196, location: "San Francisco, USA" },
    Site { name: "Geary Blvd & Divisadero", lat: 37.7858, lng: -122.4398, location: "San Francisco, USA" },
    Site { name: "Times Square", lat: 40.7580, lng: -73.9855, location: "New York, USA" },
    // UK
    Site { name: "Oxford Circus", lat: 51.5152, lng: -0.1419, location: "London, UK" },
    Site { name: "Piccadilly Circus", lat: 51.5101, lng: -0.1340, location: "London, UK" },
    Site { name: "Trafalgar Square", lat: 51.5080, lng: -0.1281, location: "London, UK" },
    Site { name: "Elephant & Castle", lat: 51.4952, lng: -0.1008, location: "London, UK" },
    Site { name: "King's Cross St Pancras", lat: 51.5314, lng: -0.1261, location: "London, UK" },
    // Japan
    Site { name: "Shibuya Crossing", lat: 35.6595, lng: 139.7004, location: "Tokyo, JP" },
    Site { name: "Shinjuku Station West", lat: 35.6915, lng: 139.6969, location: "Tokyo, JP" },
    Site { name: "Ginza 4-Chome", lat: 35.6716, lng: 139.7649, location: "Tokyo, JP" },
    Site { name: "Akihabara Chuo-Dori", lat: 35.6984, lng: 139.7731, location: "Tokyo, JP" },
    Site { name: "Omotesando", lat: 35.6652, lng: 139.7123, location: "Tokyo, JP" },
    // Delhi
    Site { name: "Connaught Place (Outer)", lat: 28.6315, lng: 77.2167, location: "New Delhi, IN" },
    Site { name: "ITO Crossing", lat: 28.6272, lng: 77.2405, location: "New Delhi, IN" },
    Site { name: "AIIMS Flyover", lat: 28.5686, lng: 77.2089, location: "New Delhi, IN" },
    Site { name: "Dhaula Kuan", lat: 28.5921, lng: 77.1613, location: "New Delhi, IN" },
    // Mumbai
    Site { name: "Bandra-Worli Sea Link", lat: 19.0368, lng: 72.8172, location: "Mumbai, IN" },
    Site { name: "CSMT Junction", lat: 18.9401, lng: 72.8347, location: "Mumbai, IN" },
    Site { name: "Juhu Circle", lat: 19.1128, lng: 72.8277, location: "Mumbai, IN" },
    Site { name: "Dadar TT Circle", lat: 19.0178, lng: 72.8478, location: "Mumbai, IN" },
    // Bangalore
    Site { name: "Silk Board Junction", lat: 12.9175, lng: 77.6235, location: "Bangalore, IN" },
    Site { name: "MG Road Junction", lat: 12.9754, lng: 77.6074, location: "Bangalore, IN" },
    Site { name: "Tin Factory", lat: 12.9938, lng: 77.6601, location: "Bangalore, IN" },
    // Other major cities
    Site { name: "Kathipara Junction", lat: 13.0067, lng: 80.2206, location: "Chennai, IN" },
    Site { name: "Park Street", lat: 22.5550, lng: 88.3510, location: "Kolkata, IN" },
    Site { name: "Hitech City Main Rd", lat: 17.4474, lng: 78.3762, location: "Hyderabad, IN" },
];

/// Builds the fixed list of monitored intersections.
/// Flow, timer and CO2 readings are randomised within their seeding ranges;
/// signals alternate GREEN / RED by index.
pub fn create_intersections<R: Rng + ?Sized>(rng: &mut R) -> Vec<Intersection> {
    SITES
        .iter()
        .enumerate()
        .map(|(index, site)| {
            let mut intersection = Intersection::new(
                IntersectionId(index as u16 + 1),
                site.name,
                site.location,
                GeoPoint {
                    lat: site.lat,
                    lng: site.lng,
                },
            );
            intersection.current_flow = rng.random_range(10..60);
            intersection.signal_timer = rng.random_range(10..40);
            intersection.signal_state = if index % 2 == 0 {
                SignalState::Green
            } else {
                SignalState::Red
            };
            intersection.environment.co2_level = rng.random_range(400..450);
            intersection
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ids_render_with_prefix() {
        assert_eq!(IntersectionId(7).to_string(), "INT-7");
        assert_eq!("INT-7".parse::<IntersectionId>(), Ok(IntersectionId(7)));
        assert!("7".parse::<IntersectionId>().is_err());
        assert!("INT-x".parse::<IntersectionId>().is_err());
    }

    #[test]
    fn seeded_network_is_within_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        let intersections = create_intersections(&mut rng);
        assert_eq!(intersections.len(), 28);
        for (index, i) in intersections.iter().enumerate() {
            assert_eq!(i.id, IntersectionId(index as u16 + 1));
            assert!((10..60).contains(&i.current_flow));
            assert!((10..40).contains(&i.signal_timer));
            assert!((400..450).contains(&i.environment.co2_level));
            assert_eq!(i.capacity, 100);
            assert_eq!(i.congestion_level, CongestionLevel::Low);
            assert!(!i.is_emergency_override);
            let expected = if index % 2 == 0 {
                SignalState::Green
            } else {
                SignalState::Red
            };
            assert_eq!(i.signal_state, expected);
        }
    }

    #[test]
    fn climate_follows_location() {
        let mut rng = StdRng::seed_from_u64(3);
        let intersections = create_intersections(&mut rng);
        let oxford = intersections.iter().find(|i| i.name == "Oxford Circus").unwrap();
        assert_eq!(oxford.environment.weather, Weather::Rain);
        assert_eq!(oxford.environment.temperature, 12);
        let silk = intersections.iter().find(|i| i.name == "Silk Board Junction").unwrap();
        assert_eq!(silk.environment.temperature, 32);
        let times = intersections.iter().find(|i| i.name == "Times Square").unwrap();
        assert_eq!(times.environment.temperature, 18);
        assert_eq!(times.environment.weather, Weather::Clear);
    }

    #[test]
    fn hub_flag_is_seeded_from_name() {
        assert!(is_hub_name("Shibuya Crossing"));
        assert!(is_hub_name("CSMT Junction"));
        assert!(is_hub_name("Trafalgar Square"));
        assert!(!is_hub_name("Oxford Circus"));

        let mut rng = StdRng::seed_from_u64(5);
        let hubs: Vec<_> = create_intersections(&mut rng)
            .into_iter()
            .filter(|i| i.is_hub)
            .map(|i| i.name)
            .collect();
        assert_eq!(hubs.len(), 8);
        assert!(hubs.contains(&"Times Square".to_string()));
    }

    #[test]
    fn flow_ceiling_is_thirteen_tenths_of_capacity() {
        let mut i = Intersection::new(IntersectionId(1), "Test Rd", "Nowhere", GeoPoint { lat: 0.0, lng: 0.0 });
        assert_eq!(i.flow_ceiling(), 130);
        i.current_flow = 95;
        assert!((i.usage() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn flow_ceiling_handles_huge_capacities() {
        let mut i = Intersection::new(IntersectionId(2), "Test Ave", "Nowhere", GeoPoint { lat: 0.0, lng: 0.0 });
        i.capacity = u32::MAX / 13 + 1;
        assert_eq!(i.flow_ceiling(), ((u32::MAX / 13 + 1) as u64 * 13 / 10) as u32);
        i.capacity = u32::MAX;
        assert_eq!(i.flow_ceiling(), u32::MAX);
        i.capacity = 0;
        assert_eq!(i.flow_ceiling(), 0);
    }
}
