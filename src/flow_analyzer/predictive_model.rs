use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One sample on the congestion trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// `HH:MM` label of the sample time.
    pub time: String,
    pub congestion: u32,
    pub prediction: u32,
}

/// Rolling window of average congestion with a weighted one-step prediction.
#[derive(Debug, Clone)]
pub struct CongestionHistory {
    capacity: usize,
    alpha: f64,
    points: VecDeque<ChartPoint>,
}

impl CongestionHistory {
    /// `alpha` weights the current sample against the window average.
    pub fn new(capacity: usize, alpha: f64) -> Self {
        Self {
            capacity: capacity.max(1),
            alpha: alpha.clamp(0.0, 1.0),
            points: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn average(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let sum: f64 = self.points.iter().map(|p| p.congestion as f64).sum();
        Some(sum / self.points.len() as f64)
    }

    /// Predicts the next congestion percentage from the current one and the
    /// window as it stands.
    pub fn predict(&self, current: u32) -> u32 {
        let historical = self.average().unwrap_or(current as f64);
        let predicted = self.alpha * current as f64 + (1.0 - self.alpha) * historical;
        predicted.round().clamp(0.0, 100.0) as u32
    }

    /// Appends a sample, evicting the oldest one when full.
    pub fn record(&mut self, at: DateTime<Utc>, congestion: u32) -> ChartPoint {
        let point = ChartPoint {
            time: at.format("%H:%M").to_string(),
            congestion,
            prediction: self.predict(congestion),
        };
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point.clone());
        point
    }

    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
