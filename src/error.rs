use std::path::PathBuf;
use thiserror::Error;

use crate::simulation_engine::devices::DeviceId;
use crate::simulation_engine::intersections::IntersectionId;

/// Failures of administrative actions applied to the held snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("intersection {0} is not part of the network")]
    UnknownIntersection(IntersectionId),

    #[error("device {0} is not part of the network")]
    UnknownDevice(DeviceId),

    #[error("{0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
