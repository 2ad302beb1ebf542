// src/shared_data.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How loudly a log entry should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warn,
    Error,
    Success,
}

/// The subsystem that produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogSource {
    IotNetwork,
    AiCore,
    UserAction,
    AdminProtocol,
    Admin,
    System,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tag = match self {
            LogSource::IotNetwork => "IOT_NETWORK",
            LogSource::AiCore => "AI_CORE",
            LogSource::UserAction => "USER_ACTION",
            LogSource::AdminProtocol => "ADMIN_PROTOCOL",
            LogSource::Admin => "ADMIN",
            LogSource::System => "SYSTEM",
        };
        write!(f, "{}", tag)
    }
}

/// Immutable audit record of a notable transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source: LogSource,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    pub fn new(
        id: Uuid,
        timestamp: DateTime<Utc>,
        source: LogSource,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp,
            source,
            message: message.into(),
            severity,
        }
    }

    /// Forwards the entry to the `log` facade at a matching level.
    pub fn emit(&self) {
        match self.severity {
            Severity::Error => log::error!("[{}] {}", self.source, self.message),
            Severity::Warn => log::warn!("[{}] {}", self.source, self.message),
            Severity::Info | Severity::Success => {
                log::info!("[{}] {}", self.source, self.message)
            }
        }
    }
}

pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}
