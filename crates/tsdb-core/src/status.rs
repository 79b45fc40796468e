//! Unit status reported to the orchestrator

use std::fmt;

use serde::{Deserialize, Serialize};

pub const MSG_WAITING_FOR_DATABASE: &str = "waiting for postgresql to be installed";
pub const MSG_INSTALLING: &str = "installing TimescaleDB";
pub const MSG_RECONFIGURING: &str = "setting up TimescaleDB per config";
pub const MSG_UPGRADING: &str = "upgrading TimescaleDB";

/// Status of the unit as seen by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    /// A precondition is not met yet
    Waiting(String),
    /// Work is in progress
    Maintenance(String),
    /// Installed and configured
    Active,
    /// Needs attention; the event will be retried
    Blocked(String),
}

impl UnitStatus {
    pub fn waiting(message: impl Into<String>) -> Self {
        Self::Waiting(message.into())
    }

    pub fn maintenance(message: impl Into<String>) -> Self {
        Self::Maintenance(message.into())
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self::Blocked(message.into())
    }

    /// Lowercase state name
    pub fn state(&self) -> &'static str {
        match self {
            Self::Waiting(_) => "waiting",
            Self::Maintenance(_) => "maintenance",
            Self::Active => "active",
            Self::Blocked(_) => "blocked",
        }
    }

    /// Human-readable reason, empty for `Active`
    pub fn message(&self) -> &str {
        match self {
            Self::Waiting(m) | Self::Maintenance(m) | Self::Blocked(m) => m,
            Self::Active => "",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            other => write!(f, "{}: {}", other.state(), other.message()),
        }
    }
}

/// Whether the triggering event is done or must be redelivered later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Resolved,
    Defer,
}

/// Receives every status the unit reports, intermediate ones included
pub trait StatusSink {
    fn report(&self, status: &UnitStatus);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(UnitStatus::Active.to_string(), "active");
        assert_eq!(
            UnitStatus::waiting(MSG_WAITING_FOR_DATABASE).to_string(),
            "waiting: waiting for postgresql to be installed"
        );
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_string(&UnitStatus::blocked("installation failed: boom")).unwrap();
        assert_eq!(json, r#"{"state":"blocked","message":"installation failed: boom"}"#);

        let active = serde_json::to_string(&UnitStatus::Active).unwrap();
        assert_eq!(active, r#"{"state":"active"}"#);
        assert_eq!(
            serde_json::from_str::<UnitStatus>(&active).unwrap(),
            UnitStatus::Active
        );
    }
}
