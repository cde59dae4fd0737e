//! Delegate domain model
//!
//! Represents a worker agent registered with the platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A delegate as seen at fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delegate {
    /// Platform identifier (the wire `uuid`)
    pub id: String,

    /// Display name
    pub name: String,

    /// Host the delegate process runs on
    pub hostname: String,

    /// Address reported by the delegate
    pub ip: String,

    /// Registration status
    pub status: DelegateStatus,

    /// Delegate build version
    pub version: String,

    /// Selectors (labels) used to target this delegate
    pub labels: Vec<String>,

    /// Last heartbeat received by the platform
    pub last_heartbeat: Option<DateTime<Utc>>,

    /// When the delegate last connected
    pub connected_at: Option<DateTime<Utc>>,

    /// Delegate profile identifier, if one is attached
    pub profile: Option<String>,
}

impl Delegate {
    /// Whether the delegate is enabled on the platform
    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

/// Registration status of a delegate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DelegateStatus {
    Enabled,
    Disabled,
    WaitingForApproval,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl DelegateStatus {
    /// Parse a wire status, falling back to `Unknown` for values this
    /// version does not know about
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ENABLED" => DelegateStatus::Enabled,
            "DISABLED" => DelegateStatus::Disabled,
            "WAITING_FOR_APPROVAL" => DelegateStatus::WaitingForApproval,
            "DELETED" => DelegateStatus::Deleted,
            _ => DelegateStatus::Unknown,
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, DelegateStatus::Enabled)
    }
}

impl std::fmt::Display for DelegateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelegateStatus::Enabled => write!(f, "ENABLED"),
            DelegateStatus::Disabled => write!(f, "DISABLED"),
            DelegateStatus::WaitingForApproval => write!(f, "WAITING_FOR_APPROVAL"),
            DelegateStatus::Deleted => write!(f, "DELETED"),
            DelegateStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}
