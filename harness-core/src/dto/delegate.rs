//! Delegate DTOs

use serde::{Deserialize, Serialize};

use super::{from_epoch_millis, or_unknown, required};
use crate::domain::delegate::{Delegate, DelegateStatus};
use crate::error::DecodeError;

const ENTITY: &str = "delegate";

/// Delegate record as returned by the delegate-setup endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateRecord {
    #[serde(default)]
    pub uuid: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub host_name: Option<String>,

    #[serde(default)]
    pub ip: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub selectors: Option<Vec<String>>,

    /// Single-delegate responses spell this `lastHeartBeat`
    #[serde(default, alias = "lastHeartBeat")]
    pub last_heartbeat: Option<i64>,

    #[serde(default)]
    pub connected_at: Option<i64>,

    #[serde(default)]
    pub delegate_profile_id: Option<String>,
}

/// Request body for the paged delegate listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDelegatesRequest {
    pub page_index: u32,
    pub page_size: u32,
    pub filter_type: String,
}

impl ListDelegatesRequest {
    pub fn all(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index,
            page_size,
            filter_type: "ALL".to_string(),
        }
    }
}

impl TryFrom<DelegateRecord> for Delegate {
    type Error = DecodeError;

    fn try_from(record: DelegateRecord) -> Result<Self, Self::Error> {
        let id = required(ENTITY, "uuid", record.uuid)?;
        let status = required(ENTITY, "status", record.status)?;

        let mut labels: Vec<String> = Vec::new();
        for selector in record.selectors.unwrap_or_default() {
            if !labels.contains(&selector) {
                labels.push(selector);
            }
        }

        Ok(Delegate {
            id,
            name: or_unknown(record.name),
            hostname: or_unknown(record.host_name),
            ip: or_unknown(record.ip),
            status: DelegateStatus::parse(&status),
            version: or_unknown(record.version),
            labels,
            last_heartbeat: from_epoch_millis(ENTITY, "lastHeartbeat", record.last_heartbeat)?,
            connected_at: from_epoch_millis(ENTITY, "connectedAt", record.connected_at)?,
            profile: record.delegate_profile_id.filter(|p| !p.is_empty()),
        })
    }
}
