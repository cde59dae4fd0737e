//! Connector DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{from_epoch_millis, or_unknown, required};
use crate::domain::connector::Connector;
use crate::error::DecodeError;

const ENTITY: &str = "connector";

/// Entry of the connector listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorResponse {
    pub connector: ConnectorInfo,

    #[serde(default)]
    pub created_at: Option<i64>,

    #[serde(default)]
    pub created_by: Option<CreatedBy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorInfo {
    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "type")]
    pub connector_type: Option<String>,

    /// Type specific settings; only `delegateSelectors` is read
    #[serde(default)]
    pub spec: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedBy {
    #[serde(default)]
    pub name: Option<String>,
}

/// Request body for the connector listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorFilter {
    pub filter_type: String,
}

impl Default for ConnectorFilter {
    fn default() -> Self {
        Self {
            filter_type: "Connector".to_string(),
        }
    }
}

impl ConnectorInfo {
    fn delegate_selectors(&self) -> Vec<String> {
        let selectors = self
            .spec
            .as_ref()
            .and_then(|spec| spec.get("delegateSelectors"))
            .and_then(JsonValue::as_array);

        let mut out: Vec<String> = Vec::new();
        for selector in selectors.into_iter().flatten().filter_map(JsonValue::as_str) {
            if !out.iter().any(|s| s == selector) {
                out.push(selector.to_string());
            }
        }
        out
    }
}

impl TryFrom<ConnectorResponse> for Connector {
    type Error = DecodeError;

    fn try_from(response: ConnectorResponse) -> Result<Self, Self::Error> {
        let delegate_selectors = response.connector.delegate_selectors();
        let info = response.connector;

        Ok(Connector {
            id: required(ENTITY, "identifier", info.identifier)?,
            name: or_unknown(info.name),
            connector_type: or_unknown(info.connector_type),
            delegate_selectors,
            created_by: or_unknown(response.created_by.and_then(|c| c.name)),
            created_at: from_epoch_millis(ENTITY, "createdAt", response.created_at)?,
        })
    }
}
