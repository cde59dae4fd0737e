//! Connector domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored integration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    /// Connector identifier
    pub id: String,

    pub name: String,

    /// Connector type as reported by the platform (e.g. "Github", "K8sCluster")
    #[serde(rename = "type")]
    pub connector_type: String,

    /// Selectors restricting which delegates may run this connector
    pub delegate_selectors: Vec<String>,

    pub created_by: String,

    pub created_at: Option<DateTime<Utc>>,
}

impl Connector {
    /// Whether this connector is pinned to delegates carrying `selector`
    pub fn uses_selector(&self, selector: &str) -> bool {
        self.delegate_selectors.iter().any(|s| s == selector)
    }
}
