//! Delegate connectivity plan
//!
//! Commands an operator runs on a delegate host to check that it can reach
//! the services its pipelines depend on. Nothing here is executed by the CLI.

use serde::{Deserialize, Serialize};

use crate::domain::delegate::Delegate;

/// Endpoints checked when the operator does not name any
pub const DEFAULT_TARGETS: &[&str] = &[
    "https://app.harness.io",
    "https://github.com",
    "https://registry.hub.docker.com",
];

/// Checks for a single target URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityTest {
    pub url: String,
    pub hostname: String,
    pub port: u16,
    /// TCP reachability check
    pub network_command: String,
    /// HTTP check printing only the response code
    pub http_command: String,
}

impl ConnectivityTest {
    pub fn new(url: impl Into<String>, hostname: impl Into<String>, port: u16) -> Self {
        let url = url.into();
        let hostname = hostname.into();
        Self {
            network_command: format!("nc -zv {} {}", hostname, port),
            http_command: format!(
                "curl -sS -o /dev/null -w \"%{{http_code}}\\n\" --connect-timeout 10 {}",
                url
            ),
            url,
            hostname,
            port,
        }
    }
}

/// Connectivity checks for one delegate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityPlan {
    pub delegate: Delegate,
    pub connectivity_tests: Vec<ConnectivityTest>,
}
