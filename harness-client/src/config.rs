//! Client configuration
//!
//! Credentials and connection settings, built once at startup and read-only
//! afterwards.

use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default platform gateway
pub const DEFAULT_BASE_URL: &str = "https://app.harness.io/gateway";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`HarnessClient`](crate::HarnessClient)
#[derive(Clone)]
pub struct ClientConfig {
    /// API key sent in the `x-api-key` header
    pub api_key: String,

    /// Account identifier
    pub account_id: String,

    /// Organization identifier, required for pipeline queries
    pub org_id: Option<String>,

    /// Project identifier, required for pipeline queries
    pub project_id: Option<String>,

    /// Gateway base URL (e.g., "https://app.harness.io/gateway")
    pub base_url: String,

    /// Timeout applied to every request
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with default endpoint and timeout
    pub fn new(api_key: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            account_id: account_id.into(),
            org_id: None,
            project_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets organization and project scope; blank values count as unset
    pub fn with_scope(mut self, org_id: Option<String>, project_id: Option<String>) -> Self {
        self.org_id = org_id.filter(|v| !v.trim().is_empty());
        self.project_id = project_id.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::Configuration(
                "API key is required (--api-key or HARNESS_API_KEY)".to_string(),
            ));
        }

        if self.account_id.trim().is_empty() {
            return Err(ClientError::Configuration(
                "Account ID is required (--account or HARNESS_ACCOUNT_ID)".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::Configuration(
                "base URL must start with http:// or https://".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(ClientError::Configuration(
                "timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Organization and project, or a configuration error naming what is missing
    pub fn require_scope(&self) -> Result<(&str, &str)> {
        match (self.org_id.as_deref(), self.project_id.as_deref()) {
            (Some(org), Some(project)) => Ok((org, project)),
            _ => Err(ClientError::Configuration(
                "Organization and project IDs are required for pipeline queries \
                 (--org/--project or HARNESS_ORG_ID/HARNESS_PROJECT_ID)"
                    .to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("account_id", &self.account_id)
            .field("org_id", &self.org_id)
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
