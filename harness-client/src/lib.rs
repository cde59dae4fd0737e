//! Harness HTTP Client
//!
//! A typed client for the parts of the Harness platform API this tool reads:
//! the delegate registry, the connector registry and the pipeline execution
//! history.
//!
//! Every response arrives in a `{ status, data, message }` envelope. A
//! non-SUCCESS status is reported as [`ClientError::Application`] even when the
//! HTTP status is 200. Requests are never retried.
//!
//! # Example
//!
//! ```no_run
//! use harness_client::{ClientConfig, HarnessClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = HarnessClient::new(ClientConfig::new("pat.xxx", "account-id"))?;
//!
//!     for (id, delegate) in client.list_delegates().await? {
//!         println!("{} {} {}", id, delegate.name, delegate.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
mod connectors;
mod delegates;
pub mod error;
mod executions;
mod platform;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use platform::PlatformApi;

use harness_core::dto::Envelope;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the Harness platform API
///
/// Methods are grouped by registry:
/// - Delegates (single lookup, full listing)
/// - Connectors (listing, optionally narrowed to a delegate selector)
/// - Executions (failed runs of a pipeline stage)
#[derive(Debug, Clone)]
pub struct HarnessClient {
    /// Validated connection settings
    config: ClientConfig,
    /// HTTP client instance with auth headers and timeout applied
    client: Client,
}

impl HarnessClient {
    /// Create a new client
    ///
    /// Fails with [`ClientError::Configuration`] when credentials are missing.
    ///
    /// # Example
    /// ```
    /// use harness_client::{ClientConfig, HarnessClient};
    ///
    /// let client = HarnessClient::new(ClientConfig::new("pat.xxx", "account-id")).unwrap();
    /// assert_eq!(client.base_url(), "https://app.harness.io/gateway");
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(config.api_key.trim())
            .map_err(|_| ClientError::Configuration("API key is not a valid header value".into()))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(config, client))
    }

    /// Create a client around a preconfigured reqwest Client
    ///
    /// The caller is responsible for the auth header and timeout.
    pub fn with_client(mut config: ClientConfig, client: Client) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self { config, client }
    }

    /// Get the base URL of the platform gateway
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// URL of `path` with `id` appended as one percent-encoded path segment
    ///
    /// Dot segments are refused so an id can never address another endpoint.
    fn resource_url(&self, path: &str, id: &str) -> Result<Url> {
        if matches!(id, "" | "." | "..") {
            return Err(ClientError::NotFound(format!("invalid identifier '{}'", id)));
        }

        let mut url = Url::parse(&self.url(path))
            .map_err(|e| ClientError::Configuration(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Configuration("base URL cannot carry a path".into()))?
            .push(id);
        Ok(url)
    }

    /// Query parameters identifying the account
    fn account_query(&self) -> Vec<(&'static str, String)> {
        vec![("accountIdentifier", self.config.account_id.clone())]
    }

    /// Query parameters identifying account, org and project (when set)
    fn scoped_query(&self) -> Vec<(&'static str, String)> {
        let mut query = self.account_query();
        if let Some(org) = &self.config.org_id {
            query.push(("orgIdentifier", org.clone()));
        }
        if let Some(project) = &self.config.project_id {
            query.push(("projectIdentifier", project.clone()));
        }
        query
    }

    // =============================================================================
    // Request Helpers
    // =============================================================================

    /// GET a single resource of the collection at `path`
    async fn get_resource<T: DeserializeOwned>(
        &self,
        path: &str,
        id: &str,
        query: &[(&'static str, String)],
    ) -> Result<T> {
        let url = self.resource_url(path, id)?;
        let endpoint = url.path().to_string();

        debug!(endpoint = %endpoint, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| ClientError::RequestFailed {
                endpoint: endpoint.clone(),
                source,
            })?;

        self.handle_response(&endpoint, response).await
    }

    async fn post_data<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
        body: &B,
    ) -> Result<T> {
        debug!(endpoint = path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::RequestFailed {
                endpoint: path.to_string(),
                source,
            })?;

        self.handle_response(path, response).await
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Read the body and unwrap the envelope
    async fn handle_response<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::RequestFailed {
                endpoint: endpoint.to_string(),
                source,
            })?;

        unwrap_envelope(endpoint, status, &body)
    }
}

/// Check the HTTP status, parse the envelope and extract its data
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(
    endpoint: &str,
    status: StatusCode,
    body: &str,
) -> Result<T> {
    if !status.is_success() {
        return Err(ClientError::api_error(endpoint, status.as_u16(), body));
    }

    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ClientError::ParseError {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

    if !envelope.is_success() {
        return Err(ClientError::Application {
            endpoint: endpoint.to_string(),
            message: envelope.failure_reason(),
        });
    }

    envelope
        .data
        .ok_or_else(|| ClientError::NotFound(format!("{} returned no data", endpoint)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn client() -> HarnessClient {
        HarnessClient::new(ClientConfig::new("pat.test", "acct-1")).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert_eq!(client.base_url(), "https://app.harness.io/gateway");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let config = ClientConfig::new("pat.test", "acct-1").with_base_url("http://localhost:8181/");
        let client = HarnessClient::new(config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8181");
        assert_eq!(
            client.url("/ng/api/delegate-setup"),
            "http://localhost:8181/ng/api/delegate-setup"
        );
    }

    #[test]
    fn test_resource_id_is_a_single_encoded_segment() {
        let url = client()
            .resource_url("/ng/api/delegate-setup", "../a/b?c#d")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://app.harness.io/gateway/ng/api/delegate-setup/..%2Fa%2Fb%3Fc%23d"
        );

        let plain = client().resource_url("/ng/api/delegate-setup", "d1").unwrap();
        assert_eq!(plain.path(), "/gateway/ng/api/delegate-setup/d1");
    }

    #[test]
    fn test_resource_id_rejects_dot_segments() {
        for id in ["", ".", ".."] {
            let err = client()
                .resource_url("/ng/api/delegate-setup", id)
                .unwrap_err();
            assert!(err.is_not_found(), "accepted {id:?}");
        }
    }

    #[test]
    fn test_missing_credentials_fail_at_construction() {
        let err = HarnessClient::new(ClientConfig::new("", "acct-1")).unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn test_scoped_query_skips_unset_ids() {
        let account_only = client();
        assert_eq!(
            account_only.scoped_query(),
            vec![("accountIdentifier", "acct-1".to_string())]
        );

        let config = ClientConfig::new("pat.test", "acct-1")
            .with_scope(Some("default".into()), Some("payments".into()));
        let scoped = HarnessClient::new(config).unwrap();
        assert_eq!(scoped.scoped_query().len(), 3);
    }

    #[test]
    fn test_unwrap_envelope_success() {
        let data: Value = unwrap_envelope(
            "/x",
            StatusCode::OK,
            r#"{"status":"SUCCESS","data":{"uuid":"d1"}}"#,
        )
        .unwrap();
        assert_eq!(data["uuid"], "d1");
    }

    #[test]
    fn test_unwrap_envelope_failure_status_with_http_200() {
        let err = unwrap_envelope::<Value>(
            "/x",
            StatusCode::OK,
            r#"{"status":"ERROR","message":"Delegate not found","code":"RESOURCE_NOT_FOUND"}"#,
        )
        .unwrap_err();
        assert!(err.is_application_error());
        assert!(err.to_string().contains("Delegate not found"));
    }

    #[test]
    fn test_unwrap_envelope_http_error_keeps_body() {
        let err =
            unwrap_envelope::<Value>("/x", StatusCode::UNAUTHORIZED, "invalid api key").unwrap_err();
        match err {
            ClientError::ApiError { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unwrap_envelope_rejects_non_json() {
        let err = unwrap_envelope::<Value>("/x", StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, ClientError::ParseError { .. }));
    }

    #[test]
    fn test_unwrap_envelope_without_data_is_not_found() {
        let err = unwrap_envelope::<Value>("/x", StatusCode::OK, r#"{"status":"SUCCESS"}"#)
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
