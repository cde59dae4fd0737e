//! Error types for the Harness client

use harness_core::DecodeError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the platform
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials or endpoint settings are missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport failure (connect, TLS, timeout, DNS)
    #[error("Request to {endpoint} failed: {source}")]
    RequestFailed {
        /// Endpoint path that was called
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The platform answered with a non-success HTTP status
    #[error("API error on {endpoint} (status {status}): {body}")]
    ApiError {
        /// Endpoint path that was called
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Raw response body, kept for diagnosis
        body: String,
    },

    /// HTTP succeeded but the envelope status was not SUCCESS
    #[error("Platform reported failure on {endpoint}: {message}")]
    Application {
        /// Endpoint path that was called
        endpoint: String,
        /// Reason given by the platform
        message: String,
    },

    /// Response body was not the expected JSON shape
    #[error("Failed to parse response from {endpoint}: {message}")]
    ParseError {
        /// Endpoint path that was called
        endpoint: String,
        message: String,
    },

    /// A record lacked a required field
    #[error("Invalid record: {0}")]
    Decode(#[from] DecodeError),

    /// Requested entity does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl ClientError {
    /// Create an API error from status code and body
    pub fn api_error(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::ApiError {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the platform answered but reported failure in the envelope
    pub fn is_application_error(&self) -> bool {
        matches!(self, Self::Application { .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }
}
