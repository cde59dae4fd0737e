//! Wire DTOs
//!
//! Raw response shapes returned by the platform and the explicit decode step
//! that turns them into domain records. Required fields (identifiers,
//! statuses) are checked here; optional text fields fall back to
//! [`UNKNOWN`](crate::domain::UNKNOWN).

pub mod connector;
pub mod delegate;
pub mod execution;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Status value the platform uses for a successful envelope
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Standard response envelope: `{ status, data, message }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,

    pub data: Option<T>,

    #[serde(default)]
    pub message: Option<String>,

    /// Error code sent alongside a failed status
    #[serde(default)]
    pub code: Option<String>,
}

impl<T> Envelope<T> {
    /// Whether the platform reported success, regardless of HTTP status
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_SUCCESS)
    }

    /// Human readable reason for a failed envelope
    pub fn failure_reason(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{} ({})", message, code),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => format!("status {}", self.status),
        }
    }
}

/// Paged listing payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,

    #[serde(default)]
    pub total_pages: Option<u32>,

    #[serde(default)]
    pub page_index: Option<u32>,
}

/// `failureInfo` block attached to executions and nodes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureInfo {
    #[serde(default)]
    pub message: Option<String>,
}

impl FailureInfo {
    /// The message, if it carries any text
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

/// Convert an epoch-millisecond timestamp; zero means "never"
pub(crate) fn from_epoch_millis(
    entity: &'static str,
    field: &'static str,
    millis: Option<i64>,
) -> Result<Option<DateTime<Utc>>, DecodeError> {
    match millis {
        None | Some(0) => Ok(None),
        Some(value) => DateTime::from_timestamp_millis(value)
            .map(Some)
            .ok_or(DecodeError::InvalidTimestamp {
                entity,
                field,
                value,
            }),
    }
}

/// Required text field: absent and blank are both missing
pub(crate) fn required(
    entity: &'static str,
    field: &'static str,
    value: Option<String>,
) -> Result<String, DecodeError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(DecodeError::MissingField { entity, field })
}

/// Optional text field with the `unknown` fallback
pub(crate) fn or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| crate::domain::UNKNOWN.to_string())
}
