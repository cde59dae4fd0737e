//! Decode errors
//!
//! Raised when a wire record lacks a field the domain model cannot do without.

use thiserror::Error;

/// Failure to turn a wire record into a domain record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A required field was absent or empty
    #[error("{entity} record is missing required field `{field}`")]
    MissingField {
        /// Kind of record being decoded
        entity: &'static str,
        /// Wire name of the missing field
        field: &'static str,
    },

    /// A timestamp could not be represented
    #[error("{entity} record has an invalid timestamp in `{field}`: {value}")]
    InvalidTimestamp {
        entity: &'static str,
        field: &'static str,
        value: i64,
    },
}
