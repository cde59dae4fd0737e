//! Core domain types
//!
//! Normalized, read-only records built from platform responses. They live for
//! a single CLI invocation and are never persisted.

pub mod connectivity;
pub mod connector;
pub mod delegate;
pub mod execution;

/// Placeholder used for optional text fields the platform did not send
pub const UNKNOWN: &str = "unknown";

/// Display format used for timestamps in human output and the output file
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
