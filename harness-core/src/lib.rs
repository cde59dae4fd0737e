//! Harness Core
//!
//! Core types for the Harness debugging CLI.
//!
//! This crate contains:
//! - Domain types: normalized records (Delegate, Connector, PipelineRun, etc.)
//! - DTOs: raw wire shapes returned by the platform and their decode step

pub mod domain;
pub mod dto;
pub mod error;

pub use error::DecodeError;
