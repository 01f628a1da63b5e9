//! Core domain types
//!
//! This module contains the core domain structures used across Pipewatch services.
//! These types represent the monitored entities and are shared between
//! the server (for persistence) and the client (for display).

pub mod alert;
pub mod pipeline;
pub mod run;

use thiserror::Error;

/// Error returned when a stored or submitted status string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} status '{value}' (expected one of: {expected})")]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}
