//! Shared domain error kinds (§7 of the core specification).
//!
//! `DomainError` is the common currency every crate in the workspace wraps
//! or converts into. It stays small and serializable so it can ride inside
//! event payloads (`FlowEventKind::StepFailed`-style variants) the same way
//! the teacher's `CoreEngineError` does.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("deadline exceeded: {0}")]
    Deadline(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_stable() {
        assert_eq!(DomainError::validation("x").to_string(), "validation failed: x");
        assert_eq!(DomainError::not_found("y").to_string(), "not found: y");
        assert_eq!(DomainError::Cancelled.to_string(), "cancelled");
    }
}
