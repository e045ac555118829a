//! Core-specific errors (registry lookup, execution, event plumbing).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum CoreError {
    #[error("no plugin registered for {plugin_type}.{name}")]
    PluginNotFound { plugin_type: String, name: String },
    #[error("malformed plugin key {0:?}, expected \"Type.Name\"")]
    MalformedPluginKey(String),
    #[error("plugin already registered for {plugin_type}.{name}")]
    AlreadyRegistered { plugin_type: String, name: String },
    #[error("pipeline has no steps")]
    EmptyPipeline,
    #[error("step {step} failed: {message}")]
    StepFailed { step: String, message: String },
    #[error("pipeline run was cancelled at step {step}")]
    Cancelled { step: String },
    #[error("domain error: {0}")]
    Domain(#[from] mimir_domain::DomainError),
    #[error("internal: {0}")]
    Internal(String),
}
