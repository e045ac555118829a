//! Errors for the natural-language query mediator (§4.14).

use mimir_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NlqError {
    #[error("llm adapter failed: {0}")]
    Adapter(String),
    #[error("no SPARQL query found in the model's response")]
    NoQueryExtracted,
    #[error("generated query rejected after retry: {0}")]
    ValidationFailed(#[from] GraphError),
}
