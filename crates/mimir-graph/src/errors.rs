//! Errors for the triple store abstraction and its query-safety mediator
//! (§4.9, §7).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum GraphError {
    #[error("query has a WHERE clause but does not name a graph")]
    MissingGraphClause,
    #[error("query contains a forbidden mutation token: {0}")]
    ForbiddenOperation(String),
    #[error("query nests more than 5 `{{` blocks")]
    ComplexityExceeded,
    #[error("ontology source failed to parse: {0}")]
    InvalidOntology(String),
    #[error("graph backend unreachable: {0}")]
    BackendUnavailable(String),
    #[error("unsupported query shape: {0}")]
    UnsupportedQuery(String),
    #[error("domain error: {0}")]
    Domain(#[from] mimir_domain::DomainError),
}
