//! mimir-graph: the RDF triple store contract and its query-safety
//! mediator (§4.9), plus the ontology source-text parser that feeds both
//! `OntologyStore` and the graph backend's `loadOntology` operation.
//!
//! `backend` owns the storage contract; `mediator` is the only path
//! callers outside this crate should use, since it's the one enforcing
//! named-graph isolation and query limits.

pub mod backend;
pub mod errors;
pub mod mediator;
pub mod parser;
pub mod query;

pub use backend::{GraphBackend, InMemoryGraphBackend};
pub use errors::GraphError;
pub use mediator::GraphMediator;
