//! `GraphMediator`: wraps a `GraphBackend` and enforces the query-safety
//! rules of §4.9 — named-graph isolation, forbidden mutation tokens, a
//! nesting-depth limit, a result cap, and batched insertion.

use std::sync::Arc;

use mimir_domain::graph::{AskResult, GraphStats, SelectResult, Triple};
use mimir_domain::ontology::{OntologyFormat, ParsedOntology};

use crate::backend::GraphBackend;
use crate::errors::GraphError;
use crate::query::{self, DEFAULT_RESULT_CAP};

const FORBIDDEN_TOKENS: &[&str] = &["INSERT", "DELETE", "DROP", "CLEAR", "LOAD"];
const MAX_NESTING: usize = 5;
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 1_000;

pub struct GraphMediator {
    backend: Arc<dyn GraphBackend>,
    result_cap: usize,
    insert_batch_size: usize,
}

impl GraphMediator {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self { backend, result_cap: DEFAULT_RESULT_CAP, insert_batch_size: DEFAULT_INSERT_BATCH_SIZE }
    }

    pub fn with_limits(mut self, result_cap: usize, insert_batch_size: usize) -> Self {
        self.result_cap = result_cap;
        self.insert_batch_size = insert_batch_size;
        self
    }

    /// Runs the three static safety checks (§4.9 rules 1-3). Does not
    /// touch the backend.
    pub fn validate(&self, sparql: &str) -> Result<(), GraphError> {
        let upper = sparql.to_uppercase();

        for token in FORBIDDEN_TOKENS {
            let contains_token = upper
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *token);
            if contains_token {
                return Err(GraphError::ForbiddenOperation((*token).to_string()));
            }
        }

        if upper.contains("WHERE") && !upper.contains("GRAPH") {
            return Err(GraphError::MissingGraphClause);
        }

        if query::max_brace_depth(sparql) > MAX_NESTING {
            return Err(GraphError::ComplexityExceeded);
        }

        Ok(())
    }

    /// Validates, then silently imposes `LIMIT result_cap` when the query
    /// has none (§4.9 rule 4).
    fn prepare_select(&self, sparql: &str) -> Result<String, GraphError> {
        self.validate(sparql)?;
        if sparql.to_uppercase().contains("LIMIT") {
            Ok(sparql.to_string())
        } else {
            Ok(format!("{sparql} LIMIT {}", self.result_cap))
        }
    }

    pub fn query_select(&self, sparql: &str) -> Result<SelectResult, GraphError> {
        let prepared = self.prepare_select(sparql)?;
        self.backend.query_select(&prepared)
    }

    pub fn query_ask(&self, sparql: &str) -> Result<AskResult, GraphError> {
        self.validate(sparql)?;
        self.backend.query_ask(sparql)
    }

    /// Inserts triples in `insert_batch_size` chunks (§4.9 rule 5).
    pub fn insert_triples(&self, triples: &[Triple]) -> Result<usize, GraphError> {
        let mut inserted = 0;
        for chunk in triples.chunks(self.insert_batch_size.max(1)) {
            inserted += self.backend.insert_triples(chunk)?;
        }
        Ok(inserted)
    }

    pub fn delete_triples(&self, subject: Option<&str>, predicate: Option<&str>, object: Option<&str>) -> Result<usize, GraphError> {
        self.backend.delete_triples(subject, predicate, object)
    }

    pub fn clear_graph(&self, graph_uri: &str) -> Result<usize, GraphError> {
        self.backend.clear_graph(graph_uri)
    }

    pub fn stats(&self) -> Result<GraphStats, GraphError> {
        self.backend.stats()
    }

    pub fn health(&self) -> Result<(), GraphError> {
        self.backend.health()
    }

    /// Parses the ontology source and inserts it through the batched path
    /// rather than the backend's single-shot `load_ontology`.
    pub fn load_ontology(&self, graph_uri: &str, source_text: &str, format: OntologyFormat) -> Result<ParsedOntology, GraphError> {
        let mut parsed = crate::parser::parse(source_text, format)?;
        for t in parsed.triples.iter_mut() {
            t.graph = Some(graph_uri.to_string());
        }
        self.insert_triples(&parsed.triples)?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryGraphBackend;

    fn mediator() -> GraphMediator {
        GraphMediator::new(Arc::new(InMemoryGraphBackend::new()))
    }

    #[test]
    fn rejects_missing_graph_clause() {
        let m = mediator();
        assert!(matches!(m.validate("SELECT * WHERE { ?s ?p ?o }"), Err(GraphError::MissingGraphClause)));
    }

    #[test]
    fn rejects_forbidden_mutation_tokens() {
        let m = mediator();
        let err = m.validate("SELECT * WHERE { GRAPH <g> { ?s ?p ?o } } ; DROP GRAPH <g>").unwrap_err();
        assert!(matches!(err, GraphError::ForbiddenOperation(_)));
    }

    #[test]
    fn rejects_deep_nesting() {
        let m = mediator();
        let nested = "SELECT * WHERE { GRAPH <g> { { { { { { ?s ?p ?o } } } } } } }";
        assert!(matches!(m.validate(nested), Err(GraphError::ComplexityExceeded)));
    }

    #[test]
    fn injects_default_limit_when_absent() {
        let m = mediator().with_limits(5, 10);
        let prepared = m.prepare_select("SELECT * WHERE { GRAPH <g> { ?s ?p ?o } }").unwrap();
        assert!(prepared.ends_with("LIMIT 5"));
    }

    #[test]
    fn batches_inserts() {
        let m = mediator().with_limits(DEFAULT_RESULT_CAP, 2);
        let triples: Vec<_> = (0..5)
            .map(|i| {
                Triple::new(
                    mimir_domain::graph::Term::uri(format!("s{i}")),
                    mimir_domain::graph::Term::uri("p"),
                    mimir_domain::graph::Term::uri("o"),
                    Some("g".into()),
                )
            })
            .collect();
        assert_eq!(m.insert_triples(&triples).unwrap(), 5);
    }
}
