//! `NLQueryMediator` (§4.14): turns a natural-language question into a
//! validated SPARQL SELECT and executes it. Construct -> invoke the
//! adapter -> extract -> validate; on rejection, retry once with the
//! validator's error folded back into the prompt; on a second rejection,
//! surface it to the caller. Successful translations are cached by
//! `(question, ontologyId)`.

use std::sync::Arc;
use std::time::Duration;

use mimir_domain::graph::SelectResult;
use mimir_domain::ontology::ParsedOntology;
use mimir_graph::GraphMediator;
use uuid::Uuid;

use crate::adapter::LlmAdapter;
use crate::cache::QueryCache;
use crate::errors::NlqError;
use crate::prompt::{build_prompt, extract_sparql};

pub struct NLQueryMediator {
    adapter: Arc<dyn LlmAdapter>,
    graph: Arc<GraphMediator>,
    cache: QueryCache,
}

impl NLQueryMediator {
    pub fn new(adapter: Arc<dyn LlmAdapter>, graph: Arc<GraphMediator>, cache_capacity: usize, cache_ttl: Duration) -> Self {
        Self { adapter, graph, cache: QueryCache::new(cache_capacity, cache_ttl) }
    }

    /// Answers `question` against `ontology`, reusing a cached translation
    /// when one is still within its TTL.
    pub fn ask(&self, ontology_id: Uuid, ontology: &ParsedOntology, question: &str) -> Result<SelectResult, NlqError> {
        if let Some(sparql) = self.cache.get(question, ontology_id) {
            return self.graph.query_select(&sparql).map_err(NlqError::from);
        }

        let sparql = self.translate(ontology, question)?;
        self.cache.put(question, ontology_id, sparql.clone());
        self.graph.query_select(&sparql).map_err(NlqError::from)
    }

    /// Runs the translate/validate/retry-once flow without touching the
    /// cache or executing the resulting query.
    fn translate(&self, ontology: &ParsedOntology, question: &str) -> Result<String, NlqError> {
        let prompt = build_prompt(ontology, question, None);
        let response = self.adapter.complete(&prompt).map_err(|e| NlqError::Adapter(e.to_string()))?;
        let sparql = extract_sparql(&response).ok_or(NlqError::NoQueryExtracted)?;

        let first_err = match self.graph.validate(&sparql) {
            Ok(()) => return Ok(sparql),
            Err(err) => err,
        };

        let retry_prompt = build_prompt(ontology, question, Some(&first_err.to_string()));
        let retry_response = self.adapter.complete(&retry_prompt).map_err(|e| NlqError::Adapter(e.to_string()))?;
        let retry_sparql = extract_sparql(&retry_response).ok_or(NlqError::NoQueryExtracted)?;
        self.graph.validate(&retry_sparql)?;
        Ok(retry_sparql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StaticAdapter;
    use mimir_graph::backend::InMemoryGraphBackend;

    fn mediator(adapter: impl LlmAdapter + 'static) -> NLQueryMediator {
        let graph = Arc::new(GraphMediator::new(Arc::new(InMemoryGraphBackend::new())));
        NLQueryMediator::new(Arc::new(adapter), graph, 16, Duration::from_secs(60))
    }

    fn empty_ontology() -> ParsedOntology {
        ParsedOntology::default()
    }

    #[test]
    fn valid_first_attempt_is_cached_and_reused() {
        let adapter = StaticAdapter::new("```sparql\nSELECT * WHERE { GRAPH <g> { ?s ?p ?o } }\n```");
        let m = mediator(adapter);
        let ontology_id = Uuid::new_v4();
        m.ask(ontology_id, &empty_ontology(), "how many widgets?").unwrap();
        assert!(m.cache.get("how many widgets?", ontology_id).is_some());
    }

    #[test]
    fn rejected_first_attempt_retries_and_then_succeeds() {
        // The retry prompt is the only one containing "rejected" (appended
        // by `build_prompt` once a validation error is folded back in), so
        // only the second call sees the corrected, GRAPH-wrapped query.
        let adapter = StaticAdapter::new("```sparql\nSELECT * WHERE { ?s ?p ?o }\n```")
            .with_response("rejected", "```sparql\nSELECT * WHERE { GRAPH <g> { ?s ?p ?o } }\n```");
        let m = mediator(adapter);
        let result = m.translate(&empty_ontology(), "question that retries");
        assert!(result.is_ok());
    }

    #[test]
    fn two_consecutive_invalid_queries_surface_the_validation_error() {
        let adapter = StaticAdapter::new("```sparql\nSELECT * WHERE { ?s ?p ?o }\n```");
        let m = mediator(adapter);
        let result = m.translate(&empty_ontology(), "question");
        assert!(matches!(result, Err(NlqError::ValidationFailed(_))));
    }

    #[test]
    fn a_response_with_no_extractable_query_is_reported() {
        let adapter = StaticAdapter::new("I'm not sure.");
        let m = mediator(adapter);
        let result = m.translate(&empty_ontology(), "question");
        assert!(matches!(result, Err(NlqError::NoQueryExtracted)));
    }
}
