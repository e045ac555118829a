//! `GraphBackend`: the triple store contract (§4.9) and an in-memory
//! implementation good enough to back tests and a local/demo deployment.
//!
//! This is explicitly not a SPARQL engine (§1 non-goals): `query_select`
//! and `query_ask` understand a single triple pattern inside one `GRAPH`
//! block, optionally wrapped in `SELECT (COUNT(*) AS ?x)`. Anything richer
//! is `UnsupportedQuery`.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Instant;

use chrono::Utc;

use mimir_domain::graph::{AskResult, Binding, GraphStats, SelectResult, Term};
use mimir_domain::ontology::{OntologyFormat, ParsedOntology};

use crate::errors::GraphError;
use crate::query::{self, GraphSelector, PatternTerm};

pub trait GraphBackend: Send + Sync {
    fn health(&self) -> Result<(), GraphError>;
    fn insert_triples(&self, triples: &[mimir_domain::graph::Triple]) -> Result<usize, GraphError>;
    fn delete_triples(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Result<usize, GraphError>;
    fn query_select(&self, sparql: &str) -> Result<SelectResult, GraphError>;
    fn query_ask(&self, sparql: &str) -> Result<AskResult, GraphError>;
    fn clear_graph(&self, graph_uri: &str) -> Result<usize, GraphError>;
    fn stats(&self) -> Result<GraphStats, GraphError>;
    fn load_ontology(&self, graph_uri: &str, source_text: &str, format: OntologyFormat) -> Result<ParsedOntology, GraphError>;
}

#[derive(Default)]
pub struct InMemoryGraphBackend {
    // graph URI -> triples. A triple's own `graph` field always matches
    // its key here; §6 never uses the default graph.
    graphs: Mutex<HashMap<String, Vec<mimir_domain::graph::Triple>>>,
}

impl InMemoryGraphBackend {
    pub fn new() -> Self {
        Self { graphs: Mutex::new(HashMap::new()) }
    }

    fn matches(pattern: &PatternTerm, term: &Term) -> bool {
        match pattern {
            PatternTerm::Var(_) => true,
            PatternTerm::Uri(u) => term.value == *u,
            PatternTerm::Literal(l) => term.value == *l,
        }
    }

    fn bind(binding: &mut Binding, pattern: &PatternTerm, term: &Term) {
        if let PatternTerm::Var(name) = pattern {
            binding.insert(name.clone(), term.clone());
        }
    }

    fn matching_rows(&self, selector: &GraphSelector, pattern: &query::TriplePattern) -> Vec<Binding> {
        let graphs = self.graphs.lock().unwrap();
        let target_graphs: Vec<&String> = match selector {
            GraphSelector::Fixed(uri) => graphs.keys().filter(|k| *k == uri).collect(),
            GraphSelector::Variable(_) => graphs.keys().collect(),
        };

        let mut rows = Vec::new();
        for g in target_graphs {
            let Some(triples) = graphs.get(g) else { continue };
            for t in triples {
                if Self::matches(&pattern.s, &t.subject)
                    && Self::matches(&pattern.p, &t.predicate)
                    && Self::matches(&pattern.o, &t.object)
                {
                    let mut binding = Binding::new();
                    Self::bind(&mut binding, &pattern.s, &t.subject);
                    Self::bind(&mut binding, &pattern.p, &t.predicate);
                    Self::bind(&mut binding, &pattern.o, &t.object);
                    if let GraphSelector::Variable(name) = selector {
                        binding.insert(name.clone(), Term::uri(g.clone()));
                    }
                    rows.push(binding);
                }
            }
        }
        rows
    }
}

impl GraphBackend for InMemoryGraphBackend {
    fn health(&self) -> Result<(), GraphError> {
        Ok(())
    }

    fn insert_triples(&self, triples: &[mimir_domain::graph::Triple]) -> Result<usize, GraphError> {
        let mut graphs = self.graphs.lock().unwrap();
        let mut inserted = 0;
        for t in triples {
            let graph = t.graph.clone().unwrap_or_else(|| "urn:mimir:default".to_string());
            graphs.entry(graph).or_default().push(t.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    fn delete_triples(
        &self,
        subject: Option<&str>,
        predicate: Option<&str>,
        object: Option<&str>,
    ) -> Result<usize, GraphError> {
        let mut graphs = self.graphs.lock().unwrap();
        let mut removed = 0;
        for triples in graphs.values_mut() {
            let before = triples.len();
            triples.retain(|t| {
                let s_ok = subject.map(|s| t.subject.value == s).unwrap_or(true);
                let p_ok = predicate.map(|p| t.predicate.value == p).unwrap_or(true);
                let o_ok = object.map(|o| t.object.value == o).unwrap_or(true);
                !(s_ok && p_ok && o_ok)
            });
            removed += before - triples.len();
        }
        Ok(removed)
    }

    fn query_select(&self, sparql: &str) -> Result<SelectResult, GraphError> {
        let start = Instant::now();
        let parsed = query::parse_select(sparql)?;
        let rows = self.matching_rows(&parsed.selector, &parsed.pattern);

        if let Some(alias) = parsed.count_alias {
            let mut binding = Binding::new();
            binding.insert(alias.clone(), Term::typed_literal(rows.len().to_string(), "http://www.w3.org/2001/XMLSchema#integer"));
            return Ok(SelectResult {
                variables: vec![alias],
                bindings: vec![binding],
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        let limited: Vec<Binding> = rows.into_iter().take(parsed.limit).collect();
        Ok(SelectResult {
            variables: parsed.projected_vars,
            bindings: limited,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn query_ask(&self, sparql: &str) -> Result<AskResult, GraphError> {
        let start = Instant::now();
        let parsed = query::parse_select(sparql)?;
        let rows = self.matching_rows(&parsed.selector, &parsed.pattern);
        Ok(AskResult { boolean: !rows.is_empty(), duration_ms: start.elapsed().as_millis() as u64 })
    }

    fn clear_graph(&self, graph_uri: &str) -> Result<usize, GraphError> {
        let mut graphs = self.graphs.lock().unwrap();
        Ok(graphs.remove(graph_uri).map(|v| v.len()).unwrap_or(0))
    }

    fn stats(&self) -> Result<GraphStats, GraphError> {
        let graphs = self.graphs.lock().unwrap();
        let mut subjects = HashSet::new();
        let mut predicates = HashSet::new();
        let mut objects = HashSet::new();
        let mut total = 0u64;
        let mut size_bytes = 0u64;
        for triples in graphs.values() {
            total += triples.len() as u64;
            for t in triples {
                subjects.insert(t.subject.value.clone());
                predicates.insert(t.predicate.value.clone());
                objects.insert(t.object.value.clone());
                size_bytes += (t.subject.value.len() + t.predicate.value.len() + t.object.value.len()) as u64;
            }
        }
        Ok(GraphStats {
            total_triples: total,
            subjects: subjects.len() as u64,
            predicates: predicates.len() as u64,
            objects: objects.len() as u64,
            named_graphs: graphs.len() as u64,
            size_bytes,
            last_updated: Some(Utc::now()),
        })
    }

    fn load_ontology(&self, graph_uri: &str, source_text: &str, format: OntologyFormat) -> Result<ParsedOntology, GraphError> {
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
    use mimir_domain::graph::Triple;

    fn triple(g: &str, s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::uri(s), Term::uri(p), Term::uri(o), Some(g.to_string()))
    }

    #[test]
    fn insert_then_count_round_trips() {
        let backend = InMemoryGraphBackend::new();
        let triples: Vec<_> = (0..5).map(|i| triple("g1", &format!("s{i}"), "p", "o")).collect();
        backend.insert_triples(&triples).unwrap();
        let result = backend
            .query_select("SELECT (COUNT(*) AS ?c) WHERE { GRAPH <g1> { ?s ?p ?o } }")
            .unwrap();
        assert_eq!(result.bindings[0].get("c").unwrap().value, "5");
    }

    #[test]
    fn clear_graph_removes_only_that_graph() {
        let backend = InMemoryGraphBackend::new();
        backend.insert_triples(&[triple("g1", "s", "p", "o")]).unwrap();
        backend.insert_triples(&[triple("g2", "s", "p", "o")]).unwrap();
        backend.clear_graph("g1").unwrap();
        let stats = backend.stats().unwrap();
        assert_eq!(stats.total_triples, 1);
    }
}
