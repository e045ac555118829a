//! RDF value types shared between the ontology layer, the graph backend,
//! and the NL query mediator (§4.9).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Uri,
    Literal,
    Bnode,
}

/// One RDF term, tagged the way a SPARQL binding reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    pub datatype: Option<String>,
    pub lang: Option<String>,
}

impl Term {
    pub fn uri(value: impl Into<String>) -> Self {
        Self { kind: TermKind::Uri, value: value.into(), datatype: None, lang: None }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self { kind: TermKind::Literal, value: value.into(), datatype: None, lang: None }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self { kind: TermKind::Literal, value: value.into(), datatype: Some(datatype.into()), lang: None }
    }

    pub fn bnode(value: impl Into<String>) -> Self {
        Self { kind: TermKind::Bnode, value: value.into(), datatype: None, lang: None }
    }
}

/// A single triple, optionally scoped to a named graph. Absent `graph` means
/// the default graph — which §6 says is never used by this system, so every
/// triple produced internally carries one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Option<String>,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Option<String>) -> Self {
        Self { subject, predicate, object, graph }
    }
}

/// One assignment of values to the variables of a SPARQL query.
pub type Binding = std::collections::BTreeMap<String, Term>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectResult {
    pub variables: Vec<String>,
    pub bindings: Vec<Binding>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResult {
    pub boolean: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphStats {
    pub total_triples: u64,
    pub subjects: u64,
    pub predicates: u64,
    pub objects: u64,
    pub named_graphs: u64,
    pub size_bytes: u64,
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}
