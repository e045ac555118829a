//! Ontology metadata (§3, §6).
//!
//! An `Ontology` row is immutable once `active`: further edits must create a
//! new version rather than mutate `source_text` in place. Uniqueness of
//! `(name, version)` and of `graph_uri` among active ontologies is enforced
//! by `OntologyStore`, not here — this type only carries the shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OntologyFormat {
    Turtle,
    RdfXml,
    JsonLd,
}

impl OntologyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OntologyFormat::Turtle => "turtle",
            OntologyFormat::RdfXml => "rdfxml",
            OntologyFormat::JsonLd => "jsonld",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OntologyStatus {
    Draft,
    Active,
    Deprecated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ontology {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub format: OntologyFormat,
    pub base_uri: String,
    pub source_text: String,
    pub graph_uri: String,
    pub status: OntologyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ontology {
    /// Graph URI template fixed by §6: `http://mimir.ai/ontology/{id}`.
    pub fn graph_uri_for(id: Uuid) -> String {
        format!("http://mimir.ai/ontology/{id}")
    }

    /// The `(name, version)` pair OntologyStore enforces uniqueness on.
    pub fn identity_key(&self) -> (String, String) {
        (self.name.clone(), self.version.clone())
    }

    pub fn is_immutable(&self) -> bool {
        matches!(self.status, OntologyStatus::Active | OntologyStatus::Deprecated)
    }
}

/// A parsed class or property declaration extracted while loading an
/// ontology's source text. Used by `SchemaInference` (to bind inferred
/// classes to declared ones) and `TwinBuilder` (to instantiate entities).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OntologyClass {
    pub uri: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Datatype,
    Object,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OntologyProperty {
    pub uri: String,
    pub label: String,
    pub kind: PropertyKind,
    pub domain: Option<String>,
    pub range: Option<String>,
}

/// Result of parsing an ontology's source text, prior to persistence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParsedOntology {
    pub classes: Vec<OntologyClass>,
    pub properties: Vec<OntologyProperty>,
    /// Flattened subject/predicate/object triples ready for graph insertion.
    pub triples: Vec<crate::graph::Triple>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_uri_follows_template() {
        let id = Uuid::nil();
        assert_eq!(Ontology::graph_uri_for(id), format!("http://mimir.ai/ontology/{id}"));
    }
}
