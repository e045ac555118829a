//! `OntologyStore`: relational metadata plus the atomic-with-compensating-
//! delete contract between `ontologies` and the RDF graph store (§4.6).
//!
//! Loading an ontology writes one row and inserts its parsed triples into
//! the graph store under `Ontology::graph_uri_for(id)`. If the graph-store
//! write fails, the relational row is rolled back too — callers never see
//! a half-loaded ontology.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::warn;
use mimir_core::{EventBus, SystemEvent};
use mimir_domain::ontology::{Ontology, OntologyFormat, OntologyStatus, ParsedOntology};
use mimir_graph::GraphMediator;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::pg::pool::{with_retry, ConnectionProvider};
use crate::schema::ontologies;

fn format_str(f: OntologyFormat) -> &'static str {
    f.as_str()
}

fn format_from_str(s: &str) -> Result<OntologyFormat, PersistenceError> {
    match s {
        "turtle" => Ok(OntologyFormat::Turtle),
        "rdfxml" => Ok(OntologyFormat::RdfXml),
        "jsonld" => Ok(OntologyFormat::JsonLd),
        other => Err(PersistenceError::Unknown(format!("unrecognized ontology format {other}"))),
    }
}

fn status_str(s: OntologyStatus) -> &'static str {
    match s {
        OntologyStatus::Draft => "draft",
        OntologyStatus::Active => "active",
        OntologyStatus::Deprecated => "deprecated",
    }
}

fn status_from_str(s: &str) -> Result<OntologyStatus, PersistenceError> {
    match s {
        "draft" => Ok(OntologyStatus::Draft),
        "active" => Ok(OntologyStatus::Active),
        "deprecated" => Ok(OntologyStatus::Deprecated),
        other => Err(PersistenceError::Unknown(format!("unrecognized ontology status {other}"))),
    }
}

#[derive(Queryable, Debug)]
struct OntologyRow {
    id: Uuid,
    name: String,
    version: String,
    format: String,
    base_uri: String,
    source_text: String,
    graph_uri: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OntologyRow {
    fn into_domain(self) -> Result<Ontology, PersistenceError> {
        Ok(Ontology {
            id: self.id,
            name: self.name,
            version: self.version,
            format: format_from_str(&self.format)?,
            base_uri: self.base_uri,
            source_text: self.source_text,
            graph_uri: self.graph_uri,
            status: status_from_str(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = ontologies)]
struct NewOntologyRow<'a> {
    id: Uuid,
    name: &'a str,
    version: &'a str,
    format: &'a str,
    base_uri: &'a str,
    source_text: &'a str,
    graph_uri: &'a str,
    status: &'a str,
}

pub struct OntologyStore<P: ConnectionProvider> {
    provider: P,
    graph: Arc<GraphMediator>,
    bus: Option<Arc<EventBus>>,
}

impl<P: ConnectionProvider> OntologyStore<P> {
    pub fn new(provider: P, graph: Arc<GraphMediator>) -> Self {
        Self { provider, graph, bus: None }
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Inserts the metadata row and loads `source_text` into the graph
    /// store under a freshly minted graph URI. Rolls back the row if the
    /// graph-store insert fails (§4.6's atomicity requirement). §4.6 has
    /// no separate activation step, so the row is created `active`
    /// directly rather than left `draft` for a caller to promote.
    pub fn create(
        &self,
        name: &str,
        version: &str,
        format: OntologyFormat,
        base_uri: &str,
        source_text: &str,
    ) -> Result<(Ontology, ParsedOntology), PersistenceError> {
        let id = Uuid::new_v4();
        let graph_uri = Ontology::graph_uri_for(id);

        let row: OntologyRow = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(ontologies::table)
                .values(NewOntologyRow {
                    id,
                    name,
                    version,
                    format: format_str(format),
                    base_uri,
                    source_text,
                    graph_uri: &graph_uri,
                    status: status_str(OntologyStatus::Active),
                })
                .get_result(&mut conn)
                .map_err(PersistenceError::from)
        })?;

        let parsed = match self.graph.load_ontology(&graph_uri, source_text, format) {
            Ok(parsed) => parsed,
            Err(e) => {
                // compensating delete: undo the relational write
                let _ = with_retry(|| {
                    let mut conn = self.provider.connection()?;
                    diesel::delete(ontologies::table.filter(ontologies::id.eq(id)))
                        .execute(&mut conn)
                        .map_err(PersistenceError::from)
                });
                return Err(PersistenceError::Unknown(format!("graph store load failed, rolled back: {e}")));
            }
        };

        let ontology = row.into_domain()?;
        if let Some(bus) = &self.bus {
            bus.publish(SystemEvent::OntologyCreated { ontology_id: id });
        }
        Ok((ontology, parsed))
    }

    pub fn get(&self, id: Uuid) -> Result<Ontology, PersistenceError> {
        let row: OntologyRow = with_retry(|| {
            let mut conn = self.provider.connection()?;
            ontologies::table.filter(ontologies::id.eq(id)).first(&mut conn).map_err(PersistenceError::from)
        })?;
        row.into_domain()
    }

    pub fn list(&self) -> Result<Vec<Ontology>, PersistenceError> {
        let rows: Vec<OntologyRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            ontologies::table.order(ontologies::created_at.asc()).load(&mut conn).map_err(PersistenceError::from)
        })?;
        rows.into_iter().map(OntologyRow::into_domain).collect()
    }

    pub fn activate(&self, id: Uuid) -> Result<Ontology, PersistenceError> {
        self.set_status(id, OntologyStatus::Active)
    }

    /// Deprecates the ontology and clears its graph's triples (Open
    /// Question (a): deprecated ontologies must not leak into live
    /// SPARQL results).
    pub fn deprecate(&self, id: Uuid) -> Result<Ontology, PersistenceError> {
        let ontology = self.set_status(id, OntologyStatus::Deprecated)?;
        if let Err(e) = self.graph.clear_graph(&ontology.graph_uri) {
            warn!("deprecate({id}): clear_graph failed, metadata already marked deprecated: {e}");
        }
        if let Some(bus) = &self.bus {
            bus.publish(SystemEvent::OntologyDeprecated { ontology_id: id });
        }
        Ok(ontology)
    }

    fn set_status(&self, id: Uuid, status: OntologyStatus) -> Result<Ontology, PersistenceError> {
        let row: OntologyRow = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(ontologies::table.filter(ontologies::id.eq(id)))
                .set((ontologies::status.eq(status_str(status)), ontologies::updated_at.eq(diesel::dsl::now)))
                .get_result(&mut conn)
                .map_err(PersistenceError::from)
        })?;
        row.into_domain()
    }
}
