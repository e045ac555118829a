//! `TwinStore`: digital twins and their entity/relationship graphs (§4.10).
//!
//! A twin's entities and relationships are normalized into their own
//! tables rather than embedded as JSON blobs on `digital_twins`, so that
//! simulation runs can update a single entity's state without rewriting
//! the whole twin.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use mimir_core::{EventBus, SystemEvent};
use mimir_domain::twin::{DigitalTwin, Entity, EntityState, Relationship};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::pg::pool::{with_retry, ConnectionProvider};
use crate::schema::{digital_twins, twin_entities, twin_relationships};

#[derive(Queryable, Debug)]
struct TwinRow {
    id: Uuid,
    ontology_id: Uuid,
    name: String,
    model_type: String,
    base_state: serde_json::Value,
    created_at: DateTime<Utc>,
    #[allow(dead_code)]
    updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = digital_twins)]
struct NewTwinRow<'a> {
    id: Uuid,
    ontology_id: Uuid,
    name: &'a str,
    model_type: &'a str,
    base_state: &'a serde_json::Value,
}

#[derive(Queryable, Debug)]
struct EntityRow {
    #[allow(dead_code)]
    id: Uuid,
    #[allow(dead_code)]
    twin_id: Uuid,
    uri: String,
    type_uri: String,
    label: String,
    properties: serde_json::Value,
    state: serde_json::Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = twin_entities)]
struct NewEntityRow<'a> {
    id: Uuid,
    twin_id: Uuid,
    uri: &'a str,
    type_uri: &'a str,
    label: &'a str,
    properties: &'a serde_json::Value,
    state: &'a serde_json::Value,
}

#[derive(Queryable, Debug)]
struct RelationshipRow {
    id: Uuid,
    #[allow(dead_code)]
    twin_id: Uuid,
    source_uri: String,
    target_uri: String,
    type_uri: String,
    strength: f64,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = twin_relationships)]
struct NewRelationshipRow<'a> {
    id: Uuid,
    twin_id: Uuid,
    source_uri: &'a str,
    target_uri: &'a str,
    type_uri: &'a str,
    strength: f64,
}

pub struct TwinStore<P: ConnectionProvider> {
    provider: P,
    bus: Option<Arc<EventBus>>,
}

impl<P: ConnectionProvider> TwinStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, bus: None }
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Inserts the twin and its full entity/relationship graph in one
    /// transaction.
    pub fn create(&self, twin: &DigitalTwin) -> Result<(), PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    let base_state = serde_json::to_value(&twin.base_state).expect("serialize base_state");
                    diesel::insert_into(digital_twins::table)
                        .values(NewTwinRow {
                            id: twin.id,
                            ontology_id: twin.ontology_id,
                            name: &twin.name,
                            model_type: &twin.model_type,
                            base_state: &base_state,
                        })
                        .execute(tx)?;

                    for e in &twin.entities {
                        let properties = serde_json::to_value(&e.properties).expect("serialize properties");
                        let state = serde_json::to_value(&e.state).expect("serialize state");
                        diesel::insert_into(twin_entities::table)
                            .values(NewEntityRow {
                                id: Uuid::new_v4(),
                                twin_id: twin.id,
                                uri: &e.uri,
                                type_uri: &e.type_uri,
                                label: &e.label,
                                properties: &properties,
                                state: &state,
                            })
                            .execute(tx)?;
                    }

                    for r in &twin.relationships {
                        diesel::insert_into(twin_relationships::table)
                            .values(NewRelationshipRow {
                                id: r.id,
                                twin_id: twin.id,
                                source_uri: &r.source_uri,
                                target_uri: &r.target_uri,
                                type_uri: &r.type_uri,
                                strength: r.strength,
                            })
                            .execute(tx)?;
                    }

                    Ok::<(), diesel::result::Error>(())
                })
                .map_err(PersistenceError::from)
        })?;

        if let Some(bus) = &self.bus {
            bus.publish(SystemEvent::TwinCreated { twin_id: twin.id, ontology_id: twin.ontology_id });
        }
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<DigitalTwin, PersistenceError> {
        let (twin_row, entity_rows, relationship_rows): (TwinRow, Vec<EntityRow>, Vec<RelationshipRow>) = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let twin_row: TwinRow =
                digital_twins::table.filter(digital_twins::id.eq(id)).first(&mut conn).map_err(PersistenceError::from)?;
            let entity_rows: Vec<EntityRow> = twin_entities::table
                .filter(twin_entities::twin_id.eq(id))
                .load(&mut conn)
                .map_err(PersistenceError::from)?;
            let relationship_rows: Vec<RelationshipRow> = twin_relationships::table
                .filter(twin_relationships::twin_id.eq(id))
                .load(&mut conn)
                .map_err(PersistenceError::from)?;
            Ok((twin_row, entity_rows, relationship_rows))
        })?;

        let entities = entity_rows
            .into_iter()
            .map(|r| -> Result<Entity, PersistenceError> {
                Ok(Entity {
                    uri: r.uri,
                    type_uri: r.type_uri,
                    label: r.label,
                    properties: serde_json::from_value(r.properties)
                        .map_err(|e| PersistenceError::Unknown(format!("deserialize properties: {e}")))?,
                    state: serde_json::from_value::<EntityState>(r.state)
                        .map_err(|e| PersistenceError::Unknown(format!("deserialize state: {e}")))?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let relationships = relationship_rows
            .into_iter()
            .map(|r| Relationship { id: r.id, source_uri: r.source_uri, target_uri: r.target_uri, type_uri: r.type_uri, strength: r.strength })
            .collect();

        Ok(DigitalTwin {
            id: twin_row.id,
            ontology_id: twin_row.ontology_id,
            name: twin_row.name,
            model_type: twin_row.model_type,
            entities,
            relationships,
            base_state: serde_json::from_value(twin_row.base_state)
                .map_err(|e| PersistenceError::Unknown(format!("deserialize base_state: {e}")))?,
            created_at: twin_row.created_at,
        })
    }

    /// Persists the post-simulation state of one entity. Used by the
    /// simulation engine's snapshot/finalize path, not during a run
    /// itself (the engine keeps its working state in memory).
    pub fn update_entity_state(&self, twin_id: Uuid, uri: &str, state: &EntityState) -> Result<(), PersistenceError> {
        let state_json = serde_json::to_value(state).expect("serialize state");
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(twin_entities::table.filter(twin_entities::twin_id.eq(twin_id)).filter(twin_entities::uri.eq(uri)))
                .set((twin_entities::state.eq(&state_json), twin_entities::updated_at.eq(diesel::dsl::now)))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }
}
