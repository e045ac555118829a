//! Entity/relationship/twin graph (§3, §4.10).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Operational,
    Degraded,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub status: EntityStatus,
    pub capacity: f64,
    pub utilization: f64,
    pub last_updated: DateTime<Utc>,
    pub flags: HashMap<String, bool>,
}

impl EntityState {
    pub fn default_operational(now: DateTime<Utc>) -> Self {
        Self { status: EntityStatus::Operational, capacity: 100.0, utilization: 0.0, last_updated: now, flags: HashMap::new() }
    }

    pub fn is_overloaded(&self) -> bool {
        self.utilization > self.capacity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub uri: String,
    pub type_uri: String,
    pub label: String,
    pub properties: HashMap<String, serde_json::Value>,
    pub state: EntityState,
}

impl Entity {
    /// Data-entity URI template from §6:
    /// `http://mimir-aip.io/data/{ontologyID}/{className}/{rowIndex}`.
    pub fn uri_for(ontology_id: Uuid, class_name: &str, row_index: usize) -> String {
        format!("http://mimir-aip.io/data/{ontology_id}/{class_name}/{row_index}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: Uuid,
    pub source_uri: String,
    pub target_uri: String,
    pub type_uri: String,
    pub strength: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitalTwin {
    pub id: Uuid,
    pub ontology_id: Uuid,
    pub name: String,
    pub model_type: String,
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub base_state: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl DigitalTwin {
    pub fn entity(&self, uri: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.uri == uri)
    }

    /// Outgoing relationships of `uri`, optionally filtered by `type_uri`.
    pub fn outgoing(&self, uri: &str, type_uri: Option<&str>) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.source_uri == uri && type_uri.map(|t| t == r.type_uri).unwrap_or(true))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overload_is_representable() {
        let mut s = EntityState::default_operational(Utc::now());
        s.utilization = 150.0;
        assert!(s.is_overloaded());
    }
}
