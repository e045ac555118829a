//! `TwinBuilder` (§4.10): materializes a `DigitalTwin` from a parsed
//! ontology, optionally seeded with sampled data rows per class. Entity and
//! relationship ids are derived deterministically (UUIDv5 over stable
//! inputs) so the same ontology + data always builds the same twin.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mimir_domain::ontology::{ParsedOntology, PropertyKind};
use mimir_domain::twin::{DigitalTwin, Entity, EntityState, Relationship};
use serde_json::Value;
use uuid::Uuid;

/// Representative entities created for a class with no sampled data.
const DEFAULT_ENTITIES_PER_CLASS: usize = 3;

/// Fixed relationship strength assigned to every object-property edge
/// (§4.10 doesn't vary this by property, only by presence).
const DEFAULT_RELATIONSHIP_STRENGTH: f64 = 0.8;

fn class_label_slug(label: &str) -> String {
    label.chars().map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' }).collect()
}

fn deterministic_id(parts: &[&str]) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, parts.join("|").as_bytes())
}

/// Builds a `DigitalTwin` for `ontology_id` from `parsed`'s classes and
/// object properties. `class_rows` maps a class URI to sampled data rows for
/// that class (row order determines entity index); classes absent from the
/// map get `DEFAULT_ENTITIES_PER_CLASS` default-state entities instead.
pub fn build_twin(
    ontology_id: Uuid,
    name: &str,
    model_type: &str,
    parsed: &ParsedOntology,
    class_rows: &HashMap<String, Vec<HashMap<String, Value>>>,
    now: DateTime<Utc>,
) -> DigitalTwin {
    let mut entities = Vec::new();

    for class in &parsed.classes {
        let slug = class_label_slug(&class.label);
        match class_rows.get(&class.uri).filter(|rows| !rows.is_empty()) {
            Some(rows) => {
                for (row_index, row) in rows.iter().enumerate() {
                    entities.push(Entity {
                        uri: Entity::uri_for(ontology_id, &slug, row_index),
                        type_uri: class.uri.clone(),
                        label: format!("{} {row_index}", class.label),
                        properties: row.clone(),
                        state: EntityState::default_operational(now),
                    });
                }
            }
            None => {
                for row_index in 0..DEFAULT_ENTITIES_PER_CLASS {
                    entities.push(Entity {
                        uri: Entity::uri_for(ontology_id, &slug, row_index),
                        type_uri: class.uri.clone(),
                        label: format!("{} {row_index}", class.label),
                        properties: HashMap::new(),
                        state: EntityState::default_operational(now),
                    });
                }
            }
        }
    }

    let mut relationships = Vec::new();
    for property in &parsed.properties {
        if property.kind != PropertyKind::Object {
            continue;
        }
        let (Some(domain), Some(range)) = (&property.domain, &property.range) else {
            continue;
        };
        let sources: Vec<&Entity> = entities.iter().filter(|e| &e.type_uri == domain).collect();
        let targets: Vec<&Entity> = entities.iter().filter(|e| &e.type_uri == range).collect();
        if sources.is_empty() || targets.is_empty() {
            continue;
        }
        for (i, source) in sources.iter().enumerate() {
            let target = targets[i % targets.len()];
            if source.uri == target.uri {
                continue;
            }
            relationships.push(Relationship {
                id: deterministic_id(&[&source.uri, &target.uri, &property.uri]),
                source_uri: source.uri.clone(),
                target_uri: target.uri.clone(),
                type_uri: property.uri.clone(),
                strength: DEFAULT_RELATIONSHIP_STRENGTH,
            });
        }
    }

    DigitalTwin {
        id: deterministic_id(&[&ontology_id.to_string(), name, model_type]),
        ontology_id,
        name: name.to_string(),
        model_type: model_type.to_string(),
        entities,
        relationships,
        base_state: HashMap::new(),
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_domain::ontology::{OntologyClass, OntologyProperty};

    fn parsed() -> ParsedOntology {
        ParsedOntology {
            classes: vec![
                OntologyClass { uri: "urn:Plant".into(), label: "Plant".into() },
                OntologyClass { uri: "urn:Line".into(), label: "Line".into() },
            ],
            properties: vec![OntologyProperty {
                uri: "urn:hasLine".into(),
                label: "hasLine".into(),
                kind: PropertyKind::Object,
                domain: Some("urn:Plant".into()),
                range: Some("urn:Line".into()),
            }],
            triples: vec![],
        }
    }

    #[test]
    fn default_entities_created_without_data() {
        let twin = build_twin(Uuid::nil(), "t", "plant", &parsed(), &HashMap::new(), Utc::now());
        assert_eq!(twin.entities.iter().filter(|e| e.type_uri == "urn:Plant").count(), DEFAULT_ENTITIES_PER_CLASS);
    }

    #[test]
    fn object_property_creates_relationships_between_matching_entities() {
        let twin = build_twin(Uuid::nil(), "t", "plant", &parsed(), &HashMap::new(), Utc::now());
        assert!(!twin.relationships.is_empty());
        assert!(twin.relationships.iter().all(|r| r.type_uri == "urn:hasLine"));
    }

    #[test]
    fn build_is_deterministic_for_fixed_inputs() {
        let now = Utc::now();
        let a = build_twin(Uuid::nil(), "t", "plant", &parsed(), &HashMap::new(), now);
        let b = build_twin(Uuid::nil(), "t", "plant", &parsed(), &HashMap::new(), now);
        assert_eq!(a.id, b.id);
        assert_eq!(a.relationships.len(), b.relationships.len());
        assert_eq!(a.relationships[0].id, b.relationships[0].id);
    }
}
