//! `ScenarioAuthor` (§4.11): emits three starter scenarios for a freshly
//! built twin — Baseline, Data-quality, and Capacity — so a new twin always
//! has something to simulate before an analyst hand-authors anything.

use chrono::{DateTime, Utc};
use mimir_domain::simulation::{EventKind, PropagationRule, Severity, SimulationEvent, SimulationScenario};
use mimir_domain::twin::DigitalTwin;
use uuid::Uuid;

const BASELINE_DURATION: u32 = 30;
const DATA_QUALITY_DURATION: u32 = 40;
const CAPACITY_DURATION: u32 = 50;

/// Fraction of a twin's entities the Data-quality scenario touches.
const DATA_QUALITY_AFFECTED_FRACTION: f64 = 0.3;
const DATA_QUALITY_PROPAGATION_IMPACT: f64 = 0.6;
const DATA_QUALITY_PROPAGATION_DELAY: u32 = 2;

fn scenario_id(twin_id: Uuid, scenario_type: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{twin_id}|{scenario_type}").as_bytes())
}

fn propagation_for(twin: &DigitalTwin, target_uri: &str) -> Vec<PropagationRule> {
    let mut seen = Vec::new();
    let mut rules = Vec::new();
    for rel in twin.outgoing(target_uri, None) {
        if !seen.contains(&rel.type_uri) {
            seen.push(rel.type_uri.clone());
            rules.push(PropagationRule {
                relationship_type: rel.type_uri.clone(),
                impact_factor: DATA_QUALITY_PROPAGATION_IMPACT,
                delay_steps: DATA_QUALITY_PROPAGATION_DELAY,
            });
        }
    }
    rules
}

fn baseline(twin: &DigitalTwin, now: DateTime<Utc>) -> SimulationScenario {
    SimulationScenario {
        id: scenario_id(twin.id, "baseline"),
        twin_id: twin.id,
        name: "Baseline".to_string(),
        scenario_type: "baseline".to_string(),
        events: Vec::new(),
        duration: BASELINE_DURATION,
        created_at: now,
    }
}

fn data_quality(twin: &DigitalTwin, now: DateTime<Utc>) -> SimulationScenario {
    let mut sorted: Vec<&str> = twin.entities.iter().map(|e| e.uri.as_str()).collect();
    sorted.sort_unstable();
    let affected_count = ((sorted.len() as f64) * DATA_QUALITY_AFFECTED_FRACTION).ceil() as usize;
    let affected: Vec<&str> = sorted.into_iter().take(affected_count.max(1).min(twin.entities.len().max(1))).collect();

    let mut events = Vec::new();
    for &uri in &affected {
        events.push(SimulationEvent {
            id: Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{uri}|resource_unavailable").as_bytes()),
            kind: EventKind::ResourceUnavailable,
            target_uri: uri.to_string(),
            step: 5,
            parameters: Default::default(),
            severity: Severity::High,
            propagation: propagation_for(twin, uri),
        });
        events.push(SimulationEvent {
            id: Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{uri}|process_failure").as_bytes()),
            kind: EventKind::ProcessFailure,
            target_uri: uri.to_string(),
            step: 15,
            parameters: Default::default(),
            severity: Severity::Medium,
            propagation: propagation_for(twin, uri),
        });
        events.push(SimulationEvent {
            id: Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{uri}|resource_available").as_bytes()),
            kind: EventKind::ResourceAvailable,
            target_uri: uri.to_string(),
            step: 25,
            parameters: Default::default(),
            severity: Severity::Low,
            propagation: propagation_for(twin, uri),
        });
    }

    // Optional policy-constraint follow-up: included only when the scenario
    // already touches more than one entity, so a single-entity twin doesn't
    // get a fourth event stacked on the same node.
    if let Some(&last) = affected.last() {
        if affected.len() > 1 {
            events.push(SimulationEvent {
                id: Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{last}|policy_constraint_add").as_bytes()),
                kind: EventKind::PolicyConstraintAdd,
                target_uri: last.to_string(),
                step: 30,
                parameters: [("capacity_impact".to_string(), 0.9)].into_iter().collect(),
                severity: Severity::Medium,
                propagation: propagation_for(twin, last),
            });
        }
    }

    SimulationScenario {
        id: scenario_id(twin.id, "data_quality"),
        twin_id: twin.id,
        name: "Data quality".to_string(),
        scenario_type: "data_quality".to_string(),
        events,
        duration: DATA_QUALITY_DURATION,
        created_at: now,
    }
}

fn capacity(twin: &DigitalTwin, now: DateTime<Utc>) -> SimulationScenario {
    if twin.entities.is_empty() {
        return SimulationScenario {
            id: scenario_id(twin.id, "capacity"),
            twin_id: twin.id,
            name: "Capacity".to_string(),
            scenario_type: "capacity".to_string(),
            events: Vec::new(),
            duration: CAPACITY_DURATION,
            created_at: now,
        };
    }

    let mut sorted: Vec<&str> = twin.entities.iter().map(|e| e.uri.as_str()).collect();
    sorted.sort_unstable();
    let first = sorted[0];
    let middle = sorted[sorted.len() / 2];
    let last = sorted[sorted.len() - 1];

    // Cycles first/middle/last across the six scripted beats in order.
    let targets = [first, middle, last, first, middle, last];
    let steps = [5u32, 15, 20, 25, 35, 45];
    let kinds = [
        EventKind::DemandSurge,
        EventKind::DemandSurge,
        EventKind::ResourceCapacityChange,
        EventKind::ExternalMarketShift,
        EventKind::ProcessOptimization,
        EventKind::DemandDrop,
    ];
    let params: [(&str, f64); 6] =
        [("increase_factor", 1.8), ("increase_factor", 2.2), ("multiplier", 0.7), ("demand_impact", 1.5), ("efficiency_gain", 0.25), ("decrease_factor", 0.6)];

    let events = (0..6)
        .map(|i| SimulationEvent {
            id: Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{}|{:?}|{}", targets[i], kinds[i], steps[i]).as_bytes()),
            kind: kinds[i],
            target_uri: targets[i].to_string(),
            step: steps[i],
            parameters: [(params[i].0.to_string(), params[i].1)].into_iter().collect(),
            severity: Severity::Medium,
            propagation: Vec::new(),
        })
        .collect();

    SimulationScenario {
        id: scenario_id(twin.id, "capacity"),
        twin_id: twin.id,
        name: "Capacity".to_string(),
        scenario_type: "capacity".to_string(),
        events,
        duration: CAPACITY_DURATION,
        created_at: now,
    }
}

pub fn author_scenarios(twin: &DigitalTwin, now: DateTime<Utc>) -> Vec<SimulationScenario> {
    vec![baseline(twin, now), data_quality(twin, now), capacity(twin, now)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_domain::twin::{Entity, EntityState};
    use std::collections::HashMap;

    fn twin_with_entities(n: usize) -> DigitalTwin {
        let now = Utc::now();
        let entities = (0..n)
            .map(|i| Entity {
                uri: format!("urn:e{i}"),
                type_uri: "urn:Thing".to_string(),
                label: format!("e{i}"),
                properties: HashMap::new(),
                state: EntityState::default_operational(now),
            })
            .collect();
        DigitalTwin { id: Uuid::new_v4(), ontology_id: Uuid::new_v4(), name: "t".into(), model_type: "m".into(), entities, relationships: vec![], base_state: HashMap::new(), created_at: now }
    }

    #[test]
    fn baseline_has_no_events() {
        let scenarios = author_scenarios(&twin_with_entities(5), Utc::now());
        assert!(scenarios[0].events.is_empty());
        assert_eq!(scenarios[0].duration, BASELINE_DURATION);
    }

    #[test]
    fn data_quality_touches_fraction_of_entities() {
        let scenarios = author_scenarios(&twin_with_entities(10), Utc::now());
        let dq = &scenarios[1];
        let touched: std::collections::HashSet<_> = dq.events.iter().map(|e| e.target_uri.clone()).collect();
        assert!(touched.len() <= 4);
        assert!(dq.validate().is_ok());
    }

    #[test]
    fn capacity_events_stay_within_duration() {
        let scenarios = author_scenarios(&twin_with_entities(6), Utc::now());
        let cap = &scenarios[2];
        assert!(cap.validate().is_ok());
        assert_eq!(cap.events.len(), 6);
    }
}
