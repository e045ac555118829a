//! `ImpactAnalyzer` (§4.13): summarizes a completed (or cancelled) run into
//! an overall impact level, the entities it actually touched, capacity
//! bottlenecks, a bounded risk score, and a handful of heuristic follow-up
//! questions an analyst would naturally ask next.

use std::collections::{HashMap, HashSet};

use mimir_domain::simulation::{LoggedEvent, Severity, SimulationRun};
use mimir_domain::twin::DigitalTwin;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    None,
    Low,
    Medium,
    High,
    Severe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedEntity {
    pub uri: String,
    pub max_severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactReport {
    pub overall_impact: ImpactLevel,
    pub affected_entities: Vec<AffectedEntity>,
    pub bottlenecks: Vec<String>,
    pub risk_score: f64,
    pub suggested_questions: Vec<String>,
}

/// A propagated event always appears in `events_log` after the parent that
/// spawned it (its step is the parent's step plus a nonnegative delay), so
/// a single left-to-right pass can compute each event's derivation depth.
fn max_derivation_depth(events_log: &[LoggedEvent]) -> u32 {
    let mut depth_of: HashMap<Uuid, u32> = HashMap::new();
    let mut max_depth = 0u32;
    for logged in events_log {
        let depth = match logged.derived_from {
            Some(parent_id) => depth_of.get(&parent_id).copied().unwrap_or(0) + 1,
            None => 0,
        };
        depth_of.insert(logged.event.id, depth);
        max_depth = max_depth.max(depth);
    }
    max_depth
}

fn bottlenecks(run: &SimulationRun) -> Vec<String> {
    let mut overloaded: HashSet<String> = HashSet::new();
    for snapshot in &run.snapshots {
        for (uri, state) in &snapshot.state {
            if state.is_overloaded() {
                overloaded.insert(uri.clone());
            }
        }
    }
    let mut result: Vec<String> = overloaded.into_iter().collect();
    result.sort();
    result
}

fn overall_impact(affected_fraction: f64, max_severity_weight: f64) -> ImpactLevel {
    if affected_fraction == 0.0 {
        return ImpactLevel::None;
    }
    let combined = affected_fraction * 0.5 + max_severity_weight * 0.5;
    if combined < 0.15 {
        ImpactLevel::Low
    } else if combined < 0.35 {
        ImpactLevel::Medium
    } else if combined < 0.6 {
        ImpactLevel::High
    } else {
        ImpactLevel::Severe
    }
}

pub fn analyze_impact(run: &SimulationRun, twin: &DigitalTwin, propagation_max_depth: u32) -> ImpactReport {
    let mut max_severity_by_entity: HashMap<String, Severity> = HashMap::new();
    for logged in &run.events_log {
        let entry = max_severity_by_entity.entry(logged.event.target_uri.clone()).or_insert(logged.event.severity);
        if logged.event.severity > *entry {
            *entry = logged.event.severity;
        }
    }

    let mut affected_entities: Vec<AffectedEntity> =
        max_severity_by_entity.iter().map(|(uri, severity)| AffectedEntity { uri: uri.clone(), max_severity: *severity }).collect();
    affected_entities.sort_by(|a, b| a.uri.cmp(&b.uri));

    let affected_fraction = if twin.entities.is_empty() { 0.0 } else { affected_entities.len() as f64 / twin.entities.len() as f64 };
    let max_severity_weight = affected_entities.iter().map(|a| a.max_severity.weight()).fold(0.0_f64, f64::max);
    let depth_reached = max_derivation_depth(&run.events_log);
    let depth_fraction = if propagation_max_depth == 0 { 0.0 } else { (depth_reached as f64 / propagation_max_depth as f64).min(1.0) };

    let risk_score = (affected_fraction * 0.4 + max_severity_weight * 0.4 + depth_fraction * 0.2).clamp(0.0, 1.0);
    let bottleneck_uris = bottlenecks(run);

    let mut suggested_questions = Vec::new();
    if let Some(worst) = affected_entities.iter().max_by_key(|a| a.max_severity) {
        suggested_questions.push(format!("What happens downstream if {} stays degraded past this run's window?", worst.uri));
    }
    for uri in bottleneck_uris.iter().take(3) {
        suggested_questions.push(format!("Which upstream entities should absorb load before {uri} hits capacity again?"));
    }
    if run.metrics.propagations_dropped > 0 {
        suggested_questions.push(format!("Would raising the propagation depth beyond {propagation_max_depth} change the outcome?"));
    }

    ImpactReport {
        overall_impact: overall_impact(affected_fraction, max_severity_weight),
        affected_entities,
        bottlenecks: bottleneck_uris,
        risk_score,
        suggested_questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_domain::simulation::{EventKind, RunMetrics, RunStatus, SimulationEvent};
    use mimir_domain::twin::{Entity, EntityState};
    use chrono::Utc;
    use std::collections::HashMap as Map;

    fn twin() -> DigitalTwin {
        let now = Utc::now();
        let e = Entity { uri: "urn:e1".into(), type_uri: "urn:T".into(), label: "e1".into(), properties: Map::new(), state: EntityState::default_operational(now) };
        DigitalTwin { id: Uuid::new_v4(), ontology_id: Uuid::new_v4(), name: "t".into(), model_type: "m".into(), entities: vec![e], relationships: vec![], base_state: Map::new(), created_at: now }
    }

    fn run_with_event(severity: Severity) -> SimulationRun {
        let now = Utc::now();
        let event = SimulationEvent { id: Uuid::new_v4(), kind: EventKind::ProcessFailure, target_uri: "urn:e1".into(), step: 0, parameters: Map::new(), severity, propagation: vec![] };
        SimulationRun {
            id: Uuid::new_v4(),
            twin_id: Uuid::new_v4(),
            scenario_id: Uuid::new_v4(),
            status: RunStatus::Completed,
            start_time: now,
            end_time: Some(now),
            metrics: RunMetrics::default(),
            events_log: vec![mimir_domain::simulation::LoggedEvent { event, applied_step: 0, derived_from: None }],
            snapshots: vec![],
        }
    }

    #[test]
    fn no_events_means_no_impact() {
        let run = SimulationRun { events_log: vec![], ..run_with_event(Severity::Low) };
        let report = analyze_impact(&run, &twin(), 3);
        assert_eq!(report.overall_impact, ImpactLevel::None);
    }

    #[test]
    fn high_severity_full_coverage_is_severe() {
        let run = run_with_event(Severity::Critical);
        let report = analyze_impact(&run, &twin(), 3);
        assert_eq!(report.overall_impact, ImpactLevel::Severe);
        assert_eq!(report.affected_entities.len(), 1);
    }
}
