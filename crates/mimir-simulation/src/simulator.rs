//! `Simulator` (§4.12): replays a `SimulationScenario` against a
//! `DigitalTwin` step by step, applying `mimir_policies::apply_event` to
//! each due event and scheduling propagated derivatives on outgoing
//! relationships. Deterministic for a fixed twin/scenario/config — no
//! wall-clock reads or randomness in the stepping loop itself.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use chrono::{DateTime, Duration, Utc};
use mimir_core::CancellationToken;
use mimir_domain::simulation::{LoggedEvent, RunMetrics, RunStatus, SimulationEvent, SimulationScenario, Snapshot};
use mimir_domain::twin::{DigitalTwin, EntityState};
use mimir_domain::DomainError;
use mimir_policies::apply_event;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Independent cap on the number of steps walked, regardless of
    /// `scenario.duration`; reaching it before the queue drains is a clean
    /// (non-error) termination with `metrics.incomplete = true`.
    pub max_steps: u32,
    /// Snapshot every `snapshot_interval` steps, plus always at step 0 and
    /// at `scenario.duration`.
    pub snapshot_interval: u32,
    /// Propagated events beyond this derivation depth are dropped instead
    /// of scheduled; each drop increments `metrics.propagations_dropped`.
    pub propagation_max_depth: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { max_steps: u32::MAX, snapshot_interval: 10, propagation_max_depth: 3 }
    }
}

struct HeapEntry {
    step: u32,
    order: u64,
    depth: u32,
    derived_from: Option<Uuid>,
    event: SimulationEvent,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.step == other.step && self.order == other.order
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// `BinaryHeap` is a max-heap; reversing `(step, order)` turns it into a
// min-heap over (step, insertion order) as §4.12 requires.
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.step.cmp(&self.step).then_with(|| other.order.cmp(&self.order))
    }
}

pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Runs `scenario` against `twin`, producing a complete `SimulationRun`.
    /// `run_id` and `start_time` are supplied by the caller (persistence
    /// layer) rather than generated here, keeping this function a pure
    /// computation of its inputs.
    pub fn run(
        &self,
        run_id: Uuid,
        twin: &DigitalTwin,
        scenario: &SimulationScenario,
        start_time: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> mimir_domain::simulation::SimulationRun {
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
        let mut order_counter: u64 = 0;
        for event in &scenario.events {
            heap.push(HeapEntry { step: event.step, order: order_counter, depth: 0, derived_from: None, event: event.clone() });
            order_counter += 1;
        }

        let mut state: HashMap<String, EntityState> = twin.entities.iter().map(|e| (e.uri.clone(), e.state.clone())).collect();
        let mut metrics = RunMetrics::default();
        let mut events_log: Vec<LoggedEvent> = Vec::new();
        let mut snapshots: Vec<Snapshot> = Vec::new();
        let mut status = RunStatus::Running;
        let mut failure: Option<DomainError> = None;

        let effective_cap = scenario.duration.min(self.config.max_steps);
        let mut current_step = 0u32;

        loop {
            if cancel.is_cancelled() {
                status = RunStatus::Cancelled;
                break;
            }

            let mut due = Vec::new();
            while let Some(top) = heap.peek() {
                if top.step == current_step {
                    due.push(heap.pop().unwrap());
                } else {
                    break;
                }
            }

            let mut step_failed = false;
            for entry in due {
                let Some(current) = state.get(&entry.event.target_uri) else {
                    failure = Some(DomainError::invariant(format!("event targets unknown entity {}", entry.event.target_uri)));
                    step_failed = true;
                    break;
                };
                let next = apply_event(current, &entry.event);
                state.insert(entry.event.target_uri.clone(), next);
                metrics.events_processed += 1;
                events_log.push(LoggedEvent { event: entry.event.clone(), applied_step: current_step, derived_from: entry.derived_from });

                if entry.event.propagation.is_empty() {
                    continue;
                }
                if entry.depth >= self.config.propagation_max_depth {
                    metrics.propagations_dropped += entry.event.propagation.len() as u64;
                    continue;
                }
                for rule in &entry.event.propagation {
                    for rel in twin.outgoing(&entry.event.target_uri, Some(&rule.relationship_type)) {
                        let scaled_params: HashMap<String, f64> =
                            entry.event.parameters.iter().map(|(k, v)| (k.clone(), v * rule.impact_factor * rel.strength)).collect();
                        let derived = SimulationEvent {
                            id: Uuid::new_v4(),
                            kind: entry.event.kind,
                            target_uri: rel.target_uri.clone(),
                            step: current_step + rule.delay_steps,
                            parameters: scaled_params,
                            severity: entry.event.severity,
                            propagation: entry.event.propagation.clone(),
                        };
                        if derived.step <= scenario.duration {
                            heap.push(HeapEntry {
                                step: derived.step,
                                order: order_counter,
                                depth: entry.depth + 1,
                                derived_from: Some(entry.event.id),
                                event: derived,
                            });
                            order_counter += 1;
                        }
                    }
                }
            }

            if step_failed {
                status = RunStatus::Failed;
                break;
            }

            update_global_metrics(&mut metrics, &state, current_step + 1);

            if current_step == 0 || (self.config.snapshot_interval > 0 && current_step % self.config.snapshot_interval == 0) || current_step == scenario.duration {
                snapshots.push(Snapshot {
                    step: current_step,
                    timestamp: start_time + Duration::seconds(current_step as i64),
                    state: state.clone(),
                    global_metrics: metrics.clone(),
                });
            }

            if current_step >= effective_cap {
                if effective_cap < scenario.duration {
                    metrics.incomplete = true;
                }
                break;
            }
            current_step += 1;
        }

        if status == RunStatus::Running {
            status = RunStatus::Completed;
        }
        if let Some(reason) = &failure {
            log::warn!("simulation run {run_id} failed: {reason}");
        }

        mimir_domain::simulation::SimulationRun {
            id: run_id,
            twin_id: twin.id,
            scenario_id: scenario.id,
            status,
            start_time,
            end_time: Some(start_time + Duration::seconds(current_step as i64)),
            metrics,
            events_log,
            snapshots,
        }
    }
}

fn update_global_metrics(metrics: &mut RunMetrics, state: &HashMap<String, EntityState>, total_steps: u32) {
    use mimir_domain::twin::EntityStatus;

    metrics.total_steps = total_steps;
    if state.is_empty() {
        metrics.average_utilization = 0.0;
        metrics.degraded_count = 0;
        metrics.unavailable_count = 0;
        metrics.stable = true;
        return;
    }
    let sum: f64 = state.values().map(|s| s.utilization).sum();
    metrics.average_utilization = sum / state.len() as f64;
    metrics.degraded_count = state.values().filter(|s| s.status == EntityStatus::Degraded).count() as u32;
    metrics.unavailable_count = state.values().filter(|s| s.status == EntityStatus::Unavailable).count() as u32;
    metrics.stable = metrics.degraded_count == 0 && metrics.unavailable_count == 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_domain::simulation::{EventKind, PropagationRule, Severity};
    use mimir_domain::twin::Entity;

    fn twin_two_entities() -> DigitalTwin {
        let now = Utc::now();
        let e1 = Entity { uri: "urn:e1".into(), type_uri: "urn:T".into(), label: "e1".into(), properties: HashMap::new(), state: EntityState::default_operational(now) };
        let e2 = Entity { uri: "urn:e2".into(), type_uri: "urn:T".into(), label: "e2".into(), properties: HashMap::new(), state: EntityState::default_operational(now) };
        let rel = mimir_domain::twin::Relationship { id: Uuid::new_v4(), source_uri: "urn:e1".into(), target_uri: "urn:e2".into(), type_uri: "urn:feeds".into(), strength: 1.0 };
        DigitalTwin { id: Uuid::new_v4(), ontology_id: Uuid::new_v4(), name: "t".into(), model_type: "m".into(), entities: vec![e1, e2], relationships: vec![rel], base_state: HashMap::new(), created_at: now }
    }

    #[test]
    fn zero_event_scenario_produces_expected_snapshot_count() {
        let twin = twin_two_entities();
        let scenario = SimulationScenario { id: Uuid::new_v4(), twin_id: twin.id, name: "baseline".into(), scenario_type: "baseline".into(), events: vec![], duration: 30, created_at: Utc::now() };
        let sim = Simulator::new(SimulatorConfig { snapshot_interval: 10, ..Default::default() });
        let run = sim.run(Uuid::new_v4(), &twin, &scenario, Utc::now(), &CancellationToken::new());
        assert_eq!(run.status, RunStatus::Completed);
        // steps 0,10,20,30 -> ceil(30/10)+1 = 4 snapshots
        assert_eq!(run.snapshots.len(), 4);
        assert_eq!(run.metrics.events_processed, 0);
    }

    #[test]
    fn max_steps_zero_yields_incomplete_single_snapshot() {
        let twin = twin_two_entities();
        let scenario = SimulationScenario { id: Uuid::new_v4(), twin_id: twin.id, name: "s".into(), scenario_type: "s".into(), events: vec![], duration: 10, created_at: Utc::now() };
        let sim = Simulator::new(SimulatorConfig { max_steps: 0, ..Default::default() });
        let run = sim.run(Uuid::new_v4(), &twin, &scenario, Utc::now(), &CancellationToken::new());
        assert_eq!(run.snapshots.len(), 1);
        assert!(run.metrics.incomplete);
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[test]
    fn propagation_schedules_derived_event_on_outgoing_relationship() {
        let twin = twin_two_entities();
        let event = SimulationEvent {
            id: Uuid::new_v4(),
            kind: EventKind::DemandSurge,
            target_uri: "urn:e1".into(),
            step: 0,
            parameters: [("increase_factor".to_string(), 2.0)].into_iter().collect(),
            severity: Severity::Medium,
            propagation: vec![PropagationRule { relationship_type: "urn:feeds".into(), impact_factor: 0.5, delay_steps: 1 }],
        };
        let scenario = SimulationScenario { id: Uuid::new_v4(), twin_id: twin.id, name: "s".into(), scenario_type: "s".into(), events: vec![event], duration: 5, created_at: Utc::now() };
        let sim = Simulator::new(SimulatorConfig { snapshot_interval: 1, ..Default::default() });
        let run = sim.run(Uuid::new_v4(), &twin, &scenario, Utc::now(), &CancellationToken::new());
        assert_eq!(run.events_log.len(), 2);
        assert_eq!(run.events_log[1].applied_step, 1);
        assert!(run.events_log[1].derived_from.is_some());
    }

    #[test]
    fn nonexistent_entity_target_fails_the_run() {
        let twin = twin_two_entities();
        let event = SimulationEvent {
            id: Uuid::new_v4(),
            kind: EventKind::ResourceUnavailable,
            target_uri: "urn:missing".into(),
            step: 0,
            parameters: HashMap::new(),
            severity: Severity::High,
            propagation: vec![],
        };
        let scenario = SimulationScenario { id: Uuid::new_v4(), twin_id: twin.id, name: "s".into(), scenario_type: "s".into(), events: vec![event], duration: 5, created_at: Utc::now() };
        let sim = Simulator::new(SimulatorConfig::default());
        let run = sim.run(Uuid::new_v4(), &twin, &scenario, Utc::now(), &CancellationToken::new());
        assert_eq!(run.status, RunStatus::Failed);
    }

    #[test]
    fn determinism_for_fixed_inputs() {
        let twin = twin_two_entities();
        let scenario = SimulationScenario { id: Uuid::new_v4(), twin_id: twin.id, name: "s".into(), scenario_type: "s".into(), events: vec![], duration: 20, created_at: Utc::now() };
        let sim = Simulator::new(SimulatorConfig::default());
        let start = Utc::now();
        let run_id = Uuid::new_v4();
        let a = sim.run(run_id, &twin, &scenario, start, &CancellationToken::new());
        let b = sim.run(run_id, &twin, &scenario, start, &CancellationToken::new());
        assert_eq!(a.snapshots.len(), b.snapshots.len());
        assert_eq!(a.metrics.events_processed, b.metrics.events_processed);
    }
}
