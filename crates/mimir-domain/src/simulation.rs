//! Simulation event/scenario/run/snapshot types (§3, §4.12, §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::twin::EntityState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight used by `ImpactAnalyzer::risk_score` (§4.13); `critical`
    /// dominates aggregation as §6 requires.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Low => 0.25,
            Severity::Medium => 0.5,
            Severity::High => 0.75,
            Severity::Critical => 1.0,
        }
    }
}

/// Complete enumeration of event kinds from §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ResourceUnavailable,
    ResourceAvailable,
    ResourceCapacityChange,
    DemandSurge,
    DemandDrop,
    ProcessFailure,
    ProcessOptimization,
    PolicyConstraintAdd,
    ExternalMarketShift,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationRule {
    pub relationship_type: String,
    pub impact_factor: f64,
    pub delay_steps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub target_uri: String,
    pub step: u32,
    pub parameters: HashMap<String, f64>,
    pub severity: Severity,
    pub propagation: Vec<PropagationRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationScenario {
    pub id: Uuid,
    pub twin_id: Uuid,
    pub name: String,
    pub scenario_type: String,
    pub events: Vec<SimulationEvent>,
    pub duration: u32,
    pub created_at: DateTime<Utc>,
}

impl SimulationScenario {
    /// §3 invariant: every event's `step < duration`.
    pub fn validate(&self) -> Result<(), crate::error::DomainError> {
        for ev in &self.events {
            if ev.step >= self.duration {
                return Err(crate::error::DomainError::validation(format!(
                    "event {} has step {} >= duration {}",
                    ev.id, ev.step, self.duration
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    /// §3: status transitions are monotonic along
    /// pending -> running -> {completed|failed|cancelled}.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunMetrics {
    pub total_steps: u32,
    pub events_processed: u64,
    pub average_utilization: f64,
    pub degraded_count: u32,
    pub unavailable_count: u32,
    pub stable: bool,
    pub propagations_dropped: u64,
    pub incomplete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub step: u32,
    pub timestamp: DateTime<Utc>,
    pub state: HashMap<String, EntityState>,
    pub global_metrics: RunMetrics,
}

/// A single event as recorded in the run's append-only log, tagged with the
/// step it actually fired on (which may differ from `event.step` for
/// propagated derivatives).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub event: SimulationEvent,
    pub applied_step: u32,
    pub derived_from: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub id: Uuid,
    pub twin_id: Uuid,
    pub scenario_id: Uuid,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub metrics: RunMetrics,
    pub events_log: Vec<LoggedEvent>,
    pub snapshots: Vec<Snapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_is_monotonic() {
        assert!(RunStatus::Pending.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Completed.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Cancelled.can_transition_to(RunStatus::Completed));
    }

    #[test]
    fn critical_outweighs_low() {
        assert!(Severity::Critical.weight() > Severity::Low.weight());
    }
}
