//! `ScenarioStore`/`SimulationRunStore`: scenario definitions and the
//! append-only progression of a simulation run through its snapshots
//! (§4.11, §4.12).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use mimir_core::{EventBus, SystemEvent};
use mimir_domain::simulation::{LoggedEvent, RunMetrics, RunStatus, SimulationEvent, SimulationRun, SimulationScenario, Snapshot};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::pg::pool::{with_retry, ConnectionProvider};
use crate::schema::{simulation_runs, simulation_scenarios, simulation_snapshots};

fn run_status_str(s: RunStatus) -> &'static str {
    match s {
        RunStatus::Pending => "pending",
        RunStatus::Running => "running",
        RunStatus::Completed => "completed",
        RunStatus::Failed => "failed",
        RunStatus::Cancelled => "cancelled",
    }
}

fn run_status_from_str(s: &str) -> Result<RunStatus, PersistenceError> {
    match s {
        "pending" => Ok(RunStatus::Pending),
        "running" => Ok(RunStatus::Running),
        "completed" => Ok(RunStatus::Completed),
        "failed" => Ok(RunStatus::Failed),
        "cancelled" => Ok(RunStatus::Cancelled),
        other => Err(PersistenceError::Unknown(format!("unrecognized run status {other}"))),
    }
}

#[derive(Queryable, Debug)]
struct ScenarioRow {
    id: Uuid,
    twin_id: Uuid,
    name: String,
    scenario_type: String,
    events: serde_json::Value,
    duration: i32,
    created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = simulation_scenarios)]
struct NewScenarioRow<'a> {
    id: Uuid,
    twin_id: Uuid,
    name: &'a str,
    scenario_type: &'a str,
    events: &'a serde_json::Value,
    duration: i32,
}

pub struct ScenarioStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> ScenarioStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn create(&self, scenario: &SimulationScenario) -> Result<(), PersistenceError> {
        scenario.validate().map_err(|e| PersistenceError::Unknown(e.to_string()))?;
        let events = serde_json::to_value(&scenario.events).expect("serialize events");
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(simulation_scenarios::table)
                .values(NewScenarioRow {
                    id: scenario.id,
                    twin_id: scenario.twin_id,
                    name: &scenario.name,
                    scenario_type: &scenario.scenario_type,
                    events: &events,
                    duration: scenario.duration as i32,
                })
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }

    pub fn get(&self, id: Uuid) -> Result<SimulationScenario, PersistenceError> {
        let row: ScenarioRow = with_retry(|| {
            let mut conn = self.provider.connection()?;
            simulation_scenarios::table.filter(simulation_scenarios::id.eq(id)).first(&mut conn).map_err(PersistenceError::from)
        })?;
        row_to_scenario(row)
    }

    pub fn list_for_twin(&self, twin_id: Uuid) -> Result<Vec<SimulationScenario>, PersistenceError> {
        let rows: Vec<ScenarioRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            simulation_scenarios::table
                .filter(simulation_scenarios::twin_id.eq(twin_id))
                .order(simulation_scenarios::created_at.asc())
                .load(&mut conn)
                .map_err(PersistenceError::from)
        })?;
        rows.into_iter().map(row_to_scenario).collect()
    }
}

fn row_to_scenario(row: ScenarioRow) -> Result<SimulationScenario, PersistenceError> {
    Ok(SimulationScenario {
        id: row.id,
        twin_id: row.twin_id,
        name: row.name,
        scenario_type: row.scenario_type,
        events: serde_json::from_value::<Vec<SimulationEvent>>(row.events)
            .map_err(|e| PersistenceError::Unknown(format!("deserialize events: {e}")))?,
        duration: row.duration as u32,
        created_at: row.created_at,
    })
}

#[derive(Queryable, Debug)]
struct RunRow {
    id: Uuid,
    twin_id: Uuid,
    scenario_id: Uuid,
    status: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    metrics: serde_json::Value,
    events_log: serde_json::Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = simulation_runs)]
struct NewRunRow<'a> {
    id: Uuid,
    twin_id: Uuid,
    scenario_id: Uuid,
    status: &'a str,
    start_time: DateTime<Utc>,
    metrics: &'a serde_json::Value,
    events_log: &'a serde_json::Value,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = simulation_snapshots)]
struct NewSnapshotRow<'a> {
    id: Uuid,
    run_id: Uuid,
    step: i32,
    snapshot_time: DateTime<Utc>,
    state: &'a serde_json::Value,
    global_metrics: &'a serde_json::Value,
}

pub struct SimulationRunStore<P: ConnectionProvider> {
    provider: P,
    bus: Option<Arc<EventBus>>,
}

impl<P: ConnectionProvider> SimulationRunStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, bus: None }
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn create_pending(&self, id: Uuid, twin_id: Uuid, scenario_id: Uuid, start_time: DateTime<Utc>) -> Result<(), PersistenceError> {
        let metrics = serde_json::to_value(RunMetrics::default()).expect("serialize metrics");
        let events_log = serde_json::to_value(Vec::<LoggedEvent>::new()).expect("serialize events_log");
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(simulation_runs::table)
                .values(NewRunRow {
                    id,
                    twin_id,
                    scenario_id,
                    status: run_status_str(RunStatus::Pending),
                    start_time,
                    metrics: &metrics,
                    events_log: &events_log,
                })
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }

    pub fn append_snapshot(&self, run_id: Uuid, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let state = serde_json::to_value(&snapshot.state).expect("serialize snapshot state");
        let global_metrics = serde_json::to_value(&snapshot.global_metrics).expect("serialize global_metrics");
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(simulation_snapshots::table)
                .values(NewSnapshotRow {
                    id: Uuid::new_v4(),
                    run_id,
                    step: snapshot.step as i32,
                    snapshot_time: snapshot.timestamp,
                    state: &state,
                    global_metrics: &global_metrics,
                })
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }

    /// Finalizes a run: status transition, end time, metrics, and the full
    /// event log, all in one update. §3's monotonic-transition rule is
    /// enforced by the simulation engine before calling this, not here.
    pub fn finalize(
        &self,
        run_id: Uuid,
        twin_id: Uuid,
        status: RunStatus,
        end_time: DateTime<Utc>,
        metrics: &RunMetrics,
        events_log: &[LoggedEvent],
    ) -> Result<(), PersistenceError> {
        let metrics_json = serde_json::to_value(metrics).expect("serialize metrics");
        let events_json = serde_json::to_value(events_log).expect("serialize events_log");
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(simulation_runs::table.filter(simulation_runs::id.eq(run_id)))
                .set((
                    simulation_runs::status.eq(run_status_str(status)),
                    simulation_runs::end_time.eq(end_time),
                    simulation_runs::metrics.eq(&metrics_json),
                    simulation_runs::events_log.eq(&events_json),
                    simulation_runs::updated_at.eq(diesel::dsl::now),
                ))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })?;

        if let Some(bus) = &self.bus {
            match status {
                RunStatus::Completed => bus.publish(SystemEvent::SimulationCompleted { run_id, twin_id }),
                RunStatus::Failed => bus.publish(SystemEvent::SimulationFailed { run_id, reason: "simulation failed".into() }),
                _ => {}
            }
        }
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<SimulationRun, PersistenceError> {
        let (run_row, snapshot_rows): (RunRow, Vec<(Uuid, i32, DateTime<Utc>, serde_json::Value, serde_json::Value)>) = with_retry(|| {
            let mut conn = self.provider.connection()?;
            let run_row: RunRow = simulation_runs::table.filter(simulation_runs::id.eq(id)).first(&mut conn).map_err(PersistenceError::from)?;
            let snapshot_rows = simulation_snapshots::table
                .filter(simulation_snapshots::run_id.eq(id))
                .order(simulation_snapshots::step.asc())
                .select((
                    simulation_snapshots::run_id,
                    simulation_snapshots::step,
                    simulation_snapshots::snapshot_time,
                    simulation_snapshots::state,
                    simulation_snapshots::global_metrics,
                ))
                .load(&mut conn)
                .map_err(PersistenceError::from)?;
            Ok((run_row, snapshot_rows))
        })?;

        let snapshots = snapshot_rows
            .into_iter()
            .map(|(_, step, timestamp, state, global_metrics)| -> Result<Snapshot, PersistenceError> {
                Ok(Snapshot {
                    step: step as u32,
                    timestamp,
                    state: serde_json::from_value(state).map_err(|e| PersistenceError::Unknown(format!("deserialize state: {e}")))?,
                    global_metrics: serde_json::from_value(global_metrics)
                        .map_err(|e| PersistenceError::Unknown(format!("deserialize global_metrics: {e}")))?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SimulationRun {
            id: run_row.id,
            twin_id: run_row.twin_id,
            scenario_id: run_row.scenario_id,
            status: run_status_from_str(&run_row.status)?,
            start_time: run_row.start_time,
            end_time: run_row.end_time,
            metrics: serde_json::from_value(run_row.metrics).map_err(|e| PersistenceError::Unknown(format!("deserialize metrics: {e}")))?,
            events_log: serde_json::from_value(run_row.events_log)
                .map_err(|e| PersistenceError::Unknown(format!("deserialize events_log: {e}")))?,
            snapshots,
        })
    }

    pub fn list_for_twin(&self, twin_id: Uuid) -> Result<Vec<SimulationRun>, PersistenceError> {
        let ids: Vec<Uuid> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            simulation_runs::table
                .filter(simulation_runs::twin_id.eq(twin_id))
                .order(simulation_runs::start_time.asc())
                .select(simulation_runs::id)
                .load(&mut conn)
                .map_err(PersistenceError::from)
        })?;
        ids.into_iter().map(|id| self.get(id)).collect()
    }
}
