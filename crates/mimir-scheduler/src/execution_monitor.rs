//! `ExecutionMonitor` (§4.4): tracks in-flight pipeline executions and
//! gives operators a cooperative-cancellation handle and a durable log of
//! outcomes. Running executions live in a concurrent map keyed by
//! execution id — the scheduler's tick loop and any number of worker
//! threads finishing runs touch it without a shared mutex around the whole
//! monitor.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mimir_core::CancellationToken;
use mimir_persistence::{ConnectionProvider, ExecutionLogRow, ExecutionLogStore};
use uuid::Uuid;

use crate::errors::SchedulerError;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionStatistics {
    pub running: usize,
    pub recent_success: usize,
    pub recent_failure: usize,
}

pub struct ExecutionMonitor<P: ConnectionProvider> {
    store: ExecutionLogStore<P>,
    running: DashMap<Uuid, CancellationToken>,
}

impl<P: ConnectionProvider> ExecutionMonitor<P> {
    pub fn new(provider: P) -> Self {
        Self { store: ExecutionLogStore::new(provider), running: DashMap::new() }
    }

    /// Registers a new execution and returns its id plus the cancellation
    /// token the caller should thread into `PipelineExecutor::run`.
    pub fn start(&self, job_id: Option<Uuid>, pipeline_id: &str, started_at: DateTime<Utc>) -> Result<(Uuid, CancellationToken), SchedulerError> {
        let id = self.store.start(job_id, pipeline_id, started_at)?;
        let cancel = CancellationToken::new();
        self.running.insert(id, cancel.clone());
        Ok((id, cancel))
    }

    /// Records the terminal outcome and drops the execution from the
    /// running set.
    pub fn finish(&self, id: Uuid, status: &str, message: Option<&str>, run_fingerprint: Option<&str>, finished_at: DateTime<Utc>) -> Result<(), SchedulerError> {
        self.store.finish(id, status, message, run_fingerprint, finished_at)?;
        self.running.remove(&id);
        Ok(())
    }

    /// Signals cooperative cancellation for a running execution. Returns
    /// `false` if no such execution is currently tracked (already finished,
    /// or never started).
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.running.get(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Looks up a single execution, running or finished, by id.
    pub fn get(&self, id: Uuid) -> Result<ExecutionLogRow, SchedulerError> {
        self.store.get(id).map_err(SchedulerError::from)
    }

    /// Lists every logged execution, running or finished.
    pub fn list(&self) -> Result<Vec<ExecutionLogRow>, SchedulerError> {
        self.store.list().map_err(SchedulerError::from)
    }

    pub fn list_running(&self) -> Result<Vec<ExecutionLogRow>, SchedulerError> {
        self.store.list_running().map_err(SchedulerError::from)
    }

    pub fn list_recent(&self, limit: i64) -> Result<Vec<ExecutionLogRow>, SchedulerError> {
        self.store.list_recent(limit).map_err(SchedulerError::from)
    }

    /// Summarizes the last `recent_window` logged executions plus the
    /// current in-memory running count.
    pub fn statistics(&self, recent_window: i64) -> Result<ExecutionStatistics, SchedulerError> {
        let recent = self.store.list_recent(recent_window)?;
        let recent_success = recent.iter().filter(|r| r.status == "success").count();
        let recent_failure = recent.iter().filter(|r| r.status == "failure").count();
        Ok(ExecutionStatistics { running: self.running.len(), recent_success, recent_failure })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_on_unknown_execution_is_a_no_op() {
        let running: DashMap<Uuid, CancellationToken> = DashMap::new();
        assert!(running.get(&Uuid::new_v4()).is_none());
    }
}
