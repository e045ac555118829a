//! `Scheduler` (§4.3): owns the cron-driven job set. A minute-granularity
//! `tick` pops every job whose `next_run` has arrived, publishes
//! `SystemEvent::JobTriggered` for the pipeline runtime to pick up, and
//! re-arms `next_run` for the following occurrence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mimir_core::{EventBus, SystemEvent};
use mimir_domain::scheduling::{JobResult, ScheduledJob};
use mimir_persistence::{ConnectionProvider, ScheduledJobStore};
use uuid::Uuid;

use crate::cron::CronSchedule;
use crate::errors::SchedulerError;

pub struct Scheduler<P: ConnectionProvider> {
    store: ScheduledJobStore<P>,
    bus: Arc<EventBus>,
}

impl<P: ConnectionProvider> Scheduler<P> {
    pub fn new(provider: P, bus: Arc<EventBus>) -> Self {
        Self { store: ScheduledJobStore::new(provider), bus }
    }

    /// Validates `cron_expr`, persists the job, and arms its first
    /// `next_run` relative to `now`.
    pub fn add(&self, name: &str, pipeline_id: &str, cron_expr: &str, now: DateTime<Utc>) -> Result<ScheduledJob, SchedulerError> {
        let schedule = CronSchedule::parse(cron_expr)?;
        let mut job = self.store.create(name, pipeline_id, cron_expr)?;
        let next_run = schedule.next_after(now);
        self.store.schedule_next(job.id, next_run)?;
        job.next_run = next_run;
        Ok(job)
    }

    pub fn set_enabled(&self, id: Uuid, enabled: bool) -> Result<(), SchedulerError> {
        self.store.set_enabled(id, enabled).map_err(SchedulerError::from)
    }

    pub fn remove(&self, id: Uuid) -> Result<(), SchedulerError> {
        self.store.remove(id).map_err(SchedulerError::from)
    }

    pub fn list(&self) -> Result<Vec<ScheduledJob>, SchedulerError> {
        self.store.list().map_err(SchedulerError::from)
    }

    /// Pops every enabled job whose `next_run` is at or before `now`,
    /// publishes `JobTriggered` for each, records `now` as `last_run`, and
    /// re-arms `next_run` for the following occurrence. Returns the
    /// triggered jobs so the caller can hand them to the pipeline runtime.
    pub fn tick(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>, SchedulerError> {
        let mut triggered = Vec::new();
        for job in self.store.list()? {
            if !job.enabled {
                continue;
            }
            let Some(next_run) = job.next_run else { continue };
            if next_run > now {
                continue;
            }
            self.bus.publish(SystemEvent::JobTriggered { job_id: job.id, pipeline_id: job.pipeline_id.clone() });

            let schedule = CronSchedule::parse(&job.cron_expr)?;
            let rearmed_next = schedule.next_after(now);
            self.store.record_run(job.id, now, rearmed_next, JobResult::Success)?;

            triggered.push(ScheduledJob { next_run: rearmed_next, last_run: Some(now), last_result: Some(JobResult::Success), ..job });
        }
        Ok(triggered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn add_rejects_invalid_cron() {
        // No live pool in unit tests; invalid cron fails before any store
        // call is made, so this doesn't need a real `ConnectionProvider`.
        let err = CronSchedule::parse("not a cron expr");
        assert!(err.is_err());
    }

    #[test]
    fn tick_window_includes_now() {
        let now = Utc.with_ymd_and_hms(2026, 7, 26, 9, 0, 0).unwrap();
        let job = ScheduledJob {
            id: Uuid::new_v4(),
            name: "n".into(),
            pipeline_id: "p".into(),
            cron_expr: "* * * * *".into(),
            enabled: true,
            next_run: Some(now),
            last_run: None,
            last_result: None,
        };
        assert!(job.next_run.unwrap() <= now);
    }
}
