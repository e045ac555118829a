//! `ScheduledJobStore`: the persisted half of `mimir-scheduler`'s job set
//! (§4.3). The scheduler keeps its in-memory tick clock here; this store
//! only durably records job definitions and their last/next run bookkeeping.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use mimir_domain::scheduling::{JobResult, ScheduledJob};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::pg::pool::{with_retry, ConnectionProvider};
use crate::schema::scheduled_jobs;

fn job_result_str(r: JobResult) -> &'static str {
    match r {
        JobResult::Success => "success",
        JobResult::Failure => "failure",
    }
}

fn job_result_from_str(s: &str) -> Result<JobResult, PersistenceError> {
    match s {
        "success" => Ok(JobResult::Success),
        "failure" => Ok(JobResult::Failure),
        other => Err(PersistenceError::Unknown(format!("unrecognized job result {other}"))),
    }
}

#[derive(Queryable, Debug)]
struct JobRow {
    id: Uuid,
    name: String,
    pipeline_id: String,
    cron_expr: String,
    enabled: bool,
    next_run: Option<DateTime<Utc>>,
    last_run: Option<DateTime<Utc>>,
    last_result: Option<String>,
}

impl JobRow {
    fn into_domain(self) -> Result<ScheduledJob, PersistenceError> {
        Ok(ScheduledJob {
            id: self.id,
            name: self.name,
            pipeline_id: self.pipeline_id,
            cron_expr: self.cron_expr,
            enabled: self.enabled,
            next_run: self.next_run,
            last_run: self.last_run,
            last_result: self.last_result.as_deref().map(job_result_from_str).transpose()?,
        })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = scheduled_jobs)]
struct NewJobRow<'a> {
    id: Uuid,
    name: &'a str,
    pipeline_id: &'a str,
    cron_expr: &'a str,
    enabled: bool,
}

pub struct ScheduledJobStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> ScheduledJobStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn create(&self, name: &str, pipeline_id: &str, cron_expr: &str) -> Result<ScheduledJob, PersistenceError> {
        let id = Uuid::new_v4();
        let row: JobRow = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(scheduled_jobs::table)
                .values(NewJobRow { id, name, pipeline_id, cron_expr, enabled: true })
                .get_result(&mut conn)
                .map_err(PersistenceError::from)
        })?;
        row.into_domain()
    }

    pub fn get(&self, id: Uuid) -> Result<ScheduledJob, PersistenceError> {
        let row: JobRow = with_retry(|| {
            let mut conn = self.provider.connection()?;
            scheduled_jobs::table.filter(scheduled_jobs::id.eq(id)).first(&mut conn).map_err(PersistenceError::from)
        })?;
        row.into_domain()
    }

    pub fn list(&self) -> Result<Vec<ScheduledJob>, PersistenceError> {
        let rows: Vec<JobRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            scheduled_jobs::table.order(scheduled_jobs::created_at.asc()).load(&mut conn).map_err(PersistenceError::from)
        })?;
        rows.into_iter().map(JobRow::into_domain).collect()
    }

    pub fn set_enabled(&self, id: Uuid, enabled: bool) -> Result<(), PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(scheduled_jobs::table.filter(scheduled_jobs::id.eq(id)))
                .set((scheduled_jobs::enabled.eq(enabled), scheduled_jobs::updated_at.eq(diesel::dsl::now)))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }

    pub fn remove(&self, id: Uuid) -> Result<(), PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::delete(scheduled_jobs::table.filter(scheduled_jobs::id.eq(id)))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }

    /// Arms `next_run` without touching `last_run`/`last_result` — used
    /// right after `create` and whenever the scheduler recomputes a job's
    /// next firing time independent of a completed run being recorded.
    pub fn schedule_next(&self, id: Uuid, next_run: Option<DateTime<Utc>>) -> Result<(), PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(scheduled_jobs::table.filter(scheduled_jobs::id.eq(id)))
                .set((scheduled_jobs::next_run.eq(next_run), scheduled_jobs::updated_at.eq(diesel::dsl::now)))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }

    /// Records a tick's outcome: `next_run`/`last_run`/`last_result`.
    pub fn record_run(&self, id: Uuid, last_run: DateTime<Utc>, next_run: Option<DateTime<Utc>>, result: JobResult) -> Result<(), PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(scheduled_jobs::table.filter(scheduled_jobs::id.eq(id)))
                .set((
                    scheduled_jobs::last_run.eq(last_run),
                    scheduled_jobs::next_run.eq(next_run),
                    scheduled_jobs::last_result.eq(job_result_str(result)),
                    scheduled_jobs::updated_at.eq(diesel::dsl::now),
                ))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }
}
