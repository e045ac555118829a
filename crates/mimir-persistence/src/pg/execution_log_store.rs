//! `ExecutionLogStore`: durable record of pipeline executions the
//! execution monitor (§4.4) tracks in memory while they're running.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::pg::pool::{with_retry, ConnectionProvider};
use crate::schema::execution_logs;

#[derive(Queryable, Debug, Clone)]
pub struct ExecutionLogRow {
    pub id: Uuid,
    pub job_id: Option<Uuid>,
    pub pipeline_id: String,
    pub run_fingerprint: Option<String>,
    pub status: String,
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = execution_logs)]
struct NewExecutionLogRow<'a> {
    id: Uuid,
    job_id: Option<Uuid>,
    pipeline_id: &'a str,
    status: &'a str,
    started_at: DateTime<Utc>,
}

pub struct ExecutionLogStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> ExecutionLogStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn start(&self, job_id: Option<Uuid>, pipeline_id: &str, started_at: DateTime<Utc>) -> Result<Uuid, PersistenceError> {
        let id = Uuid::new_v4();
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(execution_logs::table)
                .values(NewExecutionLogRow { id, job_id, pipeline_id, status: "running", started_at })
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })?;
        Ok(id)
    }

    pub fn finish(
        &self,
        id: Uuid,
        status: &str,
        message: Option<&str>,
        run_fingerprint: Option<&str>,
        finished_at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(execution_logs::table.filter(execution_logs::id.eq(id)))
                .set((
                    execution_logs::status.eq(status),
                    execution_logs::message.eq(message),
                    execution_logs::run_fingerprint.eq(run_fingerprint),
                    execution_logs::finished_at.eq(finished_at),
                ))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }

    pub fn get(&self, id: Uuid) -> Result<ExecutionLogRow, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            execution_logs::table.filter(execution_logs::id.eq(id)).first(&mut conn).map_err(PersistenceError::from)
        })
    }

    pub fn list(&self) -> Result<Vec<ExecutionLogRow>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            execution_logs::table.order(execution_logs::started_at.desc()).load(&mut conn).map_err(PersistenceError::from)
        })
    }

    pub fn list_running(&self) -> Result<Vec<ExecutionLogRow>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            execution_logs::table
                .filter(execution_logs::finished_at.is_null())
                .order(execution_logs::started_at.asc())
                .load(&mut conn)
                .map_err(PersistenceError::from)
        })
    }

    pub fn list_recent(&self, limit: i64) -> Result<Vec<ExecutionLogRow>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            execution_logs::table
                .order(execution_logs::started_at.desc())
                .limit(limit)
                .load(&mut conn)
                .map_err(PersistenceError::from)
        })
    }
}
