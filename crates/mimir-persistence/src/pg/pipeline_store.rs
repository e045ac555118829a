//! `PipelineStore`: persisted pipeline definitions (§6 YAML contract).
//! Pipelines are keyed by their own string id, not a generated UUID — the
//! same id callers reference in `ScheduledJob::pipeline_id`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use mimir_domain::pipeline::{PipelineConfig, PipelineDefinition, PipelineMetadata};

use crate::error::PersistenceError;
use crate::pg::pool::{with_retry, ConnectionProvider};
use crate::schema::pipelines;

#[derive(Queryable, Debug)]
struct PipelineRow {
    id: String,
    name: String,
    schedule: Option<String>,
    config: serde_json::Value,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = pipelines)]
struct NewPipelineRow<'a> {
    id: &'a str,
    name: &'a str,
    schedule: Option<&'a str>,
    config: &'a serde_json::Value,
}

fn row_to_definition(row: PipelineRow) -> Result<PipelineDefinition, PersistenceError> {
    Ok(PipelineDefinition {
        metadata: PipelineMetadata { id: row.id, name: row.name, schedule: row.schedule },
        config: serde_json::from_value::<PipelineConfig>(row.config)
            .map_err(|e| PersistenceError::Unknown(format!("deserialize pipeline config: {e}")))?,
    })
}

pub struct PipelineStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PipelineStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn upsert(&self, def: &PipelineDefinition) -> Result<(), PersistenceError> {
        let config = serde_json::to_value(&def.config).expect("serialize pipeline config");
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(pipelines::table)
                .values(NewPipelineRow {
                    id: &def.metadata.id,
                    name: &def.metadata.name,
                    schedule: def.metadata.schedule.as_deref(),
                    config: &config,
                })
                .on_conflict(pipelines::id)
                .do_update()
                .set((
                    pipelines::name.eq(&def.metadata.name),
                    pipelines::schedule.eq(def.metadata.schedule.as_deref()),
                    pipelines::config.eq(&config),
                    pipelines::updated_at.eq(diesel::dsl::now),
                ))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }

    pub fn get(&self, id: &str) -> Result<PipelineDefinition, PersistenceError> {
        let row: PipelineRow = with_retry(|| {
            let mut conn = self.provider.connection()?;
            pipelines::table.filter(pipelines::id.eq(id)).first(&mut conn).map_err(PersistenceError::from)
        })?;
        row_to_definition(row)
    }

    pub fn list(&self) -> Result<Vec<PipelineDefinition>, PersistenceError> {
        let rows: Vec<PipelineRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            pipelines::table.order(pipelines::created_at.asc()).load(&mut conn).map_err(PersistenceError::from)
        })?;
        rows.into_iter().map(row_to_definition).collect()
    }
}
