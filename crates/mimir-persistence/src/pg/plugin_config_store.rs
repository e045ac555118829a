//! `PluginConfigStore`: persisted enable/disable and static configuration
//! for entries in the runtime `PluginRegistry` (§4.1). The registry itself
//! stays in memory per-process; this store is what survives a restart.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::pg::pool::{with_retry, ConnectionProvider};
use crate::schema::plugin_config;

#[derive(Queryable, Debug, Clone)]
pub struct PluginConfigRow {
    pub id: Uuid,
    pub plugin_type: String,
    pub plugin_name: String,
    pub config: serde_json::Value,
    pub enabled: bool,
    #[allow(dead_code)]
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = plugin_config)]
struct NewPluginConfigRow<'a> {
    id: Uuid,
    plugin_type: &'a str,
    plugin_name: &'a str,
    config: &'a serde_json::Value,
    enabled: bool,
}

pub struct PluginConfigStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PluginConfigStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn upsert(&self, plugin_type: &str, plugin_name: &str, config: &serde_json::Value, enabled: bool) -> Result<(), PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(plugin_config::table)
                .values(NewPluginConfigRow { id: Uuid::new_v4(), plugin_type, plugin_name, config, enabled })
                .on_conflict((plugin_config::plugin_type, plugin_config::plugin_name))
                .do_update()
                .set((plugin_config::config.eq(config), plugin_config::enabled.eq(enabled), plugin_config::updated_at.eq(diesel::dsl::now)))
                .execute(&mut conn)
                .map(|_| ())
                .map_err(PersistenceError::from)
        })
    }

    pub fn list(&self) -> Result<Vec<PluginConfigRow>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            plugin_config::table.order((plugin_config::plugin_type.asc(), plugin_config::plugin_name.asc())).load(&mut conn).map_err(PersistenceError::from)
        })
    }

    pub fn is_enabled(&self, plugin_type: &str, plugin_name: &str) -> Result<bool, PersistenceError> {
        let row: Option<PluginConfigRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            plugin_config::table
                .filter(plugin_config::plugin_type.eq(plugin_type))
                .filter(plugin_config::plugin_name.eq(plugin_name))
                .first(&mut conn)
                .optional()
                .map_err(PersistenceError::from)
        })?;
        Ok(row.map(|r| r.enabled).unwrap_or(true))
    }
}
