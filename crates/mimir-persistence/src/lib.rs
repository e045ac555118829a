//! mimir-persistence: Diesel/Postgres-backed stores for the eleven tables
//! of §6, plus connection pooling, retry, and migrations.
//!
//! Modules:
//! - `pg`: one store per aggregate (`OntologyStore`, `TwinStore`,
//!   `ScenarioStore`/`SimulationRunStore`, `ScheduledJobStore`,
//!   `PipelineStore`, `PluginConfigStore`, `ExecutionLogStore`), all built
//!   on the shared `ConnectionProvider`/retry plumbing in `pg::pool`.
//! - `migrations`: embedded-migration runner.
//! - `config`: `.env`-driven `DbConfig` and ambient `AppConfig`.
//! - `schema`: Diesel table declarations.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, AppConfig, DbConfig};
pub use error::PersistenceError;
pub use pg::{
    build_dev_pool_from_env, build_pool, ConnectionProvider, ExecutionLogRow, ExecutionLogStore, OntologyStore, PgPool, PipelineStore,
    PluginConfigStore, PoolProvider, ScenarioStore, ScheduledJobStore, SimulationRunStore, TwinStore,
};
