//! Postgres-backed implementations of the store contracts each subsystem
//! needs. Every store shares the same `ConnectionProvider`/`with_retry`
//! plumbing (`pool`) rather than re-deriving it per table.

pub mod execution_log_store;
pub mod ontology_store;
pub mod pipeline_store;
pub mod plugin_config_store;
pub mod pool;
pub mod scheduler_store;
pub mod simulation_store;
pub mod twin_store;

pub use execution_log_store::{ExecutionLogRow, ExecutionLogStore};
pub use ontology_store::OntologyStore;
pub use pipeline_store::PipelineStore;
pub use plugin_config_store::{PluginConfigRow, PluginConfigStore};
pub use pool::{build_dev_pool_from_env, build_pool, with_retry, ConnectionProvider, PgPool, PoolProvider};
pub use scheduler_store::ScheduledJobStore;
pub use simulation_store::{ScenarioStore, SimulationRunStore};
pub use twin_store::TwinStore;
