//! Process-wide composition root (§5): the singletons every subsystem
//! shares — plugin registry, event bus, graph mediator, and NL query
//! mediator always; the Postgres-backed stores, scheduler, and execution
//! monitor only under `pg_demo`, since they need a live connection pool.

use std::sync::Arc;
use std::time::Duration;

use mimir_core::{EventBus, PluginRegistry};
use mimir_graph::backend::InMemoryGraphBackend;
use mimir_graph::GraphMediator;
use mimir_nlq::{NLQueryMediator, StaticAdapter};

use crate::config::AppConfig;

#[cfg(feature = "pg_demo")]
use mimir_persistence::{
    build_dev_pool_from_env, ExecutionLogStore, OntologyStore, PersistenceError, PipelineStore, PluginConfigStore, PoolProvider, ScenarioStore,
    ScheduledJobStore, SimulationRunStore, TwinStore,
};
#[cfg(feature = "pg_demo")]
use mimir_scheduler::{ExecutionMonitor, Scheduler};

/// Everything the rest of the system reaches for as ambient state. One
/// instance lives for the life of the process.
pub struct AppContext {
    pub registry: PluginRegistry,
    pub bus: Arc<EventBus>,
    pub graph: Arc<GraphMediator>,
    pub nlq: NLQueryMediator,
    pub config: AppConfig,
    #[cfg(feature = "pg_demo")]
    pub persistence: PersistenceContext,
}

/// The Postgres-backed half of the context, wired up only when `pg_demo`
/// is enabled. `ScheduledJobStore` is owned by `scheduler` rather than
/// held here directly, since nothing outside `Scheduler` should touch job
/// rows without going through `next_run` bookkeeping.
#[cfg(feature = "pg_demo")]
pub struct PersistenceContext {
    pub ontologies: OntologyStore<PoolProvider>,
    pub twins: TwinStore<PoolProvider>,
    pub scenarios: ScenarioStore<PoolProvider>,
    pub runs: SimulationRunStore<PoolProvider>,
    pub pipelines: PipelineStore<PoolProvider>,
    pub plugin_configs: PluginConfigStore<PoolProvider>,
    pub executions: ExecutionLogStore<PoolProvider>,
    pub scheduler: Scheduler<PoolProvider>,
    pub monitor: ExecutionMonitor<PoolProvider>,
}

impl AppContext {
    fn bootstrap_shared(config: &AppConfig) -> (PluginRegistry, Arc<EventBus>, Arc<GraphMediator>, NLQueryMediator) {
        let registry = PluginRegistry::new();
        let bus = Arc::new(EventBus::default());
        let graph = Arc::new(GraphMediator::new(Arc::new(InMemoryGraphBackend::new())).with_limits(config.result_cap, config.insert_batch_size));
        let nlq = NLQueryMediator::new(
            Arc::new(StaticAdapter::new("```sparql\nSELECT * WHERE { GRAPH <g> { ?s ?p ?o } }\n```")),
            graph.clone(),
            config.nlq_cache_capacity,
            Duration::from_secs(config.nlq_cache_ttl_secs),
        );
        (registry, bus, graph, nlq)
    }

    /// Builds the context without a database: the knowledge-core and
    /// simulation subsystems work fully in-memory, but the scheduler and
    /// execution monitor (which need durable job/log rows) are absent.
    pub fn init_in_memory() -> Self {
        mimir_persistence::init_dotenv();
        let config = AppConfig::from_env();
        let (registry, bus, graph, nlq) = Self::bootstrap_shared(&config);
        Self { registry, bus, graph, nlq, config }
    }

    /// Builds the full context against a live Postgres pool, migrating on
    /// first checkout (`build_dev_pool_from_env`).
    #[cfg(feature = "pg_demo")]
    pub fn init_with_postgres() -> Result<Self, PersistenceError> {
        mimir_persistence::init_dotenv();
        let config = AppConfig::from_env();
        let (registry, bus, graph, nlq) = Self::bootstrap_shared(&config);

        let pool = build_dev_pool_from_env()?;
        let provider = || PoolProvider { pool: pool.clone() };

        let persistence = PersistenceContext {
            ontologies: OntologyStore::new(provider(), graph.clone()),
            twins: TwinStore::new(provider()),
            scenarios: ScenarioStore::new(provider()),
            runs: SimulationRunStore::new(provider()),
            pipelines: PipelineStore::new(provider()),
            plugin_configs: PluginConfigStore::new(provider()),
            executions: ExecutionLogStore::new(provider()),
            scheduler: Scheduler::new(provider(), bus.clone()),
            monitor: ExecutionMonitor::new(provider()),
        };

        Ok(Self { registry, bus, graph, nlq, config, persistence })
    }

    /// Graceful shutdown. Nothing needs flushing for the in-memory pieces;
    /// under `pg_demo` a real deployment would drain in-flight executions
    /// here before the pool drops.
    pub fn shutdown(self) {
        log::info!("mimir context shutting down");
    }
}
