//! Environment-driven configuration for the persistence layer and the
//! ambient knobs the other crates read at startup (§5 composition root).

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

/// Forces early `.env` loading from callers that don't go through
/// `DbConfig::from_env` directly.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let min_connections = env::var("DATABASE_MIN_CONNECTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(2);
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(16);
        Self { url, min_connections, max_connections }
    }
}

/// Mediator and simulation knobs (§4.9, §4.12) that live outside the
/// database connection but are still read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub result_cap: usize,
    pub insert_batch_size: usize,
    pub propagation_max_depth: u32,
    pub snapshot_interval: u32,
    pub nlq_cache_capacity: usize,
    pub nlq_cache_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        Self {
            result_cap: env_or("MIMIR_RESULT_CAP", 10_000),
            insert_batch_size: env_or("MIMIR_INSERT_BATCH_SIZE", 1_000),
            propagation_max_depth: env_or("MIMIR_PROPAGATION_MAX_DEPTH", 3),
            snapshot_interval: env_or("MIMIR_SNAPSHOT_INTERVAL", 10),
            nlq_cache_capacity: env_or("MIMIR_NLQ_CACHE_CAPACITY", 256),
            nlq_cache_ttl_secs: env_or("MIMIR_NLQ_CACHE_TTL_SECS", 300),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
