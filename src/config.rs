//! The composition root's only configuration surface is `mimir-persistence`'s
//! `.env`-driven `DbConfig`/`AppConfig` — re-exported here so `main.rs` and
//! `app` don't need to reach into that crate directly.

pub use mimir_persistence::{init_dotenv, AppConfig, DbConfig};
