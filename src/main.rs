//! Composition-root binary: builds the process-wide `AppContext` and
//! reports what it found. Without `pg_demo`, this runs entirely
//! in-memory; with it, it migrates and connects against `DATABASE_URL`
//! and also reports the scheduler's job set.

use mimir_core_platform::AppContext;

fn main() {
    env_logger::init();

    #[cfg(feature = "pg_demo")]
    let ctx = match AppContext::init_with_postgres() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("failed to initialize postgres-backed context: {e}");
            std::process::exit(1);
        }
    };
    #[cfg(not(feature = "pg_demo"))]
    let ctx = AppContext::init_in_memory();

    println!("Mimir composition root initialized");
    println!(
        "  result cap {}, insert batch {}, propagation depth {}, snapshot interval {}",
        ctx.config.result_cap, ctx.config.insert_batch_size, ctx.config.propagation_max_depth, ctx.config.snapshot_interval
    );
    println!("  {} plugins registered", ctx.registry.len());

    #[cfg(feature = "pg_demo")]
    {
        match ctx.persistence.scheduler.list() {
            Ok(jobs) => println!("  {} scheduled jobs loaded", jobs.len()),
            Err(e) => eprintln!("  failed to list scheduled jobs: {e}"),
        }
    }

    ctx.shutdown();
}
