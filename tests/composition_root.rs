//! In-memory composition root smoke test: no database required.

use mimir_core_platform::AppContext;

#[test]
fn in_memory_context_boots_with_no_plugins_registered() {
    let ctx = AppContext::init_in_memory();
    assert_eq!(ctx.registry.len(), 0);
    assert!(ctx.config.result_cap > 0);
    assert!(ctx.config.snapshot_interval > 0);
    ctx.shutdown();
}
