//! Shared, dynamically-typed context threaded through a pipeline run.
//!
//! Plugins read and write JSON values under string keys; the executor owns
//! the merge after each step (§4.2: "merge the step's declared output key
//! into the context"), so a plugin never has to know where upstream steps
//! chose to write their output.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PipelineContext(Map<String, Value>);

impl PipelineContext {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn seeded(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Cooperative cancellation signal passed to every step. Plugins that do
/// bounded-duration work should poll `is_cancelled` between chunks; the
/// executor itself only checks between steps.
#[derive(Clone, Default)]
pub struct CancellationToken(std::sync::Arc<std::sync::atomic::AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
