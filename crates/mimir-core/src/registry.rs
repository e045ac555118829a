//! Plugin registry: a namespaced `type -> name -> plugin` lookup (§4.1).
//!
//! Plugins are registered once at startup (see the root binary's `init`)
//! and resolved by `"<Type>.<Name>"` keys taken straight from a step's
//! `plugin` field in the pipeline YAML.

use std::collections::HashMap;
use std::sync::Arc;

use mimir_domain::pipeline::StepConfig;

use crate::context::{CancellationToken, PipelineContext};
use crate::errors::CoreError;

/// A unit of work a pipeline step can invoke. Implementations must be
/// deterministic given `(step, context)` — the simulation and replay
/// stories both depend on it.
pub trait Plugin: Send + Sync {
    fn execute_step(
        &self,
        cancel: &CancellationToken,
        step: &StepConfig,
        context: &PipelineContext,
    ) -> Result<serde_json::Value, CoreError>;
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<(String, String), Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self { plugins: HashMap::new() }
    }

    /// Fails rather than overwriting when `(plugin_type, name)` is already
    /// taken — §4.1 requires registration to reject duplicates, not
    /// silently replace them.
    pub fn register(&mut self, plugin_type: impl Into<String>, name: impl Into<String>, plugin: Arc<dyn Plugin>) -> Result<(), CoreError> {
        let key = (plugin_type.into(), name.into());
        if self.plugins.contains_key(&key) {
            let (plugin_type, name) = key;
            return Err(CoreError::AlreadyRegistered { plugin_type, name });
        }
        self.plugins.insert(key, plugin);
        Ok(())
    }

    pub fn get(&self, plugin_type: &str, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins.get(&(plugin_type.to_string(), name.to_string())).cloned()
    }

    /// Resolves a `"<Type>.<Name>"` key against the registry.
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn Plugin>, CoreError> {
        let (plugin_type, name) = key
            .split_once('.')
            .ok_or_else(|| CoreError::MalformedPluginKey(key.to_string()))?;
        self.get(plugin_type, name).ok_or_else(|| CoreError::PluginNotFound {
            plugin_type: plugin_type.to_string(),
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;
    impl Plugin for Echo {
        fn execute_step(
            &self,
            _cancel: &CancellationToken,
            _step: &StepConfig,
            _context: &PipelineContext,
        ) -> Result<serde_json::Value, CoreError> {
            Ok(serde_json::json!("ok"))
        }
    }

    #[test]
    fn resolves_registered_plugin() {
        let mut reg = PluginRegistry::new();
        reg.register("Transform", "Echo", Arc::new(Echo)).unwrap();
        assert!(reg.resolve("Transform.Echo").is_ok());
    }

    #[test]
    fn registering_the_same_key_twice_is_rejected() {
        let mut reg = PluginRegistry::new();
        reg.register("Transform", "Echo", Arc::new(Echo)).unwrap();
        match reg.register("Transform", "Echo", Arc::new(Echo)) {
            Err(CoreError::AlreadyRegistered { plugin_type, name }) => {
                assert_eq!(plugin_type, "Transform");
                assert_eq!(name, "Echo");
            }
            other => panic!("expected AlreadyRegistered, got {other:?}"),
        }
    }

    #[test]
    fn missing_plugin_is_reported() {
        let reg = PluginRegistry::new();
        match reg.resolve("Transform.Missing") {
            Err(CoreError::PluginNotFound { plugin_type, name }) => {
                assert_eq!(plugin_type, "Transform");
                assert_eq!(name, "Missing");
            }
            other => panic!("expected PluginNotFound, got {other:?}"),
        }
    }

    #[test]
    fn malformed_key_is_reported() {
        let reg = PluginRegistry::new();
        assert!(matches!(reg.resolve("NoSeparator"), Err(CoreError::MalformedPluginKey(_))));
    }
}
