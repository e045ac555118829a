//! Pipeline/step configuration (§3, §6 YAML contract). The core only ever
//! sees the structural shape below — step bodies are opaque plugin config.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    /// `"<Type>.<Name>"`, resolved against a `PluginRegistry`.
    pub plugin: String,
    pub config: serde_json::Value,
    /// Context key the step's result is written to.
    pub output: String,
}

impl StepConfig {
    /// Splits `plugin` into its registry `(type, name)` key.
    pub fn plugin_key(&self) -> Option<(&str, &str)> {
        self.plugin.split_once('.')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub id: String,
    pub name: String,
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub steps: Vec<StepConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub metadata: PipelineMetadata,
    pub config: PipelineConfig,
}
