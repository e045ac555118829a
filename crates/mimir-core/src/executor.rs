//! `PipelineExecutor`: ordered, stop-on-failure execution of a pipeline's
//! steps against a shared `PipelineContext` (§4.2).
//!
//! Each run gets its own append-only event log (`EventStore`) and, when an
//! `EventBus` is attached, publishes `PipelineCompleted`/`PipelineFailed`
//! for the rest of the system to react to (the scheduler's execution
//! monitor is the main subscriber).

use serde_json::json;
use uuid::Uuid;

use mimir_domain::pipeline::PipelineDefinition;

use crate::context::{CancellationToken, PipelineContext};
use crate::errors::CoreError;
use crate::event::{EventBus, EventStore, InMemoryEventStore, PipelineEventKind, SystemEvent};
use crate::hashing::hash_value;
use crate::registry::PluginRegistry;

pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub context: PipelineContext,
    pub fingerprint: String,
    pub events: Vec<crate::event::PipelineRunEvent>,
}

pub struct PipelineExecutor<'a> {
    registry: &'a PluginRegistry,
    bus: Option<&'a EventBus>,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(registry: &'a PluginRegistry) -> Self {
        Self { registry, bus: None }
    }

    pub fn with_event_bus(mut self, bus: &'a EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Runs every step in order, merging each step's output into the
    /// shared context under its declared `output` key, stopping at the
    /// first failure or cancellation.
    pub fn run(
        &self,
        pipeline: &PipelineDefinition,
        seed: PipelineContext,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, CoreError> {
        if pipeline.config.steps.is_empty() {
            return Err(CoreError::EmptyPipeline);
        }

        let run_id = Uuid::new_v4();
        let mut store = InMemoryEventStore::new();
        let mut context = seed;

        store.append_kind(
            run_id,
            PipelineEventKind::PipelineStarted {
                pipeline_id: pipeline.metadata.id.clone(),
                step_count: pipeline.config.steps.len(),
            },
        );

        for (index, step) in pipeline.config.steps.iter().enumerate() {
            if cancel.is_cancelled() {
                store.append_kind(
                    run_id,
                    PipelineEventKind::PipelineCancelled { step_index: index, step_name: step.name.clone() },
                );
                self.publish_failure(run_id, &pipeline.metadata.id, "cancelled");
                return Err(CoreError::Cancelled { step: step.name.clone() });
            }

            store.append_kind(
                run_id,
                PipelineEventKind::StepStarted { step_index: index, step_name: step.name.clone() },
            );

            let plugin = match self.registry.resolve(&step.plugin) {
                Ok(p) => p,
                Err(e) => {
                    return self.fail_step(&mut store, run_id, &pipeline.metadata.id, index, step, e);
                }
            };

            let result = plugin.execute_step(cancel, step, &context);
            let output = match result {
                Ok(v) => v,
                Err(e) => {
                    return self.fail_step(&mut store, run_id, &pipeline.metadata.id, index, step, e);
                }
            };

            let output_hash = hash_value(&output);
            context.set(step.output.clone(), output);

            store.append_kind(
                run_id,
                PipelineEventKind::StepFinished {
                    step_index: index,
                    step_name: step.name.clone(),
                    output_key: step.output.clone(),
                    output_hash,
                },
            );
        }

        let events = store.list(run_id);
        let step_hashes: Vec<&str> = events
            .iter()
            .filter_map(|e| match &e.kind {
                PipelineEventKind::StepFinished { output_hash, .. } => Some(output_hash.as_str()),
                _ => None,
            })
            .collect();
        let fingerprint = hash_value(&json!({
            "pipeline_id": pipeline.metadata.id,
            "step_hashes": step_hashes,
        }));

        store.append_kind(run_id, PipelineEventKind::PipelineCompleted { run_fingerprint: fingerprint.clone() });

        if let Some(bus) = self.bus {
            bus.publish(SystemEvent::PipelineCompleted { run_id, pipeline_id: pipeline.metadata.id.clone() });
        }

        Ok(PipelineOutcome { run_id, context, fingerprint, events: store.list(run_id) })
    }

    fn fail_step(
        &self,
        store: &mut InMemoryEventStore,
        run_id: Uuid,
        pipeline_id: &str,
        index: usize,
        step: &mimir_domain::pipeline::StepConfig,
        error: CoreError,
    ) -> Result<PipelineOutcome, CoreError> {
        store.append_kind(
            run_id,
            PipelineEventKind::StepFailed { step_index: index, step_name: step.name.clone(), error: error.clone() },
        );
        self.publish_failure(run_id, pipeline_id, &error.to_string());
        Err(CoreError::StepFailed { step: step.name.clone(), message: error.to_string() })
    }

    fn publish_failure(&self, run_id: Uuid, pipeline_id: &str, reason: &str) {
        if let Some(bus) = self.bus {
            bus.publish(SystemEvent::PipelineFailed {
                run_id,
                pipeline_id: pipeline_id.to_string(),
                reason: reason.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimir_domain::pipeline::{PipelineConfig, PipelineMetadata, StepConfig};
    use std::sync::Arc;

    struct Double;
    impl crate::registry::Plugin for Double {
        fn execute_step(
            &self,
            _cancel: &CancellationToken,
            step: &mimir_domain::pipeline::StepConfig,
            context: &PipelineContext,
        ) -> Result<serde_json::Value, CoreError> {
            let prior = context.get("seed").and_then(|v| v.as_i64()).unwrap_or(1);
            let _ = step;
            Ok(json!(prior * 2))
        }
    }

    fn pipeline() -> PipelineDefinition {
        PipelineDefinition {
            metadata: PipelineMetadata { id: "p1".into(), name: "test".into(), schedule: None },
            config: PipelineConfig {
                steps: vec![StepConfig {
                    name: "double".into(),
                    plugin: "Transform.Double".into(),
                    config: json!({}),
                    output: "doubled".into(),
                }],
            },
        }
    }

    #[test]
    fn runs_and_merges_output() {
        let mut registry = PluginRegistry::new();
        registry.register("Transform", "Double", Arc::new(Double)).unwrap();
        let executor = PipelineExecutor::new(&registry);
        let mut seed = PipelineContext::new();
        seed.set("seed", json!(21));
        let outcome = executor.run(&pipeline(), seed, &CancellationToken::new()).unwrap();
        assert_eq!(outcome.context.get("doubled"), Some(&json!(42)));
        assert!(!outcome.fingerprint.is_empty());
    }

    #[test]
    fn missing_plugin_fails_the_whole_run() {
        let registry = PluginRegistry::new();
        let executor = PipelineExecutor::new(&registry);
        let err = executor.run(&pipeline(), PipelineContext::new(), &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, CoreError::StepFailed { .. }));
    }

    #[test]
    fn empty_pipeline_is_rejected() {
        let registry = PluginRegistry::new();
        let executor = PipelineExecutor::new(&registry);
        let mut p = pipeline();
        p.config.steps.clear();
        let err = executor.run(&p, PipelineContext::new(), &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, CoreError::EmptyPipeline));
    }

    #[test]
    fn cancellation_stops_before_next_step() {
        let mut registry = PluginRegistry::new();
        registry.register("Transform", "Double", Arc::new(Double)).unwrap();
        let executor = PipelineExecutor::new(&registry);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = executor.run(&pipeline(), PipelineContext::new(), &cancel).unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { .. }));
    }
}
