//! Pipeline run event types.
//!
//! Each `PipelineExecutor::run` appends to an append-only `EventStore`
//! keyed by `run_id`. Replaying the log reconstructs which steps ran, in
//! what order, and with which outputs — useful for debugging a failed
//! pipeline without re-running it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEventKind {
    /// First event of a `run_id`. Fixes the pipeline id and step count.
    PipelineStarted { pipeline_id: String, step_count: usize },
    StepStarted { step_index: usize, step_name: String },
    StepFinished {
        step_index: usize,
        step_name: String,
        output_key: String,
        output_hash: String,
    },
    /// Terminal: the pipeline stops here (stop-on-failure, §4.2).
    StepFailed { step_index: usize, step_name: String, error: CoreError },
    PipelineCompleted { run_fingerprint: String },
    PipelineCancelled { step_index: usize, step_name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRunEvent {
    pub seq: u64,
    pub run_id: Uuid,
    pub kind: PipelineEventKind,
    pub ts: chrono::DateTime<chrono::Utc>,
}
