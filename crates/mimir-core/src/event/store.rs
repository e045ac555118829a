//! Append-only event storage for pipeline runs.
//!
//! Mirrors the append/list contract: `append_kind` assigns `seq` and `ts`
//! and appends; `list` returns the events for a `run_id` in ascending
//! `seq` order. Kept minimal so other backends (a persistence-backed
//! store, for instance) can slot in without touching `PipelineExecutor`.

use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use super::{PipelineEventKind, PipelineRunEvent};

pub trait EventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: PipelineEventKind) -> PipelineRunEvent;
    fn list(&self, run_id: Uuid) -> Vec<PipelineRunEvent>;
}

/// In-memory event store. Volatile and not thread-safe on its own; wrap in
/// a `Mutex` for concurrent executors.
#[derive(Default)]
pub struct InMemoryEventStore {
    inner: HashMap<Uuid, Vec<PipelineRunEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self { inner: HashMap::new() }
    }

    pub fn len_for(&self, run_id: Uuid) -> usize {
        self.inner.get(&run_id).map(|v| v.len()).unwrap_or(0)
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: PipelineEventKind) -> PipelineRunEvent {
        let vec = self.inner.entry(run_id).or_default();
        let seq = vec.len() as u64;
        let ev = PipelineRunEvent { seq, run_id, kind, ts: Utc::now() };
        vec.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<PipelineRunEvent> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }
}
