//! Cross-subsystem publish/subscribe event bus (§4.5).
//!
//! `SystemEvent` is the shared vocabulary every subsystem publishes onto:
//! the pipeline runtime, the scheduler, the ontology store, and the
//! simulation engine all emit `SystemEvent`s instead of calling into each
//! other directly. Subscribers get a bounded, drop-oldest queue — a slow
//! subscriber can't make a publisher block, and silent data loss is
//! exposed as a counted drop rather than an unbounded queue or a panic.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default per-subscriber queue capacity, used when `EventBus::new`'s
/// caller doesn't have a stronger opinion.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SystemEvent {
    OntologyCreated { ontology_id: Uuid },
    OntologyDeprecated { ontology_id: Uuid },
    TwinCreated { twin_id: Uuid, ontology_id: Uuid },
    SimulationCompleted { run_id: Uuid, twin_id: Uuid },
    SimulationFailed { run_id: Uuid, reason: String },
    PipelineCompleted { run_id: Uuid, pipeline_id: String },
    PipelineFailed { run_id: Uuid, pipeline_id: String, reason: String },
    JobTriggered { job_id: Uuid, pipeline_id: String },
}

struct Subscriber {
    queue: Mutex<VecDeque<SystemEvent>>,
    capacity: usize,
    dropped: AtomicU64,
}

/// Handle returned by `EventBus::subscribe`. Clone-free: callers `drain`
/// to pull whatever has accumulated since the last poll.
pub struct Subscription {
    inner: Arc<Subscriber>,
}

impl Subscription {
    /// Pulls every event currently queued, oldest first.
    pub fn drain(&self) -> Vec<SystemEvent> {
        let mut q = self.inner.queue.lock().unwrap();
        q.drain(..).collect()
    }

    /// Count of events dropped because this subscriber fell behind.
    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Arc<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { subscribers: Mutex::new(Vec::new()) }
    }

    /// Registers a new subscriber with the default bounded capacity.
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn subscribe_with_capacity(&self, capacity: usize) -> Subscription {
        let inner = Arc::new(Subscriber {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
            dropped: AtomicU64::new(0),
        });
        self.subscribers.lock().unwrap().push(inner.clone());
        Subscription { inner }
    }

    /// Publishes to every live subscriber. Full queues drop their oldest
    /// entry and count it; the publisher never blocks or errors.
    pub fn publish(&self, event: SystemEvent) {
        let subs = self.subscribers.lock().unwrap();
        for sub in subs.iter() {
            let mut q = sub.queue.lock().unwrap();
            if q.len() >= sub.capacity {
                q.pop_front();
                sub.dropped.fetch_add(1, Ordering::Relaxed);
            }
            q.push_back(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_when_full() {
        let bus = EventBus::new();
        let sub = bus.subscribe_with_capacity(2);
        for i in 0..5u64 {
            bus.publish(SystemEvent::JobTriggered { job_id: Uuid::nil(), pipeline_id: i.to_string() });
        }
        let drained = sub.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(sub.dropped_count(), 3);
    }

    #[test]
    fn fans_out_to_every_subscriber() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(SystemEvent::OntologyCreated { ontology_id: Uuid::nil() });
        assert_eq!(a.drain().len(), 1);
        assert_eq!(b.drain().len(), 1);
    }
}
