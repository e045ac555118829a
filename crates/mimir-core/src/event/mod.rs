//! Event types: the append-only per-run audit log (`store`/`types`) and
//! the cross-subsystem publish/subscribe bus (`bus`).

pub mod bus;
pub mod store;
pub mod types;

pub use bus::{EventBus, Subscription, SystemEvent};
pub use store::{EventStore, InMemoryEventStore};
pub use types::{PipelineEventKind, PipelineRunEvent};
