//! mimir-policies: pure, deterministic decision rules shared by the
//! simulation engine and the knowledge core — the per-event-kind state
//! transform (§6) and SchemaInference's type/key/FK decision rules (§4.7).

pub mod event_policy;
pub mod schema_policy;

pub use event_policy::apply_event;
pub use schema_policy::{apply_ai_confidence_boost, is_candidate_foreign_key, is_candidate_key, vote_column_type, TypeVoteRationale};
