//! Deterministic decision rules used by `SchemaInference` (§4.7): the
//! majority-vote type tie-break, the candidate-key threshold, and the
//! foreign-key-detection threshold. Each decision carries a `Rationale`
//! so a column's inferred type is auditable, not just a bare value — the
//! same discipline the chemistry property-selection policy this crate
//! replaces used for its `MaxScore` decisions.

use std::collections::HashMap;

use mimir_core::hashing::{hash_str, to_canonical_json};
use mimir_domain::schema::InferredType;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TypeVoteRationale {
    pub votes: HashMap<String, usize>,
    pub winner: String,
    pub ties: Vec<String>,
}

impl TypeVoteRationale {
    pub fn votes_hash(&self) -> String {
        let value = serde_json::to_value(&self.votes).expect("serialize votes");
        hash_str(&to_canonical_json(&value))
    }
}

/// Picks the winning type from per-type vote counts, breaking ties by
/// `InferredType::TIE_BREAK_ORDER` (most to least specific). Returns the
/// winner plus a rationale naming every type that was tied for first.
pub fn vote_column_type(votes: &HashMap<InferredType, usize>) -> (InferredType, TypeVoteRationale) {
    let max_count = votes.values().copied().max().unwrap_or(0);
    let mut tied: Vec<InferredType> = votes.iter().filter(|(_, &c)| c == max_count).map(|(t, _)| *t).collect();
    tied.sort_by_key(|t| t.rank());
    let winner = tied.first().copied().unwrap_or(InferredType::String);

    let rationale = TypeVoteRationale {
        votes: votes.iter().map(|(t, c)| (format!("{t:?}"), *c)).collect(),
        winner: format!("{winner:?}"),
        ties: tied.iter().map(|t| format!("{t:?}")).collect(),
    };
    (winner, rationale)
}

/// §4.7: `distinctPercent >= 0.95 and nullPercent <= 0.05`.
pub fn is_candidate_key(distinct_percent: f64, null_percent: f64) -> bool {
    distinct_percent >= 0.95 && null_percent <= 0.05
}

/// §4.7: a column is a candidate FK when `overlap_fraction` (the share of
/// its non-null values found in the referenced candidate-key set) meets
/// or exceeds `fk_min_confidence`.
pub fn is_candidate_foreign_key(overlap_fraction: f64, fk_min_confidence: f64) -> bool {
    overlap_fraction >= fk_min_confidence
}

/// Optional AI-fallback confidence boost (§4.7): applied only when
/// heuristic confidence is below `threshold`, capped at `1.0`.
pub fn apply_ai_confidence_boost(heuristic_confidence: f64, threshold: f64, boost_delta: f64) -> f64 {
    if heuristic_confidence < threshold {
        (heuristic_confidence + boost_delta).min(1.0)
    } else {
        heuristic_confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_break_prefers_more_specific_type() {
        let mut votes = HashMap::new();
        votes.insert(InferredType::Integer, 3);
        votes.insert(InferredType::String, 3);
        let (winner, rationale) = vote_column_type(&votes);
        assert_eq!(winner, InferredType::Integer);
        assert_eq!(rationale.ties.len(), 2);
    }

    #[test]
    fn candidate_key_requires_both_thresholds() {
        assert!(is_candidate_key(0.96, 0.0));
        assert!(!is_candidate_key(0.96, 0.1));
        assert!(!is_candidate_key(0.8, 0.0));
    }

    #[test]
    fn ai_boost_only_applies_below_threshold() {
        assert_eq!(apply_ai_confidence_boost(0.5, 0.7, 0.2), 0.7);
        assert_eq!(apply_ai_confidence_boost(0.9, 0.7, 0.2), 0.9);
    }
}
