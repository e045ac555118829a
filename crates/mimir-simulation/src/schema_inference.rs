//! `SchemaInference` (§4.7): turns raw sampled rows into a `DataSchema` —
//! per-column type votes, candidate-key detection, and cross-dataset
//! foreign-key detection. The type vote itself and the key/FK thresholds
//! live in `mimir_policies::schema_policy`; this module only does the
//! per-cell classification and bookkeeping the policy needs to decide.

use std::collections::{HashMap, HashSet};

use mimir_domain::schema::{ColumnSchema, DataSchema, ForeignKeyEdge, InferredType};
use mimir_policies::{is_candidate_foreign_key, is_candidate_key, vote_column_type};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct SchemaInferenceConfig {
    pub fk_min_confidence: f64,
    pub ai_confidence_threshold: f64,
    pub ai_confidence_boost: f64,
    pub use_ai_fallback: bool,
    /// Columns whose winning type is `String` with `distinct/total` at or
    /// below this ratio are reclassified `Categorical` — a small, repeated
    /// value set reads as an enum, not free text.
    pub categorical_distinct_ratio: f64,
}

impl Default for SchemaInferenceConfig {
    fn default() -> Self {
        Self {
            fk_min_confidence: 0.8,
            ai_confidence_threshold: 0.6,
            ai_confidence_boost: 0.15,
            use_ai_fallback: false,
            categorical_distinct_ratio: 0.2,
        }
    }
}

/// A previously inferred candidate key this dataset's columns may reference,
/// e.g. `("customers", "id", {"1", "2", ...})`.
pub struct KnownKey<'a> {
    pub table: &'a str,
    pub column: &'a str,
    pub values: &'a HashSet<String>,
}

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn classify_cell(v: &Value) -> Option<InferredType> {
    match v {
        Value::Null => None,
        Value::Bool(_) => Some(InferredType::Boolean),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Some(InferredType::Integer)
            } else {
                Some(InferredType::Decimal)
            }
        }
        Value::String(s) => {
            if s.contains("://") {
                Some(InferredType::Uri)
            } else if chrono::DateTime::parse_from_rfc3339(s).is_ok() {
                Some(InferredType::DateTime)
            } else if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
                Some(InferredType::Date)
            } else {
                Some(InferredType::String)
            }
        }
        Value::Array(_) | Value::Object(_) => Some(InferredType::String),
    }
}

/// Infers a `DataSchema` over `rows` (each a flat column-name -> value map).
/// `known_keys` lets FK detection look for overlap against keys already
/// inferred for other datasets in the same run.
pub fn infer_schema(
    dataset_name: &str,
    rows: &[HashMap<String, Value>],
    known_keys: &[KnownKey],
    config: &SchemaInferenceConfig,
) -> DataSchema {
    let mut column_names: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
        }
    }

    let total = rows.len().max(1);
    let mut columns = Vec::with_capacity(column_names.len());
    let mut foreign_keys = Vec::new();

    for name in &column_names {
        let mut votes: HashMap<InferredType, usize> = HashMap::new();
        let mut distinct: HashSet<String> = HashSet::new();
        let mut sample_values = Vec::new();
        let mut null_count = 0usize;

        for row in rows {
            match row.get(name) {
                None | Some(Value::Null) => null_count += 1,
                Some(v) => {
                    if let Some(t) = classify_cell(v) {
                        *votes.entry(t).or_insert(0) += 1;
                    }
                    let s = stringify(v);
                    if distinct.insert(s.clone()) && sample_values.len() < 5 {
                        sample_values.push(s);
                    }
                }
            }
        }

        let (winner, rationale) = vote_column_type(&votes);
        let non_null = total - null_count;
        let distinct_percent = distinct.len() as f64 / total as f64;
        let null_percent = null_count as f64 / total as f64;

        let mut confidence = if non_null > 0 { *votes.get(&winner).unwrap_or(&0) as f64 / non_null as f64 } else { 0.0 };
        if config.use_ai_fallback {
            confidence = mimir_policies::apply_ai_confidence_boost(confidence, config.ai_confidence_threshold, config.ai_confidence_boost);
        }
        let _ = rationale; // auditable via TypeVoteRationale if a caller wants it; schema only needs the winner.

        let inferred_type = if winner == InferredType::String && non_null > 0 && distinct_percent <= config.categorical_distinct_ratio {
            InferredType::Categorical
        } else {
            winner
        };

        let is_key = is_candidate_key(distinct_percent, null_percent);

        if !is_key && non_null > 0 {
            for known in known_keys {
                let overlap = distinct.intersection(known.values).count();
                let overlap_fraction = overlap as f64 / distinct.len().max(1) as f64;
                if is_candidate_foreign_key(overlap_fraction, config.fk_min_confidence) {
                    foreign_keys.push(ForeignKeyEdge {
                        column: name.clone(),
                        references_table: known.table.to_string(),
                        references_key: known.column.to_string(),
                        confidence: overlap_fraction,
                    });
                }
            }
        }

        columns.push(ColumnSchema {
            name: name.clone(),
            inferred_type,
            nullable: null_count > 0,
            distinct_count: distinct.len(),
            sample_values,
            confidence,
            is_candidate_key: is_key,
        });
    }

    DataSchema { dataset_name: dataset_name.to_string(), columns, foreign_keys }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: i64, status: &str) -> HashMap<String, Value> {
        let mut m = HashMap::new();
        m.insert("id".to_string(), json!(id));
        m.insert("status".to_string(), json!(status));
        m
    }

    #[test]
    fn integer_column_is_a_candidate_key_when_unique() {
        let rows = vec![row(1, "a"), row(2, "b"), row(3, "a")];
        let schema = infer_schema("widgets", &rows, &[], &SchemaInferenceConfig::default());
        let id_col = schema.column("id").unwrap();
        assert_eq!(id_col.inferred_type, InferredType::Integer);
        assert!(id_col.is_candidate_key);
    }

    #[test]
    fn repeated_small_value_set_becomes_categorical() {
        let rows = vec![row(1, "a"), row(2, "a"), row(3, "a"), row(4, "b"), row(5, "a")];
        let schema = infer_schema("widgets", &rows, &[], &SchemaInferenceConfig::default());
        let status_col = schema.column("status").unwrap();
        assert_eq!(status_col.inferred_type, InferredType::Categorical);
    }

    #[test]
    fn fk_detected_against_known_key_overlap() {
        let rows = vec![row(1, "a"), row(2, "b")];
        let known_values: HashSet<String> = ["1".to_string(), "2".to_string(), "3".to_string()].into_iter().collect();
        let known = KnownKey { table: "widgets", column: "id", values: &known_values };
        let schema = infer_schema("orders", &rows, std::slice::from_ref(&known), &SchemaInferenceConfig::default());
        assert!(schema.foreign_keys.iter().any(|fk| fk.column == "id" && fk.references_table == "widgets"));
    }
}
