//! Column/schema types produced by `SchemaInference` (§4.7) and consumed by
//! `Profiler` and `TwinBuilder`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
    String,
    Uri,
    Categorical,
}

impl InferredType {
    /// Majority-vote tie-break order from §4.7, most to least specific.
    pub const TIE_BREAK_ORDER: [InferredType; 8] = [
        InferredType::Integer,
        InferredType::Decimal,
        InferredType::Boolean,
        InferredType::Date,
        InferredType::DateTime,
        InferredType::Uri,
        InferredType::Categorical,
        InferredType::String,
    ];

    pub fn rank(&self) -> usize {
        Self::TIE_BREAK_ORDER.iter().position(|t| t == self).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub inferred_type: InferredType,
    pub nullable: bool,
    pub distinct_count: usize,
    pub sample_values: Vec<String>,
    pub confidence: f64,
    pub is_candidate_key: bool,
}

/// A detected foreign-key relationship: `column` in the owning table refers
/// to `references_key` in `references_table`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    pub column: String,
    pub references_table: String,
    pub references_key: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSchema {
    pub dataset_name: String,
    pub columns: Vec<ColumnSchema>,
    pub foreign_keys: Vec<ForeignKeyEdge>,
}

impl DataSchema {
    pub fn candidate_keys(&self) -> Vec<&ColumnSchema> {
        self.columns.iter().filter(|c| c.is_candidate_key).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Per-column statistics and quality score emitted by `Profiler` (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub total: usize,
    pub distinct: usize,
    pub null_count: usize,
    pub null_percent: f64,
    pub distinct_percent: f64,
    pub numeric: Option<NumericStats>,
    pub string_length: Option<StringLengthStats>,
    pub top_values: Vec<(String, usize)>,
    pub quality_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NumericStats {
    pub mean: f64,
    pub median: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StringLengthStats {
    pub min: usize,
    pub max: usize,
    pub avg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub dataset_name: String,
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
}
