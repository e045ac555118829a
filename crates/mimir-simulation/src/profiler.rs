//! `Profiler` (§4.8): per-column statistics and a heuristic quality score,
//! computed over a systematic sample rather than the full dataset so
//! profiling stays cheap on large sources.

use std::collections::HashMap;

use mimir_domain::schema::{ColumnProfile, DatasetProfile, NumericStats, StringLengthStats};
use serde_json::Value;

fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
}

/// Picks every `stride`-th row so a profile over a huge dataset still
/// reflects its full span rather than just the head.
fn systematic_sample<'a>(rows: &'a [HashMap<String, Value>], sample_size: usize) -> Vec<&'a HashMap<String, Value>> {
    if sample_size == 0 || rows.len() <= sample_size {
        return rows.iter().collect();
    }
    let stride = (rows.len() / sample_size).max(1);
    rows.iter().step_by(stride).collect()
}

fn numeric_stats(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 { (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0 } else { sorted[n / 2] };
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    Some(NumericStats { mean, median, stddev: variance.sqrt(), min: sorted[0], max: sorted[n - 1] })
}

fn string_length_stats(values: &[String]) -> Option<StringLengthStats> {
    if values.is_empty() {
        return None;
    }
    let lengths: Vec<usize> = values.iter().map(|s| s.chars().count()).collect();
    let min = *lengths.iter().min().unwrap();
    let max = *lengths.iter().max().unwrap();
    let avg = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    Some(StringLengthStats { min, max, avg })
}

/// §4.8's quality-score penalties: a column starts at `1.0` and loses
/// points for signs it'll be awkward to model (mostly-null, a single
/// dominant value, wildly varying string lengths) or that an assumed
/// identifier isn't actually unique.
fn quality_score(name: &str, total: usize, null_percent: f64, top_values: &[(String, usize)], distinct: usize, string_length: Option<StringLengthStats>) -> f64 {
    let mut score = 1.0;
    if null_percent > 0.2 {
        score -= 0.3 * (null_percent / 1.0).min(1.0);
    }
    if let Some((_, count)) = top_values.first() {
        let dominant_fraction = *count as f64 / total.max(1) as f64;
        if dominant_fraction > 0.9 {
            score -= 0.3;
        }
    }
    if let Some(sl) = string_length {
        if sl.avg > 0.0 && (sl.max as f64) > sl.avg * 5.0 {
            score -= 0.15;
        }
    }
    let looks_like_id = name.eq_ignore_ascii_case("id") || name.to_lowercase().ends_with("_id") || name.to_lowercase().ends_with("id");
    if looks_like_id && total > 0 && distinct < total {
        score -= 0.25;
    }
    score.clamp(0.0, 1.0)
}

pub fn profile_dataset(dataset_name: &str, rows: &[HashMap<String, Value>], sample_size: usize) -> DatasetProfile {
    let sample = systematic_sample(rows, sample_size);
    let total = sample.len();

    let mut column_names: Vec<String> = Vec::new();
    for row in &sample {
        for key in row.keys() {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
        }
    }

    let mut columns = Vec::with_capacity(column_names.len());
    for name in &column_names {
        let mut null_count = 0usize;
        let mut distinct_counts: HashMap<String, usize> = HashMap::new();
        let mut numeric_values = Vec::new();
        let mut string_values = Vec::new();

        for row in &sample {
            match row.get(name) {
                None | Some(Value::Null) => null_count += 1,
                Some(v) => {
                    *distinct_counts.entry(stringify(v)).or_insert(0) += 1;
                    if let Some(n) = as_f64(v) {
                        numeric_values.push(n);
                    }
                    if let Value::String(s) = v {
                        string_values.push(s.clone());
                    }
                }
            }
        }

        let mut top_values: Vec<(String, usize)> = distinct_counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        top_values.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_values.truncate(10);

        let numeric = numeric_stats(&numeric_values);
        let string_length = string_length_stats(&string_values);
        let null_percent = null_count as f64 / total.max(1) as f64;
        let distinct_percent = distinct_counts.len() as f64 / total.max(1) as f64;

        let quality = quality_score(name, total, null_percent, &top_values, distinct_counts.len(), string_length);

        columns.push(ColumnProfile {
            name: name.clone(),
            total,
            distinct: distinct_counts.len(),
            null_count,
            null_percent,
            distinct_percent,
            numeric,
            string_length,
            top_values,
            quality_score: quality,
        });
    }

    DatasetProfile { dataset_name: dataset_name.to_string(), row_count: rows.len(), columns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows_with_nulls() -> Vec<HashMap<String, Value>> {
        (0..10)
            .map(|i| {
                let mut m = HashMap::new();
                if i % 3 == 0 {
                    m.insert("note".to_string(), Value::Null);
                } else {
                    m.insert("note".to_string(), json!("ok"));
                }
                m.insert("id".to_string(), json!(i));
                m
            })
            .collect()
    }

    #[test]
    fn dominant_value_penalizes_quality() {
        let rows = rows_with_nulls();
        let profile = profile_dataset("widgets", &rows, 0);
        let note = profile.columns.iter().find(|c| c.name == "note").unwrap();
        assert!(note.quality_score < 1.0);
    }

    #[test]
    fn systematic_sample_covers_full_span_when_capped() {
        let rows: Vec<HashMap<String, Value>> = (0..100)
            .map(|i| {
                let mut m = HashMap::new();
                m.insert("id".to_string(), json!(i));
                m
            })
            .collect();
        let profile = profile_dataset("widgets", &rows, 10);
        assert_eq!(profile.row_count, 100);
        assert!(profile.columns[0].total <= 11);
    }
}
