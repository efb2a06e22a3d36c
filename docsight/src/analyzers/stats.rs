//! Descriptive statistics for profiled columns.
//!
//! Numeric statistics are computed in two explicit passes over the sorted
//! values: the first derives the mean, the second sums squared deviations from
//! it. The median is the lower median (`sorted[n / 2]`), never an average of the
//! two middle elements.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analyzers::cell::Cell;

/// Summary statistics for a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl NumericStats {
    /// Computes statistics over finite values, returning `None` if there are none.
    pub fn compute(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len() as f64;

        // Pass 1
        let mean = sorted.iter().fold(0.0, |sum, v| sum + v) / count;

        // Pass 2
        let squared_deviations = sorted
            .iter()
            .fold(0.0, |sum, v| sum + (v - mean).powi(2));
        let std_dev = (squared_deviations / count).sqrt();

        Some(Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            median: sorted[sorted.len() / 2],
            std_dev,
        })
    }
}

/// Statistics attached to a column profile, depending on its inferred type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnStats {
    Numeric(NumericStats),
    Categorical { mode: String },
}

impl ColumnStats {
    pub fn numeric(&self) -> Option<&NumericStats> {
        match self {
            ColumnStats::Numeric(stats) => Some(stats),
            ColumnStats::Categorical { .. } => None,
        }
    }

    pub fn mode(&self) -> Option<&str> {
        match self {
            ColumnStats::Categorical { mode } => Some(mode),
            ColumnStats::Numeric(_) => None,
        }
    }
}

/// Most frequent display value among `values`.
///
/// Frequencies are keyed by the value's display text, so the number `1` and the
/// text `"1"` count together. Keys that look like array indices (`"0"`, `"17"`)
/// are visited first in ascending order, then the remaining keys in first-seen
/// order; on equal frequency the key visited later wins.
pub fn mode<'a>(values: impl IntoIterator<Item = &'a Cell>) -> Option<String> {
    let mut frequency: HashMap<String, usize> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    for cell in values {
        let key = cell.to_string();
        let count = frequency.entry(key.clone()).or_insert(0);
        if *count == 0 {
            first_seen.push(key);
        }
        *count += 1;
    }

    let mut index_keys: Vec<(u32, String)> = Vec::new();
    let mut other_keys: Vec<String> = Vec::new();
    for key in first_seen {
        match array_index(&key) {
            Some(index) => index_keys.push((index, key)),
            None => other_keys.push(key),
        }
    }
    index_keys.sort_by_key(|(index, _)| *index);

    index_keys
        .into_iter()
        .map(|(_, key)| key)
        .chain(other_keys)
        .reduce(|best, candidate| {
            if frequency[&best] > frequency[&candidate] {
                best
            } else {
                candidate
            }
        })
}

/// Canonical non-negative integer below 2^32 - 1 without leading zeros.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<u32>().ok().filter(|index| *index < u32::MAX)
}
