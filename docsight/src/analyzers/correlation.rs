//! Pairwise Pearson correlation between numeric columns.
//!
//! For every pair of numeric columns `(i, j)` with `i < j` in column order, rows
//! where both cells are present and parse to finite numbers form the `(x, y)`
//! sample. Pairs with
//! fewer than two such rows are skipped entirely. Only coefficients whose
//! magnitude exceeds the reporting threshold are emitted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::cell::{Cell, Row};

/// Qualitative bucket for the magnitude of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

impl CorrelationStrength {
    /// `|r| > 0.7` is strong, `|r| > 0.4` moderate, anything else weak.
    pub fn classify(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude > 0.7 {
            CorrelationStrength::Strong
        } else if magnitude > 0.4 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorrelationStrength::Weak => "weak",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Strong => "strong",
        }
    }
}

impl std::fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reported correlation between two numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPair {
    pub column1: String,
    pub column2: String,
    /// Pearson coefficient rounded to three decimals
    pub correlation: f64,
    pub strength: CorrelationStrength,
}

/// Running sums for the raw-sum Pearson formula.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationState {
    /// Number of valid pairs
    pub n: u64,
    pub sum_x: f64,
    pub sum_y: f64,
    pub sum_x2: f64,
    pub sum_y2: f64,
    pub sum_xy: f64,
}

impl CorrelationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, x: f64, y: f64) {
        self.n += 1;
        self.sum_x += x;
        self.sum_y += y;
        self.sum_x2 += x * x;
        self.sum_y2 += y * y;
        self.sum_xy += x * y;
    }

    /// Pearson's r over the accumulated pairs.
    ///
    /// Returns `0.0` when there are no pairs or the denominator is zero (a
    /// constant column). The result is clamped to `[-1, 1]` to absorb rounding.
    pub fn pearson(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let n = self.n as f64;
        let numerator = n * self.sum_xy - self.sum_x * self.sum_y;
        let denominator = ((n * self.sum_x2 - self.sum_x * self.sum_x)
            * (n * self.sum_y2 - self.sum_y * self.sum_y))
            .sqrt();

        if denominator == 0.0 || denominator.is_nan() {
            0.0
        } else {
            (numerator / denominator).clamp(-1.0, 1.0)
        }
    }
}

impl FromIterator<(f64, f64)> for CorrelationState {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        let mut state = CorrelationState::new();
        for (x, y) in iter {
            state.update(x, y);
        }
        state
    }
}

/// Rounds half up to three decimals.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0 + 0.5).floor() / 1000.0
}

// Empty text would otherwise coerce to 0.
fn numeric_value(cell: &Cell) -> Option<f64> {
    if cell.is_missing() {
        return None;
    }
    cell.as_number()
}

/// Finds notable correlations among `numeric_columns` over `rows`.
///
/// A pair is emitted only when `|r| > threshold`. Output order is the nested
/// loop order over `numeric_columns`.
pub fn find_correlations(
    rows: &[Row],
    numeric_columns: &[&str],
    threshold: f64,
) -> Vec<CorrelationPair> {
    let mut correlations = Vec::new();

    for (i, column1) in numeric_columns.iter().enumerate() {
        for column2 in &numeric_columns[i + 1..] {
            let state: CorrelationState = rows
                .iter()
                .filter_map(|row| {
                    let x = numeric_value(row.get(column1))?;
                    let y = numeric_value(row.get(column2))?;
                    (x.is_finite() && y.is_finite()).then_some((x, y))
                })
                .collect();

            if state.n < 2 {
                debug!(
                    column1 = *column1,
                    column2 = *column2,
                    pairs = state.n,
                    "Skipping correlation with too few valid pairs"
                );
                continue;
            }

            let r = state.pearson();
            if r.abs() > threshold {
                correlations.push(CorrelationPair {
                    column1: column1.to_string(),
                    column2: column2.to_string(),
                    correlation: round3(r),
                    strength: CorrelationStrength::classify(r),
                });
            }
        }
    }

    correlations
}
