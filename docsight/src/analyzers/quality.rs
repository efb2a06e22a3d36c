//! Data quality assessment over a profiled table.
//!
//! Three percentage scores are derived from the analysis and the rows it was
//! computed on:
//!
//! - **completeness**: non-missing cells over all analyzed cells
//! - **consistency**: per column, the share of values falling into the column's
//!   most common value class (boolean, numeric, date, other), averaged
//! - **validity**: per typed column, the share of values that conform to the
//!   inferred type, averaged; text columns are always valid
//!
//! The overall score weights them `0.5 / 0.2 / 0.3` and is rounded to one decimal.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::cell::{Cell, Row};
use crate::analyzers::inference::{classify, is_boolean_literal, parse_date, InferredType, ValueClass};
use crate::analyzers::profiler::{ColumnProfile, DatasetAnalysis};

/// Kind of quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    MissingData,
    EmptyColumn,
    ConstantColumn,
    InconsistentType,
}

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Severity of a missing-data fraction: up to 0.2 low, up to 0.5 medium.
    pub fn for_missing_fraction(fraction: f64) -> Self {
        if fraction <= 0.2 {
            Severity::Low
        } else if fraction <= 0.5 {
            Severity::Medium
        } else {
            Severity::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    pub affected_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    pub completeness: f64,
    pub consistency: f64,
    pub validity: f64,
    pub overall_score: f64,
    pub issues: Vec<QualityIssue>,
}

/// Computes [`QualityAssessment`]s.
#[derive(Debug, Clone)]
pub struct QualityAssessor {
    missing_data_threshold: f64,
}

impl Default for QualityAssessor {
    fn default() -> Self {
        Self {
            missing_data_threshold: 0.05,
        }
    }
}

impl QualityAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Null fraction above which a column is reported as missing data
    pub fn missing_data_threshold(mut self, threshold: f64) -> Self {
        self.missing_data_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Assesses `analysis`, where `sample` is the slice of rows it analyzed.
    pub fn assess(&self, analysis: &DatasetAnalysis, sample: &[Row]) -> QualityAssessment {
        let rows = analysis.analyzed_rows;
        let total_cells = rows * analysis.column_count;
        let missing_cells: usize = analysis.columns.iter().map(|c| c.null_count).sum();
        let completeness = percentage(total_cells.saturating_sub(missing_cells), total_cells);

        let mut issues = Vec::new();
        let mut consistency_scores = Vec::new();
        let mut validity_scores = Vec::new();

        for column in &analysis.columns {
            let values: Vec<&Cell> = sample
                .iter()
                .map(|row| row.get_by_name(&column.name))
                .filter(|cell| !cell.is_missing())
                .collect();

            if values.is_empty() {
                if rows > 0 {
                    issues.push(QualityIssue {
                        issue_type: IssueType::EmptyColumn,
                        severity: Severity::High,
                        description: format!("Column '{}' has no values", column.name),
                        affected_columns: vec![column.name.clone()],
                        affected_rows: Some(rows),
                    });
                }
                continue;
            }

            consistency_scores.push(dominant_class_share(&values));

            let invalid = values.iter().filter(|cell| !conforms(column, cell)).count();
            validity_scores.push(1.0 - invalid as f64 / values.len() as f64);
            if invalid > 0 {
                issues.push(QualityIssue {
                    issue_type: IssueType::InconsistentType,
                    severity: if invalid * 10 <= values.len() {
                        Severity::Low
                    } else {
                        Severity::Medium
                    },
                    description: format!(
                        "{invalid} values in '{}' are not valid {}",
                        column.name, column.inferred_type
                    ),
                    affected_columns: vec![column.name.clone()],
                    affected_rows: Some(invalid),
                });
            }

            let missing_fraction = column.null_count as f64 / rows as f64;
            if missing_fraction > self.missing_data_threshold {
                issues.push(QualityIssue {
                    issue_type: IssueType::MissingData,
                    severity: Severity::for_missing_fraction(missing_fraction),
                    description: format!(
                        "{:.1}% of values in '{}' are missing",
                        missing_fraction * 100.0,
                        column.name
                    ),
                    affected_columns: vec![column.name.clone()],
                    affected_rows: Some(column.null_count),
                });
            }

            if column.unique_count == 1 && rows > 1 {
                issues.push(QualityIssue {
                    issue_type: IssueType::ConstantColumn,
                    severity: Severity::Low,
                    description: format!("Column '{}' holds a single distinct value", column.name),
                    affected_columns: vec![column.name.clone()],
                    affected_rows: None,
                });
            }
        }

        let consistency = mean_percentage(&consistency_scores);
        let validity = mean_percentage(&validity_scores);
        let overall_score = round1(0.5 * completeness + 0.2 * consistency + 0.3 * validity);

        debug!(
            completeness,
            consistency,
            validity,
            overall_score,
            issues = issues.len(),
            "Assessed data quality"
        );

        QualityAssessment {
            completeness: round1(completeness),
            consistency: round1(consistency),
            validity: round1(validity),
            overall_score,
            issues,
        }
    }
}

fn conforms(column: &ColumnProfile, cell: &Cell) -> bool {
    match column.inferred_type {
        InferredType::Number => cell.as_number().is_some_and(f64::is_finite),
        InferredType::Boolean => is_boolean_literal(cell),
        InferredType::Date => parse_date(&cell.to_string()).is_some(),
        InferredType::String | InferredType::Mixed => true,
    }
}

fn dominant_class_share(values: &[&Cell]) -> f64 {
    let mut counts = [0usize; 4];
    for cell in values {
        let slot = match classify(cell) {
            ValueClass::Boolean => 0,
            ValueClass::Numeric => 1,
            ValueClass::Date => 2,
            ValueClass::Other => 3,
        };
        counts[slot] += 1;
    }
    let dominant = counts.iter().copied().max().unwrap_or(0);
    dominant as f64 / values.len() as f64
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        100.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn mean_percentage(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        100.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64 * 100.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
