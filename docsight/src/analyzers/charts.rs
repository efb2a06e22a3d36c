//! Rule-based chart recommendations for a profiled dataset.
//!
//! ## Architecture
//!
//! - [`ChartRule`] trait for implementing a single recommendation heuristic
//! - [`ChartSuggestion`] representing one recommended chart
//! - Individual rules for trends, comparisons, relationships, distributions,
//!   composition and heatmaps
//! - [`ChartRecommender`] for evaluating rules, filtering and ranking
//!
//! Each rule boosts its confidence when it matches the caller's
//! [`AnalysisGoal`].
//!
//! ## Example Usage
//!
//! ```rust
//! use docsight::analyzers::{AnalysisGoal, ChartRecommender, Row, TabularProfiler};
//!
//! let headers = ["region", "sales"];
//! let rows: Vec<Row> = (0..20)
//!     .map(|i| Row::new().with("region", ["north", "south"][i % 2]).with("sales", (i * 7 + 3) as f64))
//!     .collect();
//! let analysis = TabularProfiler::new().profile(&headers, &rows);
//!
//! let recommender = ChartRecommender::with_default_rules();
//! let charts = recommender.recommend(&analysis, AnalysisGoal::Comparison);
//! assert_eq!(charts[0].chart_type, "bar");
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::analyzers::correlation::CorrelationStrength;
use crate::analyzers::inference::InferredType;
use crate::analyzers::profiler::{ColumnProfile, DatasetAnalysis};

/// Primary intent of a visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisGoal {
    Trends,
    Comparison,
    Distribution,
    Relationship,
    Composition,
    Overview,
}

impl std::str::FromStr for AnalysisGoal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trends" => Ok(AnalysisGoal::Trends),
            "comparison" => Ok(AnalysisGoal::Comparison),
            "distribution" => Ok(AnalysisGoal::Distribution),
            "relationship" => Ok(AnalysisGoal::Relationship),
            "composition" => Ok(AnalysisGoal::Composition),
            "overview" => Ok(AnalysisGoal::Overview),
            other => Err(format!("unknown analysis goal: {other}")),
        }
    }
}

/// Axes and grouping for a suggested chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
}

/// A recommended chart with confidence and reasoning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSuggestion {
    /// Chart type (e.g. "line", "bar", "scatter")
    pub chart_type: String,
    /// Confidence score from 0.0 to 1.0
    pub confidence: f64,
    pub reasoning: String,
    pub config: ChartConfig,
    /// How likely the chart is to surface something interesting, 0.0 to 1.0
    pub insights_potential: f64,
}

/// Trait for implementing chart recommendation rules
pub trait ChartRule: Send + Sync {
    /// Apply this rule to an analysis and return suggested charts
    fn apply(&self, analysis: &DatasetAnalysis, goal: AnalysisGoal) -> Vec<ChartSuggestion>;

    /// Get a human-readable name for this rule
    fn name(&self) -> &str;

    /// Whether the rule produces advanced chart types
    fn is_advanced(&self) -> bool {
        false
    }
}

fn goal_confidence(goal: AnalysisGoal, matching: AnalysisGoal, boosted: f64, base: f64) -> f64 {
    if goal == matching {
        boosted
    } else {
        base
    }
}

fn numeric_columns(analysis: &DatasetAnalysis) -> Vec<&ColumnProfile> {
    analysis.columns_of_type(InferredType::Number).collect()
}

/// Date column plus numeric column: line chart over time.
pub struct TrendRule;

impl ChartRule for TrendRule {
    fn apply(&self, analysis: &DatasetAnalysis, goal: AnalysisGoal) -> Vec<ChartSuggestion> {
        let Some(date) = analysis.columns_of_type(InferredType::Date).next() else {
            return Vec::new();
        };
        let Some(value) = numeric_columns(analysis).first().copied() else {
            return Vec::new();
        };

        vec![ChartSuggestion {
            chart_type: "line".to_string(),
            confidence: goal_confidence(goal, AnalysisGoal::Trends, 0.9, 0.6),
            reasoning: format!("'{}' is a date column, so '{}' can be tracked over time", date.name, value.name),
            config: ChartConfig {
                title: format!("{} over time", value.name),
                x_axis: Some(date.name.clone()),
                y_axis: Some(value.name.clone()),
                ..ChartConfig::default()
            },
            insights_potential: 0.8,
        }]
    }

    fn name(&self) -> &str {
        "trend"
    }
}

/// Categorical column plus numeric column: bar chart of averages per category.
pub struct ComparisonRule;

impl ChartRule for ComparisonRule {
    fn apply(&self, analysis: &DatasetAnalysis, goal: AnalysisGoal) -> Vec<ChartSuggestion> {
        let Some(category) = analysis.categorical_columns().next() else {
            return Vec::new();
        };
        let Some(value) = numeric_columns(analysis).first().copied() else {
            return Vec::new();
        };

        vec![ChartSuggestion {
            chart_type: "bar".to_string(),
            confidence: goal_confidence(goal, AnalysisGoal::Comparison, 0.85, 0.6),
            reasoning: format!(
                "'{}' has {} categories to compare by average '{}'",
                category.name, category.unique_count, value.name
            ),
            config: ChartConfig {
                title: format!("Average {} by {}", value.name, category.name),
                x_axis: Some(category.name.clone()),
                y_axis: Some(value.name.clone()),
                aggregation: Some("average".to_string()),
                ..ChartConfig::default()
            },
            insights_potential: 0.7,
        }]
    }

    fn name(&self) -> &str {
        "comparison"
    }
}

/// One scatter plot per reported correlation.
pub struct RelationshipRule;

impl ChartRule for RelationshipRule {
    fn apply(&self, analysis: &DatasetAnalysis, goal: AnalysisGoal) -> Vec<ChartSuggestion> {
        analysis
            .correlations
            .iter()
            .map(|pair| {
                let confidence: f64 = match pair.strength {
                    CorrelationStrength::Strong => 0.9,
                    CorrelationStrength::Moderate => 0.75,
                    CorrelationStrength::Weak => 0.5,
                };
                let boost: f64 = if goal == AnalysisGoal::Relationship { 0.05 } else { 0.0 };
                ChartSuggestion {
                    chart_type: "scatter".to_string(),
                    confidence: (confidence + boost).min(1.0),
                    reasoning: format!(
                        "'{}' and '{}' show a {} correlation (r = {})",
                        pair.column1, pair.column2, pair.strength, pair.correlation
                    ),
                    config: ChartConfig {
                        title: format!("{} vs {}", pair.column2, pair.column1),
                        x_axis: Some(pair.column1.clone()),
                        y_axis: Some(pair.column2.clone()),
                        ..ChartConfig::default()
                    },
                    insights_potential: pair.correlation.abs(),
                }
            })
            .collect()
    }

    fn name(&self) -> &str {
        "relationship"
    }
}

/// Histogram for each numeric column.
pub struct DistributionRule;

impl ChartRule for DistributionRule {
    fn apply(&self, analysis: &DatasetAnalysis, goal: AnalysisGoal) -> Vec<ChartSuggestion> {
        numeric_columns(analysis)
            .into_iter()
            .map(|column| {
                let spread = column
                    .numeric_stats()
                    .map(|s| if s.std_dev > 0.0 { 0.6 } else { 0.2 })
                    .unwrap_or(0.2);
                ChartSuggestion {
                    chart_type: "histogram".to_string(),
                    confidence: goal_confidence(goal, AnalysisGoal::Distribution, 0.8, 0.55),
                    reasoning: format!("'{}' is numeric; a histogram shows how its values spread", column.name),
                    config: ChartConfig {
                        title: format!("Distribution of {}", column.name),
                        x_axis: Some(column.name.clone()),
                        aggregation: Some("count".to_string()),
                        ..ChartConfig::default()
                    },
                    insights_potential: spread,
                }
            })
            .collect()
    }

    fn name(&self) -> &str {
        "distribution"
    }
}

/// Pie chart for categorical columns with few distinct values.
pub struct CompositionRule {
    max_slices: usize,
}

impl CompositionRule {
    pub fn new() -> Self {
        Self { max_slices: 7 }
    }

    pub fn max_slices(mut self, max: usize) -> Self {
        self.max_slices = max;
        self
    }
}

impl Default for CompositionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRule for CompositionRule {
    fn apply(&self, analysis: &DatasetAnalysis, goal: AnalysisGoal) -> Vec<ChartSuggestion> {
        analysis
            .categorical_columns()
            .filter(|column| column.unique_count <= self.max_slices)
            .map(|column| ChartSuggestion {
                chart_type: "pie".to_string(),
                confidence: goal_confidence(goal, AnalysisGoal::Composition, 0.8, 0.5),
                reasoning: format!(
                    "'{}' has {} categories, few enough to read as shares of a whole",
                    column.name, column.unique_count
                ),
                config: ChartConfig {
                    title: format!("Share by {}", column.name),
                    series: Some(vec![column.name.clone()]),
                    aggregation: Some("count".to_string()),
                    ..ChartConfig::default()
                },
                insights_potential: 0.5,
            })
            .collect()
    }

    fn name(&self) -> &str {
        "composition"
    }
}

/// Correlation heatmap across three or more numeric columns.
pub struct HeatmapRule;

impl ChartRule for HeatmapRule {
    fn apply(&self, analysis: &DatasetAnalysis, goal: AnalysisGoal) -> Vec<ChartSuggestion> {
        let numeric = numeric_columns(analysis);
        if numeric.len() < 3 {
            return Vec::new();
        }
        vec![ChartSuggestion {
            chart_type: "heatmap".to_string(),
            confidence: goal_confidence(goal, AnalysisGoal::Relationship, 0.8, 0.6),
            reasoning: format!("{} numeric columns can be compared pairwise in one view", numeric.len()),
            config: ChartConfig {
                title: "Correlation matrix".to_string(),
                series: Some(numeric.iter().map(|c| c.name.clone()).collect()),
                ..ChartConfig::default()
            },
            insights_potential: 0.7,
        }]
    }

    fn name(&self) -> &str {
        "heatmap"
    }

    fn is_advanced(&self) -> bool {
        true
    }
}

/// Engine that evaluates chart rules and ranks their suggestions
pub struct ChartRecommender {
    rules: Vec<Box<dyn ChartRule>>,
    confidence_threshold: f64,
    max_recommendations: usize,
    include_advanced: bool,
    exclude_chart_types: HashSet<String>,
}

impl Default for ChartRecommender {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRecommender {
    /// Create an engine without rules
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            confidence_threshold: 0.0,
            max_recommendations: 5,
            include_advanced: false,
            exclude_chart_types: HashSet::new(),
        }
    }

    /// Create an engine with every built-in rule
    pub fn with_default_rules() -> Self {
        Self::new()
            .add_rule(Box::new(TrendRule))
            .add_rule(Box::new(ComparisonRule))
            .add_rule(Box::new(RelationshipRule))
            .add_rule(Box::new(DistributionRule))
            .add_rule(Box::new(CompositionRule::new()))
            .add_rule(Box::new(HeatmapRule))
    }

    pub fn add_rule(mut self, rule: Box<dyn ChartRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Set the minimum confidence for a suggestion to be kept
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the maximum number of suggestions, clamped to 1..=10
    pub fn max_recommendations(mut self, max: usize) -> Self {
        self.max_recommendations = max.clamp(1, 10);
        self
    }

    /// Enable rules producing advanced chart types such as heatmaps
    pub fn include_advanced(mut self, include: bool) -> Self {
        self.include_advanced = include;
        self
    }

    pub fn exclude_chart_type(mut self, chart_type: impl Into<String>) -> Self {
        self.exclude_chart_types.insert(chart_type.into());
        self
    }

    /// Recommend charts, best first.
    #[instrument(skip(self, analysis))]
    pub fn recommend(&self, analysis: &DatasetAnalysis, goal: AnalysisGoal) -> Vec<ChartSuggestion> {
        let mut suggestions = Vec::new();

        for rule in &self.rules {
            if rule.is_advanced() && !self.include_advanced {
                continue;
            }
            let rule_suggestions = rule.apply(analysis, goal);
            debug!(
                rule = rule.name(),
                suggestions_count = rule_suggestions.len(),
                "Applied chart rule"
            );
            suggestions.extend(rule_suggestions);
        }

        suggestions.retain(|s| {
            s.confidence >= self.confidence_threshold
                && !self.exclude_chart_types.contains(&s.chart_type)
        });

        // Stable sort keeps rule order among equal confidences
        suggestions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.insights_potential
                        .partial_cmp(&a.insights_potential)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        suggestions.truncate(self.max_recommendations);
        suggestions
    }

    /// Recommend charts using only the given columns.
    pub fn recommend_for_columns(
        &self,
        analysis: &DatasetAnalysis,
        goal: AnalysisGoal,
        columns: &[&str],
    ) -> Vec<ChartSuggestion> {
        let mut focused = analysis.clone();
        focused.columns.retain(|c| columns.contains(&c.name.as_str()));
        focused
            .correlations
            .retain(|p| columns.contains(&p.column1.as_str()) && columns.contains(&p.column2.as_str()));
        self.recommend(&focused, goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::cell::Row;
    use crate::analyzers::profiler::TabularProfiler;

    fn sales_analysis() -> DatasetAnalysis {
        let regions = ["north", "south", "east"];
        let rows: Vec<Row> = (0..30)
            .map(|i| {
                Row::new()
                    .with("date", format!("2024-01-{:02}", i % 28 + 1))
                    .with("region", regions[i % 3])
                    .with("units", (i + 2) as f64)
                    .with("revenue", ((i + 2) * 10) as f64)
                    .with("cost", (100 - i) as f64)
            })
            .collect();
        TabularProfiler::new().profile(&["date", "region", "units", "revenue", "cost"], &rows)
    }

    #[test]
    fn test_fixture_types() {
        let analysis = sales_analysis();
        assert_eq!(analysis.column("date").unwrap().inferred_type, InferredType::Date);
        assert!(analysis.column("region").unwrap().is_categorical());
        assert_eq!(analysis.summary.numeric_columns, 3);
    }

    #[test]
    fn test_goal_boosts_matching_rule() {
        let analysis = sales_analysis();
        let recommender = ChartRecommender::with_default_rules().max_recommendations(10);

        let trends = recommender.recommend(&analysis, AnalysisGoal::Trends);
        let line = trends.iter().find(|s| s.chart_type == "line").unwrap();
        assert_eq!(line.confidence, 0.9);
        assert_eq!(line.config.x_axis.as_deref(), Some("date"));

        let comparison = recommender.recommend(&analysis, AnalysisGoal::Comparison);
        let bar = comparison.iter().find(|s| s.chart_type == "bar").unwrap();
        assert_eq!(bar.confidence, 0.85);
        assert_eq!(bar.config.aggregation.as_deref(), Some("average"));
    }

    #[test]
    fn test_scatter_per_correlation() {
        let analysis = sales_analysis();
        let scatters: Vec<ChartSuggestion> = RelationshipRule.apply(&analysis, AnalysisGoal::Overview);
        assert_eq!(scatters.len(), analysis.correlations.len());
        assert!(scatters.iter().all(|s| s.confidence == 0.9));
    }

    #[test]
    fn test_relationship_goal_raises_scatter_confidence() {
        let analysis = sales_analysis();
        let scatters = RelationshipRule.apply(&analysis, AnalysisGoal::Relationship);
        assert!(!scatters.is_empty());
        for scatter in &scatters {
            assert!((scatter.confidence - 0.95).abs() < 1e-12);
            assert!(scatter.confidence <= 1.0);
        }
    }

    #[test]
    fn test_max_and_ordering() {
        let analysis = sales_analysis();
        let suggestions = ChartRecommender::with_default_rules().recommend(&analysis, AnalysisGoal::Overview);
        assert!(suggestions.len() <= 5);
        assert!(suggestions
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_heatmap_requires_advanced() {
        let analysis = sales_analysis();
        let basic = ChartRecommender::with_default_rules()
            .max_recommendations(10)
            .recommend(&analysis, AnalysisGoal::Relationship);
        assert!(basic.iter().all(|s| s.chart_type != "heatmap"));

        let advanced = ChartRecommender::with_default_rules()
            .max_recommendations(10)
            .include_advanced(true)
            .recommend(&analysis, AnalysisGoal::Relationship);
        assert!(advanced.iter().any(|s| s.chart_type == "heatmap"));
    }

    #[test]
    fn test_exclusions_and_threshold() {
        let analysis = sales_analysis();
        let suggestions = ChartRecommender::with_default_rules()
            .max_recommendations(10)
            .exclude_chart_type("scatter")
            .confidence_threshold(0.7)
            .recommend(&analysis, AnalysisGoal::Overview);
        assert!(suggestions.iter().all(|s| s.chart_type != "scatter"));
        assert!(suggestions.iter().all(|s| s.confidence >= 0.7));
    }

    #[test]
    fn test_pie_skips_many_categories() {
        let rows: Vec<Row> = (0..40)
            .map(|i| Row::new().with("bucket", format!("b{}", i % 10)))
            .collect();
        let analysis = TabularProfiler::new().profile(&["bucket"], &rows);
        assert!(analysis.columns[0].is_categorical());
        assert!(CompositionRule::new().apply(&analysis, AnalysisGoal::Composition).is_empty());
        assert_eq!(
            CompositionRule::new()
                .max_slices(10)
                .apply(&analysis, AnalysisGoal::Composition)
                .len(),
            1
        );
    }

    #[test]
    fn test_focus_columns() {
        let analysis = sales_analysis();
        let suggestions = ChartRecommender::with_default_rules()
            .max_recommendations(10)
            .recommend_for_columns(&analysis, AnalysisGoal::Overview, &["units"]);
        assert!(suggestions.iter().all(|s| s.chart_type == "histogram"));
        assert_eq!(suggestions.len(), 1);
    }

    #[test]
    fn test_goal_from_str() {
        assert_eq!("Trends".parse::<AnalysisGoal>().unwrap(), AnalysisGoal::Trends);
        assert!("nonsense".parse::<AnalysisGoal>().is_err());
    }
}
