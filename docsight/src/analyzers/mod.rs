//! Tabular analysis: profiling, statistics, correlations and downstream consumers.
//!
//! ## Available Analyzers
//!
//! - **Cells** (`cell`): the loosely-typed cell values parsers produce
//! - **Type Inference** (`inference`): boolean → numeric → date classification and the type vote
//! - **Statistics** (`stats`): two-pass numeric statistics and categorical mode
//! - **Correlation** (`correlation`): pairwise Pearson discovery over numeric columns
//! - **Tabular Profiler** (`profiler`): the end-to-end profile of a parsed table
//! - **Data Quality** (`quality`): completeness, consistency and validity scoring
//! - **Chart Recommendations** (`charts`): rule-based visualization suggestions
//!
//! ## Example Usage
//!
//! ```rust
//! use docsight::analyzers::{QualityAssessor, Row, TabularProfiler};
//!
//! let headers = ["city", "temperature"];
//! let rows: Vec<Row> = vec![
//!     Row::new().with("city", "Oslo").with("temperature", 4.5),
//!     Row::new().with("city", "Lima").with("temperature", 19.0),
//!     Row::new().with("city", "Oslo").with("temperature", ""),
//! ];
//!
//! let profiler = TabularProfiler::new();
//! let analysis = profiler.profile(&headers, &rows);
//! let quality = QualityAssessor::new().assess(&analysis, profiler.sample(&rows));
//!
//! assert_eq!(analysis.columns[1].null_count, 1);
//! assert!(quality.completeness < 100.0);
//! ```

pub mod cell;
pub mod charts;
pub mod correlation;
pub mod inference;
pub mod profiler;
pub mod quality;
pub mod stats;

pub use cell::{parse_number, Cell, CellKey, Row};
pub use charts::{
    AnalysisGoal, ChartConfig, ChartRecommender, ChartRule, ChartSuggestion, ComparisonRule,
    CompositionRule, DistributionRule, HeatmapRule, RelationshipRule, TrendRule,
};
pub use correlation::{CorrelationPair, CorrelationState, CorrelationStrength};
pub use inference::{InferredType, TypeVote};
pub use profiler::{
    ColumnProfile, DatasetAnalysis, DatasetSummary, ProfilerConfig, ProfilerProgress,
    TabularProfiler, TabularProfilerBuilder,
};
pub use quality::{IssueType, QualityAssessment, QualityAssessor, QualityIssue, Severity};
pub use stats::{ColumnStats, NumericStats};
