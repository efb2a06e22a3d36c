//! Tabular profiling: per-column type inference, statistics and correlations.
//!
//! The [`TabularProfiler`] works on an already-parsed table (headers plus
//! [`Row`]s) and runs in three phases:
//!
//! **Phase 1: Sampling**
//! - Only the first `sample_size` rows are analyzed (default `min(1000, rows)`)
//!
//! **Phase 2: Column profiling**
//! - Count nulls, distinct values and pick up to five sample values
//! - Vote on the column type over its first ten non-missing values
//! - Numeric columns get min/max/mean/median/stdDev over every numeric value
//! - Low-cardinality text columns get a mode
//!
//! **Phase 3: Correlation discovery**
//! - Pearson's r for every pair of numeric columns, reported above `|r| > 0.3`
//!
//! Profiling is a pure function of its input: the same headers and rows always
//! produce an identical [`DatasetAnalysis`].
//!
//! # Example
//!
//! ```rust
//! use docsight::analyzers::{InferredType, Row, TabularProfiler};
//!
//! let headers = vec!["x".to_string(), "y".to_string()];
//! let rows: Vec<Row> = (2..=6)
//!     .map(|i| Row::new().with("x", i).with("y", 2 * i + 1))
//!     .collect();
//!
//! let profiler = TabularProfiler::builder().sample_size(100).build();
//! let analysis = profiler.profile(&headers, &rows);
//!
//! assert_eq!(analysis.columns[0].inferred_type, InferredType::Number);
//! assert_eq!(analysis.correlations.len(), 1);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::analyzers::cell::{Cell, Row};
use crate::analyzers::correlation::{find_correlations, CorrelationPair};
use crate::analyzers::inference::{InferredType, TypeVote};
use crate::analyzers::stats::{mode, ColumnStats, NumericStats};
use crate::error::{DocsightError, Result};

/// Configuration for the profiler.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilerConfig {
    /// Row cap for analysis; `None` or `Some(0)` falls back to `default_sample_cap`
    pub sample_size: Option<usize>,
    /// Cap used when no explicit sample size is given
    pub default_sample_cap: usize,
    /// Run type inference and statistics; when false every column stays `string`
    pub detect_types: bool,
    /// Run pairwise correlation discovery
    pub find_correlations: bool,
    /// Number of leading non-missing values classified per column
    pub type_sample_size: usize,
    /// Fraction a type bucket must exceed to decide the column type
    pub type_threshold: f64,
    /// Distinct/non-null ratio below which a text column is categorical
    pub categorical_ratio: f64,
    /// Maximum number of distinct sample values kept per column
    pub max_sample_values: usize,
    /// Minimum `|r|` (exclusive) for a correlation to be reported
    pub correlation_threshold: f64,
    /// Fail with [`DocsightError::EmptyInput`] on tables without rows or headers
    pub reject_empty: bool,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            sample_size: None,
            default_sample_cap: 1000,
            detect_types: true,
            find_correlations: true,
            type_sample_size: 10,
            type_threshold: 0.8,
            categorical_ratio: 0.5,
            max_sample_values: 5,
            correlation_threshold: 0.3,
            reject_empty: false,
        }
    }
}

impl ProfilerConfig {
    /// Number of rows analyzed out of `total_rows`.
    pub fn effective_sample_len(&self, total_rows: usize) -> usize {
        match self.sample_size {
            Some(size) if size > 0 => size.min(total_rows),
            _ => self.default_sample_cap.min(total_rows),
        }
    }
}

/// Progress callback invoked once per profiled column.
pub type ProgressCallback = Arc<dyn Fn(ProfilerProgress) + Send + Sync>;

/// Progress information during profiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilerProgress {
    pub column_index: usize,
    pub total_columns: usize,
    pub column_name: String,
}

/// Profile of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: InferredType,
    /// Distinct non-missing values in the analyzed rows
    pub unique_count: usize,
    /// Null or empty-string cells in the analyzed rows
    pub null_count: usize,
    /// First distinct values, rendered as text
    pub sample_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ColumnStats>,
}

impl ColumnProfile {
    /// True for text columns carrying a mode.
    pub fn is_categorical(&self) -> bool {
        self.inferred_type == InferredType::String
            && self.stats.as_ref().and_then(ColumnStats::mode).is_some()
    }

    pub fn numeric_stats(&self) -> Option<&NumericStats> {
        self.stats.as_ref().and_then(ColumnStats::numeric)
    }

    pub fn mode(&self) -> Option<&str> {
        self.stats.as_ref().and_then(ColumnStats::mode)
    }

    /// Nullable if any analyzed cell was missing.
    pub fn nullable(&self) -> bool {
        self.null_count > 0
    }
}

/// Column counts by kind. Boolean columns count toward none of the buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
    pub date_columns: usize,
}

/// Result of profiling one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetAnalysis {
    /// Rows in the input table
    pub row_count: usize,
    /// Rows actually analyzed after sampling
    pub analyzed_rows: usize,
    pub column_count: usize,
    /// One profile per header, in header order
    pub columns: Vec<ColumnProfile>,
    /// Notable correlations in discovery order
    pub correlations: Vec<CorrelationPair>,
    pub summary: DatasetSummary,
}

impl DatasetAnalysis {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns with the given inferred type, in column order.
    pub fn columns_of_type(&self, inferred_type: InferredType) -> impl Iterator<Item = &ColumnProfile> {
        self.columns
            .iter()
            .filter(move |c| c.inferred_type == inferred_type)
    }

    pub fn categorical_columns(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().filter(|c| c.is_categorical())
    }
}

/// Builder for [`TabularProfiler`].
pub struct TabularProfilerBuilder {
    config: ProfilerConfig,
    progress_callback: Option<ProgressCallback>,
}

impl TabularProfilerBuilder {
    /// Cap the number of analyzed rows
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = Some(size);
        self
    }

    /// Optionally cap the number of analyzed rows
    pub fn sample_size_opt(mut self, size: Option<usize>) -> Self {
        self.config.sample_size = size;
        self
    }

    /// Enable or disable type inference and statistics
    pub fn detect_types(mut self, enable: bool) -> Self {
        self.config.detect_types = enable;
        self
    }

    /// Enable or disable correlation discovery
    pub fn find_correlations(mut self, enable: bool) -> Self {
        self.config.find_correlations = enable;
        self
    }

    /// Set the type-vote threshold
    pub fn type_threshold(mut self, threshold: f64) -> Self {
        self.config.type_threshold = threshold;
        self
    }

    /// Set the correlation reporting threshold
    pub fn correlation_threshold(mut self, threshold: f64) -> Self {
        self.config.correlation_threshold = threshold;
        self
    }

    /// Reject empty tables from [`TabularProfiler::try_profile`]
    pub fn reject_empty(mut self, reject: bool) -> Self {
        self.config.reject_empty = reject;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ProfilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set progress callback
    pub fn progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProfilerProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> TabularProfiler {
        TabularProfiler {
            config: self.config,
            progress_callback: self.progress_callback,
        }
    }
}

/// Profiles parsed tables.
#[derive(Clone)]
pub struct TabularProfiler {
    config: ProfilerConfig,
    progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for TabularProfiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabularProfiler")
            .field("config", &self.config)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Default for TabularProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl TabularProfiler {
    pub fn builder() -> TabularProfilerBuilder {
        TabularProfilerBuilder {
            config: ProfilerConfig::default(),
            progress_callback: None,
        }
    }

    /// Create a profiler with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn with_config(config: ProfilerConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// The prefix of `rows` that profiling analyzes.
    pub fn sample<'a>(&self, rows: &'a [Row]) -> &'a [Row] {
        &rows[..self.config.effective_sample_len(rows.len())]
    }

    /// Profiles a table, honoring `reject_empty`.
    pub fn try_profile<S: AsRef<str>>(&self, headers: &[S], rows: &[Row]) -> Result<DatasetAnalysis> {
        if self.config.reject_empty {
            if headers.is_empty() {
                return Err(DocsightError::EmptyInput("dataset has no columns".to_string()));
            }
            if rows.is_empty() {
                return Err(DocsightError::EmptyInput("dataset has no rows".to_string()));
            }
        }
        Ok(self.profile(headers, rows))
    }

    /// Profiles a table. Never fails; an empty table yields an empty analysis.
    ///
    /// Cells are looked up by the header as given, while column and correlation
    /// names are reported trimmed. Duplicates are profiled twice.
    #[instrument(skip(self, headers, rows), fields(columns = headers.len(), rows = rows.len()))]
    pub fn profile<S: AsRef<str>>(&self, headers: &[S], rows: &[Row]) -> DatasetAnalysis {
        let start_time = std::time::Instant::now();
        let sample = self.sample(rows);

        info!(
            total_rows = rows.len(),
            analyzed_rows = sample.len(),
            detect_types = self.config.detect_types,
            "Starting dataset profiling"
        );

        let mut summary = DatasetSummary {
            total_rows: sample.len(),
            total_columns: headers.len(),
            ..DatasetSummary::default()
        };

        let mut columns = Vec::with_capacity(headers.len());
        for (index, header) in headers.iter().enumerate() {
            let header = header.as_ref();
            self.report_progress(index, headers.len(), header);

            let profile = self.profile_column(header, sample);
            match profile.inferred_type {
                InferredType::Number => summary.numeric_columns += 1,
                InferredType::Date => summary.date_columns += 1,
                InferredType::String if profile.is_categorical() => {
                    summary.categorical_columns += 1
                }
                _ => {}
            }
            columns.push(profile);
        }

        let correlations = if self.config.find_correlations {
            // Rows are keyed by the raw header; reported names are trimmed.
            let numeric: Vec<&str> = headers
                .iter()
                .zip(&columns)
                .filter(|(_, c)| c.inferred_type == InferredType::Number)
                .map(|(header, _)| header.as_ref())
                .collect();
            let mut pairs = find_correlations(sample, &numeric, self.config.correlation_threshold);
            for pair in &mut pairs {
                pair.column1 = pair.column1.trim().to_string();
                pair.column2 = pair.column2.trim().to_string();
            }
            pairs
        } else {
            Vec::new()
        };

        info!(
            columns = columns.len(),
            correlations = correlations.len(),
            time_ms = start_time.elapsed().as_millis() as u64,
            "Completed dataset profiling"
        );

        DatasetAnalysis {
            row_count: rows.len(),
            analyzed_rows: sample.len(),
            column_count: headers.len(),
            columns,
            correlations,
            summary,
        }
    }

    fn profile_column(&self, header: &str, sample: &[Row]) -> ColumnProfile {
        let values: Vec<&Cell> = sample
            .iter()
            .map(|row| row.get(header))
            .filter(|cell| !cell.is_missing())
            .collect();

        let mut seen = HashSet::new();
        let mut sample_values = Vec::new();
        for cell in &values {
            if seen.insert(cell.distinct_key()) && sample_values.len() < self.config.max_sample_values {
                sample_values.push(cell.to_string());
            }
        }
        let unique_count = seen.len();

        let mut profile = ColumnProfile {
            name: header.trim().to_string(),
            inferred_type: InferredType::String,
            unique_count,
            null_count: sample.len() - values.len(),
            sample_values,
            stats: None,
        };

        if !self.config.detect_types || values.is_empty() {
            return profile;
        }

        let vote = TypeVote::tally(values.iter().copied(), self.config.type_sample_size);
        match vote.decide(self.config.type_threshold) {
            Some(InferredType::Number) => {
                profile.inferred_type = InferredType::Number;
                profile.stats = NumericStats::compute(values.iter().filter_map(|c| c.as_number()))
                    .map(ColumnStats::Numeric);
            }
            Some(decided) => profile.inferred_type = decided,
            None => {
                if (unique_count as f64) < values.len() as f64 * self.config.categorical_ratio {
                    profile.stats = mode(values.iter().copied()).map(|mode| ColumnStats::Categorical { mode });
                }
            }
        }

        debug!(
            column = header,
            inferred_type = %profile.inferred_type,
            unique = profile.unique_count,
            nulls = profile.null_count,
            "Profiled column"
        );

        profile
    }

    fn report_progress(&self, column_index: usize, total_columns: usize, column_name: &str) {
        if let Some(callback) = &self.progress_callback {
            callback(ProfilerProgress {
                column_index,
                total_columns,
                column_name: column_name.to_string(),
            });
        }
    }
}
