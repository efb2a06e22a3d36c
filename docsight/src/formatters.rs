//! Rendering of analysis results for terminals and machine consumers.
//!
//! # Examples
//!
//! ```rust
//! use docsight::formatters::{DatasetReport, HumanFormatter, ResultFormatter};
//! use docsight::analyzers::{Row, TabularProfiler};
//!
//! let rows = vec![Row::new().with("city", "Oslo"), Row::new().with("city", "Lima")];
//! let analysis = TabularProfiler::new().profile(&["city"], &rows);
//!
//! let output = HumanFormatter::new()
//!     .format_dataset(&DatasetReport::new(analysis))
//!     .unwrap();
//! assert!(output.contains("city"));
//! ```

use std::fmt::Write;

use serde::Serialize;

use crate::analyzers::charts::ChartSuggestion;
use crate::analyzers::profiler::DatasetAnalysis;
use crate::analyzers::quality::{QualityAssessment, Severity};
use crate::analyzers::stats::ColumnStats;
use crate::error::{DocsightError, Result};
use crate::structure::DocumentStructure;

/// Configuration options for formatting.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Show sample values per column
    pub include_samples: bool,
    pub include_correlations: bool,
    pub include_quality: bool,
    pub include_charts: bool,
    /// Maximum number of quality issues to display (`None` for all)
    pub max_issues: Option<usize>,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_samples: true,
            include_correlations: true,
            include_quality: true,
            include_charts: true,
            max_issues: None,
            use_colors: true,
        }
    }
}

impl FormatterConfig {
    /// Column table only.
    pub fn minimal() -> Self {
        Self {
            include_samples: false,
            include_correlations: false,
            include_quality: false,
            include_charts: false,
            max_issues: Some(0),
            use_colors: false,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_max_issues(mut self, max: usize) -> Self {
        self.max_issues = Some(max);
        self
    }
}

/// A dataset analysis together with its downstream results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReport {
    pub analysis: DatasetAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityAssessment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub charts: Vec<ChartSuggestion>,
}

impl DatasetReport {
    pub fn new(analysis: DatasetAnalysis) -> Self {
        Self {
            analysis,
            quality: None,
            charts: Vec::new(),
        }
    }

    pub fn with_quality(mut self, quality: QualityAssessment) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_charts(mut self, charts: Vec<ChartSuggestion>) -> Self {
        self.charts = charts;
        self
    }
}

/// Renders results as text.
pub trait ResultFormatter {
    fn format_dataset(&self, report: &DatasetReport) -> Result<String>;

    fn format_structure(&self, structure: &DocumentStructure) -> Result<String>;
}

/// Structured JSON output.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::with_config(FormatterConfig::default())
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config, pretty: true }
    }

    /// Sets whether to use pretty-printed JSON.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.map_err(|e| DocsightError::Serialization(format!("Failed to serialize result to JSON: {e}")))
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for JsonFormatter {
    fn format_dataset(&self, report: &DatasetReport) -> Result<String> {
        let mut filtered = report.clone();
        if !self.config.include_samples {
            for column in &mut filtered.analysis.columns {
                column.sample_values.clear();
            }
        }
        if !self.config.include_correlations {
            filtered.analysis.correlations.clear();
        }
        if !self.config.include_quality {
            filtered.quality = None;
        }
        if !self.config.include_charts {
            filtered.charts.clear();
        }
        self.render(&filtered)
    }

    fn format_structure(&self, structure: &DocumentStructure) -> Result<String> {
        self.render(structure)
    }
}

/// Console output.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn heading(&self, text: &str) -> String {
        if self.config.use_colors {
            format!("\x1b[1m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn severity(&self, severity: Severity) -> String {
        let label = match severity {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        if !self.config.use_colors {
            return label.to_string();
        }
        let color = match severity {
            Severity::Low => "34",
            Severity::Medium => "33",
            Severity::High => "31",
        };
        format!("\x1b[{color}m{label}\x1b[0m")
    }

    fn write_dataset(&self, out: &mut String, report: &DatasetReport) -> std::fmt::Result {
        let analysis = &report.analysis;
        writeln!(out, "{}", self.heading("Dataset profile"))?;
        writeln!(
            out,
            "   Rows: {} ({} analyzed)   Columns: {}",
            analysis.row_count, analysis.analyzed_rows, analysis.column_count
        )?;
        writeln!(
            out,
            "   Numeric: {}   Categorical: {}   Date: {}",
            analysis.summary.numeric_columns,
            analysis.summary.categorical_columns,
            analysis.summary.date_columns
        )?;

        writeln!(out)?;
        writeln!(out, "{}", self.heading("Columns"))?;
        for column in &analysis.columns {
            writeln!(
                out,
                "   {} [{}] unique={} nulls={}",
                column.name, column.inferred_type, column.unique_count, column.null_count
            )?;
            match &column.stats {
                Some(ColumnStats::Numeric(stats)) => writeln!(
                    out,
                    "      min={} max={} mean={:.3} median={} stdDev={:.3}",
                    stats.min, stats.max, stats.mean, stats.median, stats.std_dev
                )?,
                Some(ColumnStats::Categorical { mode }) => writeln!(out, "      mode={mode}")?,
                None => {}
            }
            if self.config.include_samples && !column.sample_values.is_empty() {
                writeln!(out, "      samples: {}", column.sample_values.join(", "))?;
            }
        }

        if self.config.include_correlations && !analysis.correlations.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.heading("Correlations"))?;
            for pair in &analysis.correlations {
                writeln!(
                    out,
                    "   {} ~ {}: {} ({})",
                    pair.column1, pair.column2, pair.correlation, pair.strength.as_str()
                )?;
            }
        }

        if let (true, Some(quality)) = (self.config.include_quality, &report.quality) {
            writeln!(out)?;
            writeln!(out, "{}", self.heading("Data quality"))?;
            writeln!(
                out,
                "   Overall: {:.1}   Completeness: {:.1}%   Consistency: {:.1}%   Validity: {:.1}%",
                quality.overall_score, quality.completeness, quality.consistency, quality.validity
            )?;

            let shown = self.config.max_issues.unwrap_or(quality.issues.len()).min(quality.issues.len());
            for issue in &quality.issues[..shown] {
                writeln!(out, "   [{}] {}", self.severity(issue.severity), issue.description)?;
            }
            if quality.issues.len() > shown {
                writeln!(out, "   ... and {} more issues", quality.issues.len() - shown)?;
            }
        }

        if self.config.include_charts && !report.charts.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.heading("Suggested charts"))?;
            for chart in &report.charts {
                writeln!(
                    out,
                    "   {} ({:.2}): {}",
                    chart.chart_type, chart.confidence, chart.config.title
                )?;
            }
        }
        Ok(())
    }

    fn write_structure(&self, out: &mut String, structure: &DocumentStructure) -> std::fmt::Result {
        writeln!(out, "{}", self.heading("Document structure"))?;
        writeln!(
            out,
            "   Paragraphs: {}   Words: {}   Lists: {}   Tables: {}",
            structure.paragraph_count,
            structure.word_count,
            yes_no(structure.has_lists),
            yes_no(structure.has_tables)
        )?;

        if !structure.sections.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", self.heading("Sections"))?;
            for section in &structure.sections {
                writeln!(
                    out,
                    "   {:>5}-{:<5} {}",
                    section.start_line, section.end_line, section.title
                )?;
            }
        }
        Ok(())
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for HumanFormatter {
    fn format_dataset(&self, report: &DatasetReport) -> Result<String> {
        let mut output = String::new();
        self.write_dataset(&mut output, report)
            .map_err(|e| DocsightError::Internal(format!("failed to format report: {e}")))?;
        Ok(output)
    }

    fn format_structure(&self, structure: &DocumentStructure) -> Result<String> {
        let mut output = String::new();
        self.write_structure(&mut output, structure)
            .map_err(|e| DocsightError::Internal(format!("failed to format structure: {e}")))?;
        Ok(output)
    }
}
