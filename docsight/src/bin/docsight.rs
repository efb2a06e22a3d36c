//! docsight command line interface
//!
//! Profiles CSV files and outlines plain-text documents.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use docsight::analyzers::{AnalysisGoal, ChartRecommender, QualityAssessor, TabularProfiler};
use docsight::formatters::{DatasetReport, FormatterConfig, HumanFormatter, JsonFormatter, ResultFormatter};
use docsight::ingest::{DocumentParser, FileFormat, ParserSet, PlainTextParser};
use docsight::logging::setup::{init_logging, LoggingConfig};
use docsight::structure::{StructureConfig, StructureExtractor};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "docsight", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Disable ANSI colors in human output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Profile a CSV file
    Profile {
        path: PathBuf,

        /// Rows to analyze (default: min(1000, rows))
        #[arg(long)]
        sample_size: Option<usize>,

        /// Skip type inference and statistics
        #[arg(long)]
        no_types: bool,

        /// Skip correlation discovery
        #[arg(long)]
        no_correlations: bool,

        /// Goal used to rank chart suggestions
        #[arg(long, default_value = "overview")]
        goal: AnalysisGoal,
    },
    /// Extract the heading and section outline of a text file
    Structure {
        path: PathBuf,

        /// Treat "1. Item" lines as list items only, not headings
        #[arg(long)]
        numbered_as_lists: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = if cli.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default().with_docsight_level(Level::WARN)
    };
    init_logging(logging.with_json_format(cli.log_json))?;

    let formatter: Box<dyn ResultFormatter> = match cli.format {
        OutputFormat::Json => Box::new(JsonFormatter::new()),
        OutputFormat::Human => Box::new(HumanFormatter::with_config(
            FormatterConfig::default().with_colors(!cli.no_color),
        )),
    };

    let output = match cli.command {
        Command::Profile {
            path,
            sample_size,
            no_types,
            no_correlations,
            goal,
        } => {
            let bytes = read(&path)?;
            let file_name = file_name(&path);
            let format = FileFormat::for_data_file(&file_name, "")
                .with_context(|| format!("cannot profile {}", path.display()))?;
            let table = ParserSet::new()
                .parse_table(format, &bytes)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            let profiler = TabularProfiler::builder()
                .sample_size_opt(sample_size)
                .detect_types(!no_types)
                .find_correlations(!no_correlations)
                .build();
            let analysis = profiler.profile(&table.headers, &table.rows);
            let quality = QualityAssessor::new().assess(&analysis, profiler.sample(&table.rows));
            let charts = ChartRecommender::with_default_rules().recommend(&analysis, goal);

            formatter.format_dataset(
                &DatasetReport::new(analysis)
                    .with_quality(quality)
                    .with_charts(charts),
            )?
        }
        Command::Structure {
            path,
            numbered_as_lists,
        } => {
            let bytes = read(&path)?;
            let extracted = PlainTextParser.extract_text(&bytes)?;
            let extractor = StructureExtractor::with_config(
                StructureConfig::default().numbered_lines_as_headings(!numbered_as_lists),
            );
            formatter.format_structure(&extractor.extract(&extracted.text))?
        }
    };

    println!("{output}");
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
