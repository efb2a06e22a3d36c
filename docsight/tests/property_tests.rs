//! Property-based tests for the profiler, correlation and structure extraction.
//!
//! Each property must hold for every generated input:
//!
//! - numeric statistics are ordered (`min <= median <= max`, mean in range) and
//!   the standard deviation is never negative
//! - Pearson coefficients stay within `[-1, 1]`
//! - profiling and structure extraction are deterministic
//! - structure extraction and CSV parsing never panic

use docsight::analyzers::correlation::{find_correlations, CorrelationState};
use docsight::analyzers::{NumericStats, Row, TabularProfiler};
use docsight::ingest::{CsvParser, FileFormat, ParserSet};
use docsight::structure::extract_structure;
use proptest::prelude::*;

fn finite_values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6f64..1.0e6, 1..200)
}

fn value_pairs() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-1.0e4f64..1.0e4, -1.0e4f64..1.0e4), 2..100)
}

proptest! {
    #[test]
    fn prop_numeric_stats_are_ordered(values in finite_values()) {
        let stats = NumericStats::compute(values.iter().copied()).unwrap();
        let tolerance = 1e-6 * (1.0 + stats.max.abs().max(stats.min.abs()));

        prop_assert!(stats.std_dev >= 0.0);
        prop_assert!(stats.min <= stats.median);
        prop_assert!(stats.median <= stats.max);
        prop_assert!(stats.mean >= stats.min - tolerance);
        prop_assert!(stats.mean <= stats.max + tolerance);
        prop_assert!(values.contains(&stats.median));
    }

    #[test]
    fn prop_constant_values_have_zero_spread(value in -1.0e6f64..1.0e6, len in 1usize..50) {
        let stats = NumericStats::compute(std::iter::repeat(value).take(len)).unwrap();
        prop_assert_eq!(stats.min, value);
        prop_assert_eq!(stats.max, value);
        prop_assert_eq!(stats.median, value);
        prop_assert!(stats.std_dev.abs() < 1e-6 * (1.0 + value.abs()));
    }

    #[test]
    fn prop_pearson_is_bounded(pairs in value_pairs()) {
        let state: CorrelationState = pairs.iter().copied().collect();
        let r = state.pearson();
        prop_assert!(r.is_finite());
        prop_assert!((-1.0..=1.0).contains(&r));
    }

    #[test]
    fn prop_reported_correlations_are_bounded(pairs in value_pairs()) {
        let rows: Vec<Row> = pairs
            .iter()
            .map(|(x, y)| Row::new().with("x", *x).with("y", *y))
            .collect();

        for pair in find_correlations(&rows, &["x", "y"], 0.0) {
            prop_assert!(pair.correlation.abs() <= 1.0);
        }
    }

    #[test]
    fn prop_profiling_is_deterministic(
        numbers in prop::collection::vec(prop::option::of(-1000i64..1000), 0..60),
        labels in prop::collection::vec("[a-d]{0,2}", 0..60),
    ) {
        let rows: Vec<Row> = numbers
            .iter()
            .zip(labels.iter())
            .map(|(n, label)| Row::new().with("n", *n).with("label", label.as_str()))
            .collect();
        let profiler = TabularProfiler::new();

        let first = profiler.profile(&["n", "label"], &rows);
        let second = profiler.profile(&["n", "label"], &rows);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.row_count, rows.len());
        for column in &first.columns {
            prop_assert!(column.null_count <= first.analyzed_rows);
            prop_assert!(column.unique_count + column.null_count <= first.analyzed_rows);
            prop_assert!(column.sample_values.len() <= 5);
        }
    }

    #[test]
    fn prop_structure_never_panics(text in "\\PC{0,400}") {
        let structure = extract_structure(&text);
        let lines = text.split('\n').count();

        prop_assert!(structure.paragraph_count <= lines);
        prop_assert_eq!(structure.headings.len(), structure.sections.len());
        prop_assert!(structure.headings.len() <= structure.paragraph_count);
        for section in &structure.sections {
            prop_assert!(section.start_line >= 1);
            prop_assert!(section.start_line <= section.end_line + 1);
        }
        prop_assert_eq!(extract_structure(&text), structure);
    }

    #[test]
    fn prop_structure_handles_line_soup(lines in prop::collection::vec("[A-Za-z0-9 .|*-]{0,30}", 0..40)) {
        let text = lines.join("\n");
        let structure = extract_structure(&text);
        prop_assert_eq!(structure.word_count, text.split_whitespace().count());
    }

    #[test]
    fn prop_csv_parsing_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = CsvParser::new().parse(&bytes);
        let _ = ParserSet::new().parse_table(FileFormat::Csv, &bytes);
    }

    #[test]
    fn prop_csv_rows_match_records(cells in prop::collection::vec(prop::collection::vec("[a-z]{1,6}", 3), 1..30)) {
        let mut csv = String::from("a,b,c\n");
        for row in &cells {
            csv.push_str(&row.join(","));
            csv.push('\n');
        }

        let table = CsvParser::new().parse(csv.as_bytes()).unwrap();
        prop_assert_eq!(table.headers.len(), 3);
        prop_assert_eq!(table.rows.len(), cells.len());
    }
}
