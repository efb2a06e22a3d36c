//! Delimited text parsing with spreadsheet-style dynamic typing.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use super::{ParsedTable, TableParser};
use crate::analyzers::cell::{Cell, Row};
use crate::error::{DocsightError, Result};

/// Largest integer a double holds exactly; numeric text beyond it stays text.
const MAX_SAFE_NUMBER: f64 = 9_007_199_254_740_992.0;

/// Candidates tried when no delimiter is configured.
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b'|', b';'];

/// Lines inspected when guessing the delimiter.
const DELIMITER_PREVIEW_LINES: usize = 10;

static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*-?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?\s*$").expect("float pattern is valid")
});

/// Options for CSV parsing.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter; guessed from the first lines when `None`
    pub delimiter: Option<u8>,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Comment prefix (lines starting with this are ignored)
    pub comment: Option<u8>,
    /// Convert numeric and boolean text into typed cells
    pub dynamic_typing: bool,
    /// Stop after this many records
    pub max_records: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            comment: None,
            dynamic_typing: true,
            max_records: None,
        }
    }
}

impl CsvOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_dynamic_typing(mut self, enabled: bool) -> Self {
        self.dynamic_typing = enabled;
        self
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = Some(max_records);
        self
    }
}

/// Parses CSV with a header row.
///
/// Header names are trimmed. Records shorter than the header leave the missing
/// columns out of the row; extra fields are dropped. With dynamic typing on,
/// `true`/`TRUE`/`false`/`FALSE` become booleans, decimal text within the safe
/// integer range becomes a number, and empty fields become null.
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    options: CsvOptions,
}

impl CsvParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CsvOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Parses a UTF-8 buffer.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn parse(&self, bytes: &[u8]) -> Result<ParsedTable> {
        if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
            return Err(DocsightError::parse(
                "CSV",
                "UTF-16 encoded files are not supported; save the file as UTF-8",
            ));
        }
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

        let delimiter = self
            .options
            .delimiter
            .unwrap_or_else(|| guess_delimiter(bytes));

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .quote(self.options.quote)
            .comment(self.options.comment)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            if self.options.max_records.is_some_and(|max| rows.len() >= max) {
                break;
            }
            let record = record?;
            if record.len() == 1 && record.get(0).is_some_and(str::is_empty) {
                continue;
            }

            let row: Row = headers
                .iter()
                .zip(record.iter())
                .map(|(header, field)| (header.clone(), self.convert(field)))
                .collect();
            rows.push(row);
        }

        debug!(
            delimiter = %char::from(delimiter),
            columns = headers.len(),
            rows = rows.len(),
            "Parsed CSV"
        );
        Ok(ParsedTable::new(headers, rows))
    }

    fn convert(&self, field: &str) -> Cell {
        if self.options.dynamic_typing {
            dynamic_cell(field)
        } else {
            Cell::Text(field.to_string())
        }
    }
}

impl TableParser for CsvParser {
    fn parse_table(&self, bytes: &[u8]) -> Result<ParsedTable> {
        self.parse(bytes)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Converts a raw field the way spreadsheet-oriented CSV readers do.
pub fn dynamic_cell(field: &str) -> Cell {
    match field {
        "" => Cell::Null,
        "true" | "TRUE" => Cell::Bool(true),
        "false" | "FALSE" => Cell::Bool(false),
        _ if FLOAT.is_match(field) => match field.trim().parse::<f64>() {
            Ok(n) if n.abs() <= MAX_SAFE_NUMBER => Cell::Number(n),
            _ => Cell::Text(field.to_string()),
        },
        _ => Cell::Text(field.to_string()),
    }
}

/// Picks the candidate delimiter whose field counts are most consistent over the
/// first lines, preferring more fields on a tie. Falls back to a comma.
fn guess_delimiter(bytes: &[u8]) -> u8 {
    let preview: Vec<&[u8]> = bytes
        .split(|&b| b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .take(DELIMITER_PREVIEW_LINES)
        .collect();

    let mut best: Option<(u8, usize, f64)> = None;
    for delimiter in CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = preview
            .iter()
            .map(|line| count_fields(line, delimiter))
            .collect();
        if counts.is_empty() {
            continue;
        }
        let average = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        if average < 2.0 {
            continue;
        }
        let delta: usize = counts.windows(2).map(|w| w[0].abs_diff(w[1])).sum();

        let better = match best {
            None => true,
            Some((_, best_delta, best_average)) => {
                delta < best_delta || (delta == best_delta && average > best_average)
            }
        };
        if better {
            best = Some((delimiter, delta, average));
        }
    }

    best.map_or(b',', |(delimiter, _, _)| delimiter)
}

/// Field count of one line, ignoring delimiters inside double quotes.
fn count_fields(line: &[u8], delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut fields = 1;
    for &b in line {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            fields += 1;
        }
    }
    fields
}
