//! Loosely-typed cell values as produced by CSV/Excel parsers.
//!
//! Parsed spreadsheets hand the profiler a mix of nulls, numbers, booleans and
//! free text. [`Cell`] narrows that to four variants, and [`Row`] maps a column
//! header to its cell. Lookups of headers a row does not carry yield
//! [`Cell::Null`], which is how ragged rows from short CSV lines are treated.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single parsed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Null or undefined
    Null,
    /// Boolean literal produced by the parser
    Bool(bool),
    /// Numeric value produced by the parser
    Number(f64),
    /// Raw text
    Text(String),
}

static NULL_CELL: Cell = Cell::Null;

impl Cell {
    /// Returns true for values the profiler treats as absent: null and the empty string.
    ///
    /// Whitespace-only text is *not* missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric interpretation of the cell, if any.
    ///
    /// Text follows the lenient number grammar of [`parse_number`]; booleans map
    /// to `1` and `0`. NaN is never returned.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Number(n) if n.is_nan() => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_number(s),
        }
    }

    /// Key used for distinct-value counting.
    ///
    /// Values of different variants never collide, so the number `1` and the
    /// text `"1"` are two distinct values.
    pub fn distinct_key(&self) -> CellKey {
        match self {
            Cell::Null => CellKey::Null,
            Cell::Bool(b) => CellKey::Bool(*b),
            Cell::Number(n) => {
                // -0 and 0 are the same value; all NaNs are one value
                let normalized = if *n == 0.0 {
                    0.0
                } else if n.is_nan() {
                    f64::NAN
                } else {
                    *n
                };
                CellKey::Number(normalized.to_bits())
            }
            Cell::Text(s) => CellKey::Text(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Hashable identity of a [`Cell`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellKey {
    Null,
    Bool(bool),
    Number(u64),
    Text(String),
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(f64::from(value))
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

/// One parsed record: column header to cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Cell>);

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cell, consuming and returning the row.
    pub fn with(mut self, header: impl Into<String>, cell: impl Into<Cell>) -> Self {
        self.insert(header, cell);
        self
    }

    /// Sets the cell for a header, replacing any previous value.
    pub fn insert(&mut self, header: impl Into<String>, cell: impl Into<Cell>) {
        self.0.insert(header.into(), cell.into());
    }

    /// Cell for the header, or [`Cell::Null`] when the row has no such header.
    pub fn get(&self, header: &str) -> &Cell {
        self.0.get(header).unwrap_or(&NULL_CELL)
    }

    /// Like [`Row::get`], but falls back to a header that matches `name` once trimmed.
    pub fn get_by_name(&self, name: &str) -> &Cell {
        self.0
            .get(name)
            .or_else(|| self.0.iter().find(|(k, _)| k.trim() == name).map(|(_, v)| v))
            .unwrap_or(&NULL_CELL)
    }

    /// Number of headers present in this row.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the row carries no cells at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(header, cell)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Cell)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Cell>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row(iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect())
    }
}

/// Parses text with the lenient grammar of a JavaScript `Number()` conversion.
///
/// Surrounding whitespace is ignored and whitespace-only text parses as `0`.
/// Accepts decimal and exponent forms, `0x`/`0o`/`0b` prefixes and `Infinity`,
/// but rejects the `inf`/`nan` spellings Rust's own parser allows.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
        }
    }

    let body = trimmed.trim_start_matches(['+', '-']);
    let valid_chars = body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !valid_chars || !body.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if trimmed.len() - body.len() > 1 {
        return None;
    }

    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Formats a number the way it is shown in sample values and modes.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{n}")
    }
}
