//! Column type inference from sampled cell values.
//!
//! Each non-missing value falls into exactly one bucket, checked in this order:
//!
//! 1. **Boolean**: a boolean cell, or text equal (case-insensitively) to one of
//!    `true`, `false`, `yes`, `no`, `1`, `0`
//! 2. **Numeric**: anything [`Cell::as_number`] accepts
//! 3. **Date**: text a JavaScript-style `Date.parse` would accept
//! 4. none of the above
//!
//! Only a short prefix of the column (ten values by default) is classified. A
//! bucket must hold strictly more than the threshold fraction of that prefix for
//! the column to take its type; boolean wins over numeric, numeric over date.
//! Because `"1"` and `"0"` are boolean literals, a column of ones and zeros is
//! boolean, not numeric.
//!
//! # Example
//!
//! ```rust
//! use docsight::analyzers::inference::{TypeVote, InferredType};
//! use docsight::analyzers::Cell;
//!
//! let values: Vec<Cell> = ["yes", "no", "yes"].into_iter().map(Cell::from).collect();
//! let vote = TypeVote::tally(values.iter(), 10);
//! assert_eq!(vote.decide(0.8), Some(InferredType::Boolean));
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyzers::cell::Cell;

/// Semantic type inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    String,
    Number,
    Date,
    Boolean,
    /// Kept for compatibility with persisted records; inference never produces it.
    Mixed,
}

impl InferredType {
    /// Lowercase name as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredType::String => "string",
            InferredType::Number => "number",
            InferredType::Date => "date",
            InferredType::Boolean => "boolean",
            InferredType::Mixed => "mixed",
        }
    }
}

impl std::fmt::Display for InferredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// The single bucket a value is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Boolean,
    Numeric,
    Date,
    Other,
}

const BOOLEAN_LITERALS: [&str; 6] = ["true", "false", "yes", "no", "1", "0"];

/// Returns true for boolean cells and for boolean literal text.
pub fn is_boolean_literal(cell: &Cell) -> bool {
    match cell {
        Cell::Bool(_) => true,
        Cell::Null => false,
        other => {
            let text = other.to_string().to_lowercase();
            BOOLEAN_LITERALS.contains(&text.as_str())
        }
    }
}

/// Classifies one value, honoring the boolean → numeric → date precedence.
pub fn classify(cell: &Cell) -> ValueClass {
    if is_boolean_literal(cell) {
        ValueClass::Boolean
    } else if cell.as_number().is_some() {
        ValueClass::Numeric
    } else if parse_date(&cell.to_string()).is_some() {
        ValueClass::Date
    } else {
        ValueClass::Other
    }
}

static ISO_CALENDAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<y>[+-]?\d{4,6})(?:-(?P<m>\d{2})(?:-(?P<d>\d{2}))?)?$")
        .expect("ISO calendar pattern is valid")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a %b %d %Y",
    "%a, %d %b %Y",
];

/// Parses text the way a lenient browser `Date.parse` would, returning the
/// timestamp when the text denotes a date.
///
/// Supports ISO 8601 calendar dates and date-times (with or without offset),
/// RFC 2822, US `MM/DD/YYYY`, `YYYY/MM/DD`, and written month names.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_CALENDAR.captures(trimmed) {
        let year: i32 = caps["y"].parse().ok()?;
        let month: u32 = caps.name("m").map_or(Some(1), |m| m.as_str().parse().ok())?;
        let day: u32 = caps.name("d").map_or(Some(1), |d| d.as_str().parse().ok())?;
        return NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(0, 0, 0));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Bucket counts over the classification prefix of a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeVote {
    pub sampled: usize,
    pub boolean: usize,
    pub numeric: usize,
    pub date: usize,
}

impl TypeVote {
    /// Classifies the first `limit` values of an iterator of non-missing cells.
    pub fn tally<'a>(values: impl IntoIterator<Item = &'a Cell>, limit: usize) -> Self {
        let mut vote = TypeVote::default();
        for cell in values.into_iter().take(limit) {
            vote.sampled += 1;
            match classify(cell) {
                ValueClass::Boolean => vote.boolean += 1,
                ValueClass::Numeric => vote.numeric += 1,
                ValueClass::Date => vote.date += 1,
                ValueClass::Other => {}
            }
        }
        vote
    }

    fn fraction(&self, count: usize) -> f64 {
        if self.sampled == 0 {
            0.0
        } else {
            count as f64 / self.sampled as f64
        }
    }

    /// Picks boolean, number or date if that bucket exceeds `threshold`.
    ///
    /// Returns `None` when no typed bucket is dominant; the caller then applies
    /// the categorical heuristic.
    pub fn decide(&self, threshold: f64) -> Option<InferredType> {
        if self.fraction(self.boolean) > threshold {
            Some(InferredType::Boolean)
        } else if self.fraction(self.numeric) > threshold {
            Some(InferredType::Number)
        } else if self.fraction(self.date) > threshold {
            Some(InferredType::Date)
        } else {
            None
        }
    }
}
