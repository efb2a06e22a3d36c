//! Heuristic document structure extraction from plain text.
//!
//! The extractor walks the text line by line. A non-empty line is a heading when
//! any of these hold for its trimmed form:
//!
//! - it has no lowercase letters and is shorter than 50 characters
//! - it starts with a number followed by a dot and whitespace (`2. Scope`)
//! - it starts with `chapter`, `section`, `part` or `appendix` and a number
//!
//! Each heading closes the open section and opens a new one. Non-heading lines
//! are appended to the open section's content. Every non-empty line counts as a
//! paragraph; there is no blank-line paragraph grouping.
//!
//! A numbered line such as `2. Second heading` is both a heading and a list
//! marker. [`StructureConfig::numbered_lines_as_headings`] turns the heading half
//! of that off.
//!
//! # Example
//!
//! ```rust
//! use docsight::structure::StructureExtractor;
//!
//! let structure = StructureExtractor::new()
//!     .extract("CHAPTER ONE\nSome text.\n2. Second heading\nMore text.");
//!
//! assert_eq!(structure.headings.len(), 2);
//! assert_eq!(structure.sections[0].content, "Some text.\n");
//! assert!(structure.has_lists);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

static NUMBERED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\.\s").expect("numbered line pattern is valid"));

static HEADING_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(chapter|section|part|appendix)\s+[0-9]+")
        .expect("heading keyword pattern is valid")
});

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-*•]\s|^\s*[0-9]+\.\s").expect("list item pattern is valid")
});

/// A detected heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    /// Always 1; nesting is not detected
    pub level: u32,
    /// Trimmed heading text
    pub text: String,
    /// 1-based line number
    pub line_number: usize,
}

/// A run of lines from a heading up to the next heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    /// 1-based line of the heading
    pub start_line: usize,
    /// 1-based line just before the next heading, or the last line
    pub end_line: usize,
    /// Non-empty body lines, each followed by `\n`
    pub content: String,
}

/// Result of structure extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStructure {
    pub headings: Vec<Heading>,
    pub sections: Vec<Section>,
    /// Non-empty lines
    pub paragraph_count: usize,
    /// Whitespace-separated tokens over the whole text
    pub word_count: usize,
    pub has_lists: bool,
    pub has_tables: bool,
}

/// Configuration for [`StructureExtractor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureConfig {
    /// All-caps lines must be shorter than this many UTF-16 code units
    pub max_heading_length: usize,
    /// Treat `^\d+\.\s` lines as headings as well as list items
    pub numbered_lines_as_headings: bool,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            max_heading_length: 50,
            numbered_lines_as_headings: true,
        }
    }
}

impl StructureConfig {
    pub fn max_heading_length(mut self, length: usize) -> Self {
        self.max_heading_length = length;
        self
    }

    pub fn numbered_lines_as_headings(mut self, enabled: bool) -> Self {
        self.numbered_lines_as_headings = enabled;
        self
    }
}

/// Extracts [`DocumentStructure`] from text.
#[derive(Debug, Clone, Default)]
pub struct StructureExtractor {
    config: StructureConfig,
}

impl StructureExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StructureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    /// Whether a trimmed, non-empty line reads as a heading.
    pub fn is_heading(&self, trimmed: &str) -> bool {
        let all_caps = trimmed == trimmed.to_uppercase()
            && trimmed.encode_utf16().count() < self.config.max_heading_length;

        all_caps
            || (self.config.numbered_lines_as_headings && NUMBERED_LINE.is_match(trimmed))
            || HEADING_KEYWORD.is_match(trimmed)
    }

    /// Extracts structure. Never fails; empty text yields an empty structure.
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub fn extract(&self, text: &str) -> DocumentStructure {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut structure = DocumentStructure::default();
        let mut current: Option<Section> = None;

        for (index, line) in lines.iter().enumerate() {
            let trimmed = trim(line);
            if trimmed.is_empty() {
                continue;
            }

            if self.is_heading(trimmed) {
                structure.headings.push(Heading {
                    level: 1,
                    text: trimmed.to_string(),
                    line_number: index + 1,
                });

                if let Some(mut section) = current.take() {
                    section.end_line = index;
                    structure.sections.push(section);
                }

                current = Some(Section {
                    title: trimmed.to_string(),
                    start_line: index + 1,
                    end_line: lines.len(),
                    content: String::new(),
                });
            } else if let Some(section) = current.as_mut() {
                section.content.push_str(line);
                section.content.push('\n');
            }

            structure.paragraph_count += 1;

            if !structure.has_lists && LIST_ITEM.is_match(line) {
                structure.has_lists = true;
            }
            if !structure.has_tables && line.split('|').count() > 2 {
                structure.has_tables = true;
            }
        }

        if let Some(section) = current {
            structure.sections.push(section);
        }

        structure.word_count = text.split(is_space).filter(|w| !w.is_empty()).count();

        debug!(
            headings = structure.headings.len(),
            sections = structure.sections.len(),
            paragraphs = structure.paragraph_count,
            words = structure.word_count,
            "Extracted document structure"
        );

        structure
    }
}

/// Extracts structure with the default configuration.
pub fn extract_structure(text: &str) -> DocumentStructure {
    StructureExtractor::new().extract(text)
}

fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

fn trim(line: &str) -> &str {
    line.trim_matches(is_space)
}
