//! Upload ingestion: format detection and conversion of raw bytes into tables or text.
//!
//! CSV and plain text are handled in-crate. Excel, PDF and Word documents go
//! through the [`TableParser`] and [`DocumentParser`] traits so a host can plug
//! in whichever parsing library it uses; [`ParserSet`] holds the registered
//! implementations.
//!
//! # Examples
//!
//! ```rust
//! use docsight::ingest::{FileFormat, ParserSet};
//!
//! let format = FileFormat::for_data_file("sales.csv", "text/csv").unwrap();
//! let table = ParserSet::new()
//!     .parse_table(format, b"region,units\nnorth,4\nsouth,7\n")
//!     .unwrap();
//!
//! assert_eq!(table.headers, vec!["region", "units"]);
//! assert_eq!(table.rows.len(), 2);
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyzers::cell::{Cell, Row};
use crate::error::{DocsightError, Result};

mod csv_parser;
mod text;

pub use csv_parser::{CsvOptions, CsvParser};
pub use text::PlainTextParser;

/// MIME type of Word documents.
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Tables wider than this are logged as a performance risk.
pub const WIDE_TABLE_COLUMNS: usize = 500;

/// Detected upload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Excel,
    Pdf,
    Docx,
    Text,
}

impl FileFormat {
    /// Detects the format of a tabular upload.
    ///
    /// CSV is recognized by MIME type `text/csv` or a `.csv` name; Excel by an
    /// `.xlsx` or `.xls` name.
    pub fn for_data_file(file_name: &str, file_type: &str) -> Result<Self> {
        let name = file_name.to_lowercase();
        if file_type == "text/csv" || name.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else if name.ends_with(".xlsx") || name.ends_with(".xls") {
            Ok(FileFormat::Excel)
        } else {
            Err(DocsightError::unsupported(file_type))
        }
    }

    /// Detects the format of a document upload.
    ///
    /// Word documents must be `.docx`; legacy `.doc` files are rejected with a
    /// hint to convert them.
    pub fn for_document(file_name: &str, file_type: &str) -> Result<Self> {
        let name = file_name.to_lowercase();
        if file_type == "application/pdf" {
            Ok(FileFormat::Pdf)
        } else if file_type == DOCX_MIME || name.ends_with(".docx") {
            if name.ends_with(".docx") {
                Ok(FileFormat::Docx)
            } else {
                Err(DocsightError::unsupported_with_hint(
                    file_type,
                    "Only .docx Word documents are supported. Please convert your file and try again.",
                ))
            }
        } else if file_type.starts_with("text/") {
            Ok(FileFormat::Text)
        } else if file_type == "application/msword" || name.ends_with(".doc") {
            Err(DocsightError::unsupported_with_hint(
                file_type,
                "Legacy .doc files are not supported. Please save the document as .docx and upload it again.",
            ))
        } else {
            Err(DocsightError::unsupported(file_type))
        }
    }

    pub fn is_tabular(&self) -> bool {
        matches!(self, FileFormat::Csv | FileFormat::Excel)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Csv => "CSV",
            FileFormat::Excel => "Excel",
            FileFormat::Pdf => "PDF",
            FileFormat::Docx => "DOCX",
            FileFormat::Text => "text",
        }
    }
}

/// A parsed table: trimmed headers plus one [`Row`] per record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl ParsedTable {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Builds a table from a spreadsheet grid whose first row holds the headers.
    ///
    /// Cells past the end of a short row are left out of that row, so they read
    /// as null.
    pub fn from_grid(grid: Vec<Vec<Cell>>) -> Self {
        let mut grid = grid.into_iter();
        let Some(header_row) = grid.next() else {
            return Self::default();
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let rows = grid
            .map(|cells| {
                headers
                    .iter()
                    .zip(cells)
                    .map(|(header, cell)| (header.clone(), cell))
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

/// Metadata reported by a document parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Parser warnings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
    /// Set when extraction failed and placeholder text was substituted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_error: Option<String>,
}

/// Text extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Parses a binary spreadsheet into a table.
pub trait TableParser: Debug + Send + Sync {
    fn parse_table(&self, bytes: &[u8]) -> Result<ParsedTable>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Extracts plain text from a binary document.
pub trait DocumentParser: Debug + Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<ExtractedText>;

    /// Short name for logs
    fn name(&self) -> &str;
}

static CORRUPTED_ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)corrupted zip").expect("corrupted zip pattern is valid"));

/// The parsers available to the upload processor.
#[derive(Debug, Clone, Default)]
pub struct ParserSet {
    csv: CsvParser,
    text: PlainTextParser,
    excel: Option<Arc<dyn TableParser>>,
    pdf: Option<Arc<dyn DocumentParser>>,
    docx: Option<Arc<dyn DocumentParser>>,
}

impl ParserSet {
    /// Built-in CSV and text parsers only.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_csv_options(mut self, options: CsvOptions) -> Self {
        self.csv = CsvParser::with_options(options);
        self
    }

    pub fn with_excel(mut self, parser: Arc<dyn TableParser>) -> Self {
        self.excel = Some(parser);
        self
    }

    pub fn with_pdf(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.pdf = Some(parser);
        self
    }

    pub fn with_docx(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.docx = Some(parser);
        self
    }

    /// Parses a tabular upload.
    pub fn parse_table(&self, format: FileFormat, bytes: &[u8]) -> Result<ParsedTable> {
        let table = match format {
            FileFormat::Csv => self.csv.parse_table(bytes)?,
            FileFormat::Excel => self.excel.as_ref().ok_or_else(|| missing_parser(format))?.parse_table(bytes)?,
            other => return Err(DocsightError::unsupported(other.name())),
        };

        if table.headers.len() > WIDE_TABLE_COLUMNS {
            warn!(
                columns = table.headers.len(),
                "Table has more than {WIDE_TABLE_COLUMNS} columns - profiling may be slow"
            );
        }
        debug!(
            format = format.name(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "Parsed table"
        );
        Ok(table)
    }

    /// Extracts text from a document upload.
    ///
    /// A failing PDF parser does not fail the upload: placeholder text naming the
    /// error is returned instead, with `processing_error` set. Word parser errors
    /// are rewritten into messages suitable for the uploader.
    pub fn extract_text(&self, format: FileFormat, bytes: &[u8], file_name: &str) -> Result<ExtractedText> {
        match format {
            FileFormat::Text => self.text.extract_text(bytes),
            FileFormat::Pdf => {
                let parser = self.pdf.as_ref().ok_or_else(|| missing_parser(format))?;
                match parser.extract_text(bytes) {
                    Ok(extracted) => Ok(extracted),
                    Err(err) => {
                        let message = parser_message(&err);
                        warn!(parser = parser.name(), error = %message, "PDF parsing failed, using placeholder text");
                        Ok(ExtractedText {
                            text: format!(
                                "[PDF parsing failed: {message}. Please try a different PDF file or convert to a text format.]"
                            ),
                            metadata: DocumentMetadata {
                                page_count: Some(0),
                                title: Some(file_name.to_string()),
                                processing_error: Some(message),
                                ..DocumentMetadata::default()
                            },
                        })
                    }
                }
            }
            FileFormat::Docx => {
                let parser = self.docx.as_ref().ok_or_else(|| missing_parser(format))?;
                parser.extract_text(bytes).map_err(|err| {
                    let message = parser_message(&err);
                    let friendly = if CORRUPTED_ZIP.is_match(&message) {
                        "We couldn't read that Word document. Make sure it's a valid .docx file that isn't password protected or corrupted.".to_string()
                    } else if message.is_empty() {
                        "Failed to process Word document".to_string()
                    } else {
                        format!("Failed to process Word document: {message}")
                    };
                    DocsightError::parse("DOCX", friendly)
                })
            }
            other => Err(DocsightError::unsupported(other.name())),
        }
    }
}

fn missing_parser(format: FileFormat) -> DocsightError {
    DocsightError::unsupported_with_hint(
        format.name(),
        format!("No {} parser is configured", format.name()),
    )
}

/// The parser's own message, without the `Failed to parse X:` wrapper.
fn parser_message(err: &DocsightError) -> String {
    match err {
        DocsightError::Parse { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
