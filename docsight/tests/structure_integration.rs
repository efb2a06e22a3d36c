//! Integration tests for document structure extraction.

use docsight::ingest::{DocumentParser, FileFormat, ParserSet, PlainTextParser};
use docsight::structure::{extract_structure, StructureConfig, StructureExtractor};

const REPORT: &str = "\
QUARTERLY REPORT
Revenue grew in every region this quarter.

1. Summary
Sales were strong.
- North: up 12%
- South: up 4%

Section 2 Details
| Region | Q1 | Q2 |
| North  | 10 | 12 |
Closing remarks follow.
";

#[test]
fn test_reference_outline() {
    let structure = extract_structure("CHAPTER ONE\nSome text.\n2. Second heading\nMore text.");

    assert_eq!(structure.headings.len(), 2);
    assert_eq!(structure.headings[0].text, "CHAPTER ONE");
    assert_eq!(structure.headings[0].line_number, 1);
    assert_eq!(structure.headings[1].text, "2. Second heading");
    assert_eq!(structure.headings[1].line_number, 3);
    assert!(structure.headings.iter().all(|h| h.level == 1));

    assert_eq!(structure.sections.len(), 2);
    assert_eq!(structure.sections[0].start_line, 1);
    assert_eq!(structure.sections[0].end_line, 2);
    assert_eq!(structure.sections[0].content, "Some text.\n");
    assert_eq!(structure.sections[1].start_line, 3);
    assert_eq!(structure.sections[1].end_line, 4);
    assert_eq!(structure.sections[1].content, "More text.\n");

    assert_eq!(structure.paragraph_count, 4);
    assert_eq!(structure.word_count, 9);
    assert!(structure.has_lists);
    assert!(!structure.has_tables);
}

#[test]
fn test_pipe_line_marks_tables() {
    let with_table = extract_structure("Intro line\nA | B | C\nmore");
    assert!(with_table.has_tables);

    let single_pipe = extract_structure("either this | or that\nplain text");
    assert!(!single_pipe.has_tables);
}

#[test]
fn test_empty_text() {
    let structure = extract_structure("");
    assert!(structure.headings.is_empty());
    assert!(structure.sections.is_empty());
    assert_eq!(structure.paragraph_count, 0);
    assert_eq!(structure.word_count, 0);
    assert!(!structure.has_lists);
    assert!(!structure.has_tables);

    let blank = extract_structure("\n  \n\t\n");
    assert_eq!(blank.paragraph_count, 0);
    assert_eq!(blank.word_count, 0);
}

#[test]
fn test_report_outline() {
    let structure = extract_structure(REPORT);

    let titles: Vec<&str> = structure.headings.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(titles, ["QUARTERLY REPORT", "1. Summary", "Section 2 Details"]);
    assert_eq!(structure.sections.len(), 3);
    assert_eq!(structure.sections[1].content, "Sales were strong.\n- North: up 12%\n- South: up 4%\n");
    assert!(structure
        .sections
        .last()
        .unwrap()
        .content
        .ends_with("Closing remarks follow.\n"));
    assert!(structure.has_lists);
    assert!(structure.has_tables);
    assert_eq!(structure.paragraph_count, 10);
}

#[test]
fn test_long_uppercase_line_is_not_a_heading() {
    let shout = "THIS LINE IS WRITTEN IN CAPITALS BUT IT IS FAR TOO LONG TO BE A TITLE";
    let structure = extract_structure(shout);
    assert!(structure.headings.is_empty());
    assert_eq!(structure.paragraph_count, 1);
}

#[test]
fn test_numbered_lines_as_list_items_only() {
    let extractor = StructureExtractor::with_config(StructureConfig::default().numbered_lines_as_headings(false));
    let structure = extractor.extract("CHAPTER ONE\nSome text.\n2. Second item\nMore text.");

    assert_eq!(structure.headings.len(), 1);
    assert_eq!(structure.sections.len(), 1);
    assert_eq!(structure.sections[0].content, "Some text.\n2. Second item\nMore text.\n");
    assert!(structure.has_lists);
}

#[test]
fn test_windows_line_endings() {
    let structure = extract_structure("OVERVIEW\r\nFirst line.\r\nSecond line.\r\n");
    assert_eq!(structure.headings.len(), 1);
    assert_eq!(structure.headings[0].text, "OVERVIEW");
    assert_eq!(structure.paragraph_count, 3);
    assert_eq!(structure.word_count, 5);
}

#[test]
fn test_text_upload_to_structure() {
    let parsers = ParserSet::new();
    let format = FileFormat::for_document("notes.txt", "text/plain").unwrap();
    let extracted = parsers
        .extract_text(format, "\u{feff}PART 1 Setup\nInstall the tools.\n".as_bytes(), "notes.txt")
        .unwrap();

    assert_eq!(extracted.metadata.encoding.as_deref(), Some("utf-8"));
    let structure = extract_structure(&extracted.text);
    assert_eq!(structure.headings[0].text, "PART 1 Setup");
    assert_eq!(structure.word_count, 6);

    let direct = PlainTextParser.extract_text(b"plain").unwrap();
    assert_eq!(direct.text, "plain");
}

#[test]
fn test_structure_serializes_camel_case() {
    let structure = extract_structure("TITLE\nbody");
    let json = serde_json::to_value(&structure).unwrap();

    assert_eq!(json["paragraphCount"], 2);
    assert_eq!(json["wordCount"], 2);
    assert_eq!(json["hasLists"], false);
    assert_eq!(json["headings"][0]["lineNumber"], 1);
    assert_eq!(json["sections"][0]["startLine"], 1);
}
