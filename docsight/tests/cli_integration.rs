//! Tests for the `docsight` binary.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::{Builder, NamedTempFile};

fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn docsight(args: &[&str], path: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docsight"))
        .args(args)
        .arg(path)
        .env_remove("RUST_LOG")
        .output()
        .expect("binary runs")
}

#[test]
fn test_profile_json() {
    let file = write_temp(".csv", "hours,score,team\n2,55,red\n3,61,blue\n5,70,red\n6,78,red\n8,90,blue\n");

    let output = docsight(&["--format", "json", "profile"], file.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["analysis"]["rowCount"], 5);
    assert_eq!(report["analysis"]["columns"][0]["inferredType"], "number");
    assert_eq!(report["analysis"]["correlations"][0]["strength"], "strong");
    assert!(report["quality"]["overallScore"].as_f64().unwrap() > 90.0);
}

#[test]
fn test_profile_human_without_correlations() {
    let file = write_temp(".csv", "x,y\n2,5\n3,7\n4,9\n");

    let output = docsight(&["--no-color", "profile", "--no-correlations"], file.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("x"));
    assert!(!stdout.contains("x ~ y"));
    assert!(!stdout.contains("\u{1b}["));
}

#[test]
fn test_profile_rejects_unknown_extension() {
    let file = write_temp(".json", "{}");

    let output = docsight(&["profile"], file.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot profile"));
}

#[test]
fn test_structure_json() {
    let file = write_temp(".txt", "CHAPTER ONE\nSome text.\n2. Second heading\nMore text.");

    let output = docsight(&["--format", "json", "structure"], file.path());
    assert!(output.status.success());

    let structure: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(structure["headings"].as_array().unwrap().len(), 2);
    assert_eq!(structure["wordCount"], 9);
    assert_eq!(structure["hasLists"], true);
}

#[test]
fn test_structure_numbered_as_lists() {
    let file = write_temp(".txt", "CHAPTER ONE\nSome text.\n2. Second item\nMore text.");

    let output = docsight(&["--format", "json", "structure", "--numbered-as-lists"], file.path());
    assert!(output.status.success());

    let structure: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(structure["headings"].as_array().unwrap().len(), 1);
}

#[test]
fn test_missing_file_fails() {
    let output = docsight(&["structure"], Path::new("/definitely/not/here.txt"));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read"));
}
