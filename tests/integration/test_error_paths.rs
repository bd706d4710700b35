//! Failure modes of the trim command: bad inputs must fail before any output is trusted.

use tempfile::TempDir;

use crate::helpers::{amplicon_reads, run_fgtrim, write_input_bam, write_text};

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.bam");
    let result = run_fgtrim(&["trim", "-i", "/no/such/input.bam", "-o", output.to_str().unwrap()]);
    assert!(!result.status.success());
    assert!(stderr(&result).contains("File does not exist"));
}

#[test]
fn test_empty_primer_file_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input_bam(dir.path(), "input.bam", amplicon_reads());
    let bed = write_text(dir.path(), "empty.bed", "# no primers here\n\n");
    let output = dir.path().join("out.bam");

    let result = run_fgtrim(&[
        "trim",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-b",
        bed.to_str().unwrap(),
    ]);
    assert!(!result.status.success());
    assert!(stderr(&result).contains("No primers found"));
}

#[test]
fn test_malformed_primer_file_reports_line() {
    let dir = TempDir::new().unwrap();
    let input = write_input_bam(dir.path(), "input.bam", amplicon_reads());
    let bed = write_text(dir.path(), "bad.bed", "chr1\t100\t120\tp1\t1\t+\nchr1\tabc\t200\n");
    let output = dir.path().join("out.bam");

    let result = run_fgtrim(&[
        "trim",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-b",
        bed.to_str().unwrap(),
    ]);
    assert!(!result.status.success());
    assert!(stderr(&result).contains("line 2"));
}

#[test]
fn test_region_without_index_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input_bam(dir.path(), "input.bam", amplicon_reads());
    let output = dir.path().join("out.bam");

    let result = run_fgtrim(&[
        "trim",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-r",
        "chr1",
    ]);
    assert!(!result.status.success());
}

#[test]
fn test_window_of_zero_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input_bam(dir.path(), "input.bam", amplicon_reads());
    let output = dir.path().join("out.bam");

    let result = run_fgtrim(&[
        "trim",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-s",
        "0",
    ]);
    assert!(!result.status.success());
    assert!(stderr(&result).contains("window"));
}
