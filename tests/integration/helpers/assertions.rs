//! Assertion and inspection helpers for trimmed BAM output.

#![allow(dead_code)]

use fgtrim_lib::cigar::cigar_string;
use fgtrim_lib::sam::{operations, primer_index};
use noodles::bam;
use noodles::sam::Header;
use noodles::sam::alignment::record_buf::RecordBuf;
use std::path::Path;
use std::process::{Command, Output};

/// Runs `fgtrim` with `args` and returns its output.
pub fn run_fgtrim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fgtrim"))
        .args(args)
        .output()
        .expect("Failed to run fgtrim")
}

/// Reads the header and all records of a BAM file.
pub fn read_bam(path: &Path) -> (Header, Vec<RecordBuf>) {
    let mut reader = bam::io::reader::Builder.build_from_path(path).expect("Failed to open BAM");
    let header = reader.read_header().expect("Failed to read header");
    let records =
        reader.record_bufs(&header).map(|r| r.expect("Failed to read record")).collect();
    (header, records)
}

/// Finds a record by name.
///
/// # Panics
///
/// Panics if no record has that name.
pub fn record_named<'a>(records: &'a [RecordBuf], name: &str) -> &'a RecordBuf {
    records
        .iter()
        .find(|r| {
            r.name().is_some_and(|n| {
                let bytes: &[u8] = n.as_ref();
                bytes == name.as_bytes()
            })
        })
        .unwrap_or_else(|| panic!("No record named {name}"))
}

/// Names of the records, in order.
pub fn record_names(records: &[RecordBuf]) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            r.name().map(|n| String::from_utf8_lossy(n.as_ref()).into_owned()).unwrap_or_default()
        })
        .collect()
}

/// Asserts a record's 1-based start, CIGAR and primer tag.
///
/// # Panics
///
/// Panics if any of them differ.
pub fn assert_trimmed(record: &RecordBuf, start: usize, cigar: &str, primer: Option<i64>) {
    assert_eq!(record.alignment_start().map(usize::from), Some(start), "alignment start");
    assert_eq!(cigar_string(&operations(record)), cigar, "CIGAR");
    assert_eq!(primer_index(record), primer, "XA tag");
}
