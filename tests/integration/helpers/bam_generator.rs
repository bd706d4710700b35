//! Amplicon fixtures: a primer BED, a pair file and BAM files of reads around them.
//!
//! One amplicon on `chr1`: the forward primer `amp1_LEFT` covers 0-based `[100, 120)` and the
//! reverse primer `amp1_RIGHT` covers `[380, 400)`.

#![allow(dead_code)]

use fgtrim_lib::sam::builder::{RecordBuilder, SamBuilder};
use noodles::sam::alignment::record_buf::RecordBuf;
use std::fs;
use std::path::{Path, PathBuf};

/// BED lines for the test amplicon.
pub const PRIMER_BED: &str = "\
# test amplicon
chr1\t100\t120\tamp1_LEFT\t1\t+
chr1\t380\t400\tamp1_RIGHT\t1\t-
";

/// Pair file for the test amplicon.
pub const PRIMER_PAIRS: &str = "amp1_LEFT\tamp1_RIGHT\n";

/// Writes `contents` to `dir/name` and returns the path.
pub fn write_text(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write fixture file");
    path
}

/// A paired read with a 300 bp insert at 1-based `start`.
pub fn paired_read(name: &str, start: usize, cigar: &str, reverse: bool) -> RecordBuf {
    RecordBuilder::mapped_read()
        .name(name)
        .first_segment(!reverse)
        .reverse_complement(reverse)
        .alignment_start(start)
        .cigar(cigar)
        .template_length(if reverse { -300 } else { 300 })
        .build()
}

/// An unmapped read.
pub fn unmapped_read(name: &str) -> RecordBuf {
    RecordBuilder::new().name(name).sequence("ACGTACGTACGTACGTACGT").unmapped(true).build()
}

/// The standard input reads:
///
/// - `fwd`: forward read starting inside `amp1_LEFT`
/// - `rev`: reverse read ending inside `amp1_RIGHT`
/// - `mid`: forward read starting between the primers
/// - `unmapped`: an unmapped read
pub fn amplicon_reads() -> Vec<RecordBuf> {
    vec![
        paired_read("fwd", 101, "100M", false),
        paired_read("mid", 201, "100M", false),
        paired_read("rev", 301, "100M", true),
        unmapped_read("unmapped"),
    ]
}

/// Writes `records` to `dir/name` against a single 10 kb `chr1`.
pub fn write_input_bam(dir: &Path, name: &str, records: Vec<RecordBuf>) -> PathBuf {
    let mut builder = SamBuilder::with_single_ref("chr1", 10_000);
    for record in records {
        builder.push_record(record);
    }
    let path = dir.join(name);
    builder.write_bam(&path).expect("Failed to write input BAM");
    path
}
