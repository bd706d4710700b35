//! Integration tests for the trim command.

use fgoxide::io::DelimFile;
use fgtrim_lib::metrics::{PrimerReadCount, TrimMetrics};
use fgtrim_lib::sam::PRIMER_INDEX_TAG;
use fgtrim_lib::sam::builder::{RecordBuilder, SamBuilder};
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::sam::alignment::record_buf::data::field::Value;
use rstest::rstest;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::helpers::{
    PRIMER_BED, PRIMER_PAIRS, amplicon_reads, assert_trimmed, paired_read, read_bam,
    record_named, record_names, run_fgtrim, write_input_bam, write_text,
};

struct Fixture {
    dir: TempDir,
    input: PathBuf,
    primers: PathBuf,
    output: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let input = write_input_bam(dir.path(), "input.bam", amplicon_reads());
        let primers = write_text(dir.path(), "primers.bed", PRIMER_BED);
        let output = dir.path().join("output.bam");
        Self { dir, input, primers, output }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Runs `fgtrim trim -i input -o output` plus `extra`, asserting success.
    fn trim(&self, extra: &[&str]) {
        let mut args = vec![
            "trim",
            "-i",
            self.input.to_str().unwrap(),
            "-o",
            self.output.to_str().unwrap(),
        ];
        args.extend_from_slice(extra);

        let output = run_fgtrim(&args);
        assert!(
            output.status.success(),
            "fgtrim trim failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn read_metrics(path: &Path) -> TrimMetrics {
    let mut rows: Vec<TrimMetrics> =
        DelimFile::default().read_tsv(&path).expect("Failed to read metrics");
    assert_eq!(rows.len(), 1);
    rows.remove(0)
}

#[test]
fn test_trim_primers_from_both_strands() {
    let fixture = Fixture::new();
    let metrics = fixture.path("trim.txt");
    let primer_metrics = fixture.path("primers.txt");
    fixture.trim(&[
        "-b",
        fixture.primers.to_str().unwrap(),
        "--metrics",
        metrics.to_str().unwrap(),
        "--primer-metrics",
        primer_metrics.to_str().unwrap(),
    ]);

    let (_, records) = read_bam(&fixture.output);
    assert_eq!(record_names(&records), ["fwd", "rev"]);
    assert_trimmed(record_named(&records, "fwd"), 121, "20S80M", Some(0));
    assert_trimmed(record_named(&records, "rev"), 301, "80M20S", Some(1));
    assert_eq!(record_named(&records, "rev").data().get(&PRIMER_INDEX_TAG), Some(&Value::Int16(1)));

    let metrics = read_metrics(&metrics);
    assert_eq!(metrics.total_records, 4);
    assert_eq!(metrics.unmapped_reads, 1);
    assert_eq!(metrics.mapped_reads, 3);
    assert_eq!(metrics.primer_trimmed, 2);
    assert_eq!(metrics.no_primer, 1);
    assert_eq!(metrics.low_quality, 0);
    assert_eq!(metrics.written, 2);

    let counts: Vec<PrimerReadCount> =
        DelimFile::default().read_tsv(&primer_metrics).expect("Failed to read primer metrics");
    let names: Vec<&str> = counts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["amp1_LEFT", "amp1_RIGHT"]);
    assert!(counts.iter().all(|c| c.read_count == 1));
    assert!(counts.iter().all(|c| (c.frac_reads - 0.5).abs() < 1e-6));
}

#[test]
fn test_trim_adds_program_record() {
    let fixture = Fixture::new();
    fixture.trim(&["-b", fixture.primers.to_str().unwrap()]);

    let (header, _) = read_bam(&fixture.output);
    let programs = header.programs();
    let program = programs.as_ref().get(b"fgtrim".as_slice()).expect("@PG record for fgtrim");
    let command_line = program
        .other_fields()
        .get(&noodles::sam::header::record::value::map::program::tag::COMMAND_LINE)
        .expect("CL field");
    assert!(String::from_utf8_lossy(command_line.as_ref()).contains("trim"));
}

#[rstest]
#[case::write_no_primer_reads(&["-e"], &["fwd", "mid", "rev"], false)]
#[case::keep_for_reanalysis(&["-k"], &["fwd", "mid", "rev"], true)]
fn test_no_primer_reads(#[case] flags: &[&str], #[case] expected: &[&str], #[case] qc_fail: bool) {
    let fixture = Fixture::new();
    let mut args = vec!["-b", fixture.primers.to_str().unwrap()];
    args.extend_from_slice(flags);
    fixture.trim(&args);

    let (_, records) = read_bam(&fixture.output);
    assert_eq!(record_names(&records), expected);

    let mid = record_named(&records, "mid");
    assert_trimmed(mid, 201, "100M", None);
    assert_eq!(mid.flags().is_qc_fail(), qc_fail);
    assert!(!record_named(&records, "fwd").flags().is_qc_fail());
}

#[test]
fn test_trim_without_primers_writes_all_mapped_reads() {
    let fixture = Fixture::new();
    fixture.trim(&[]);

    let (_, records) = read_bam(&fixture.output);
    assert_eq!(record_names(&records), ["fwd", "mid", "rev"]);
    assert_trimmed(record_named(&records, "fwd"), 101, "100M", None);
}

#[test]
fn test_trim_filters_reads_outside_amplicons() {
    let fixture = Fixture::new();
    let mut reads = amplicon_reads();
    reads.push(paired_read("out", 601, "50M", false));
    let input = write_input_bam(fixture.dir.path(), "with_outside.bam", reads);
    let pairs = write_text(fixture.dir.path(), "pairs.tsv", PRIMER_PAIRS);
    let metrics = fixture.path("trim.txt");

    let output = run_fgtrim(&[
        "trim",
        "-i",
        input.to_str().unwrap(),
        "-o",
        fixture.output.to_str().unwrap(),
        "-b",
        fixture.primers.to_str().unwrap(),
        "-f",
        pairs.to_str().unwrap(),
        "--metrics",
        metrics.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let (_, records) = read_bam(&fixture.output);
    assert_eq!(record_names(&records), ["fwd", "rev"]);

    let metrics = read_metrics(&metrics);
    assert_eq!(metrics.amplicon_rejected, 2);
    assert_eq!(metrics.no_primer, 0);
}

#[test]
fn test_quality_trim_and_min_length() {
    let dir = TempDir::new().unwrap();
    let mut quals = vec![30u8; 40];
    quals.extend([5u8; 10]);
    let tail = RecordBuilder::mapped_read()
        .name("tail")
        .first_segment(true)
        .alignment_start(1001)
        .cigar("50M")
        .qualities(&quals)
        .template_length(300)
        .build();
    let short = paired_read("short", 2001, "25M", false);
    let input = write_input_bam(dir.path(), "input.bam", vec![tail, short]);
    let output = dir.path().join("output.bam");

    let result =
        run_fgtrim(&["trim", "-i", input.to_str().unwrap(), "-o", output.to_str().unwrap()]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let (_, records) = read_bam(&output);
    assert_eq!(record_names(&records), ["tail"]);
    assert_trimmed(&records[0], 1001, "38M12S", None);
}

#[test]
fn test_trim_region_of_indexed_bam() {
    let dir = TempDir::new().unwrap();
    let mut builder = SamBuilder::with_refs(&[("chr1", 10_000), ("chr2", 10_000)]);
    builder.push_record(paired_read("on_chr1", 101, "100M", false));
    builder.push_record(
        RecordBuilder::mapped_read()
            .name("on_chr2")
            .first_segment(true)
            .reference_sequence_id(1)
            .alignment_start(501)
            .cigar("100M")
            .template_length(300)
            .build(),
    );
    let input = dir.path().join("input.bam");
    builder.write_indexed_bam(&input).expect("Failed to write indexed BAM");
    let output = dir.path().join("output.bam");

    let result = run_fgtrim(&[
        "trim",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-r",
        "chr2",
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let (_, records) = read_bam(&output);
    assert_eq!(record_names(&records), ["on_chr2"]);
}

#[test]
fn test_multithreaded_bgzf_matches_single_threaded() {
    let fixture = Fixture::new();
    fixture.trim(&["-b", fixture.primers.to_str().unwrap()]);
    let (_, single) = read_bam(&fixture.output);

    fixture.trim(&["-b", fixture.primers.to_str().unwrap(), "--threads", "3"]);
    let (_, multi) = read_bam(&fixture.output);

    assert_eq!(single, multi);
}

/// `amp1` on chr1 and `amp2` on chr2. The `chr2_at_chr1_primer` read sits on chr2 at the
/// coordinates of `amp1_LEFT`.
const TWO_REFERENCE_BED: &str = "\
chr1\t100\t120\tamp1_LEFT\t1\t+
chr1\t380\t400\tamp1_RIGHT\t1\t-
chr2\t500\t520\tamp2_LEFT\t1\t+
chr2\t780\t800\tamp2_RIGHT\t1\t-
";

fn chr2_read(name: &str, start: usize) -> RecordBuf {
    RecordBuilder::mapped_read()
        .name(name)
        .reference_sequence_id(1)
        .first_segment(true)
        .alignment_start(start)
        .cigar("100M")
        .template_length(300)
        .build()
}

/// Writes reads on both references and the two-reference primer files; returns
/// `(input, primers, pairs)`.
fn two_reference_inputs(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let mut builder = SamBuilder::with_refs(&[("chr1", 10_000), ("chr2", 10_000)]);
    builder.push_record(paired_read("chr1_fwd", 101, "100M", false));
    builder.push_record(chr2_read("chr2_at_chr1_primer", 101));
    builder.push_record(chr2_read("chr2_fwd", 501));
    let input = dir.join("input.bam");
    builder.write_bam(&input).expect("Failed to write input BAM");

    let primers = write_text(dir, "primers.bed", TWO_REFERENCE_BED);
    let pairs = write_text(dir, "pairs.tsv", "amp1_LEFT\tamp1_RIGHT\namp2_LEFT\tamp2_RIGHT\n");
    (input, primers, pairs)
}

#[test]
fn test_primers_only_trim_reads_on_their_own_reference() {
    let dir = TempDir::new().unwrap();
    let (input, primers, _) = two_reference_inputs(dir.path());
    let output = dir.path().join("output.bam");
    let primer_metrics = dir.path().join("primers.txt");

    let result = run_fgtrim(&[
        "trim",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-b",
        primers.to_str().unwrap(),
        "-e",
        "--primer-metrics",
        primer_metrics.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let (_, records) = read_bam(&output);
    assert_eq!(record_names(&records), ["chr1_fwd", "chr2_at_chr1_primer", "chr2_fwd"]);
    assert_trimmed(record_named(&records, "chr1_fwd"), 121, "20S80M", Some(0));
    assert_trimmed(record_named(&records, "chr2_at_chr1_primer"), 101, "100M", None);
    assert_trimmed(record_named(&records, "chr2_fwd"), 521, "20S80M", Some(2));

    let counts: Vec<PrimerReadCount> =
        DelimFile::default().read_tsv(&primer_metrics).expect("Failed to read primer metrics");
    let per_primer: Vec<(&str, &str, u64)> =
        counts.iter().map(|c| (c.name.as_str(), c.chrom.as_str(), c.read_count)).collect();
    assert_eq!(
        per_primer,
        [
            ("amp1_LEFT", "chr1", 1),
            ("amp1_RIGHT", "chr1", 0),
            ("amp2_LEFT", "chr2", 1),
            ("amp2_RIGHT", "chr2", 0),
        ]
    );
}

#[test]
fn test_amplicon_filter_uses_the_read_reference() {
    let dir = TempDir::new().unwrap();
    let (input, primers, pairs) = two_reference_inputs(dir.path());
    let output = dir.path().join("output.bam");
    let metrics = dir.path().join("trim.txt");

    let result = run_fgtrim(&[
        "trim",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-b",
        primers.to_str().unwrap(),
        "-f",
        pairs.to_str().unwrap(),
        "--metrics",
        metrics.to_str().unwrap(),
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let (_, records) = read_bam(&output);
    assert_eq!(record_names(&records), ["chr1_fwd", "chr2_fwd"]);

    let metrics = read_metrics(&metrics);
    assert_eq!(metrics.amplicon_rejected, 1);
    assert_eq!(metrics.primer_trimmed, 2);
}
