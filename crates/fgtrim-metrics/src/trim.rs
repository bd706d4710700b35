//! Metrics for the `trim` command.
//!
//! [`TrimMetrics`] is a single summary row describing what happened to every record of a run;
//! [`PrimerReadCount`] is one row per primer with the number of reads it trimmed.

use serde::{Deserialize, Serialize};

use crate::{Metric, ProcessingMetrics};

/// Summary of a primer/quality trimming run.
///
/// Fractions are relative to `mapped_reads`, since unmapped records never reach the trimmer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrimMetrics {
    /// Records read from the input
    pub total_records: u64,
    /// Unmapped records (skipped, never written)
    pub unmapped_reads: u64,
    /// Mapped records
    pub mapped_reads: u64,
    /// Mapped reads whose fragment did not lie inside any amplicon
    pub amplicon_rejected: u64,
    /// Unpaired-branch reads whose insert size was not larger than the read length
    pub insert_size_violations: u64,
    /// Reads with at least one primer soft-clipped
    pub primer_trimmed: u64,
    /// Reads long enough to keep but with no overlapping primer
    pub no_primer: u64,
    /// Reads whose aligned length fell below the minimum after trimming
    pub low_quality: u64,
    /// Records written with the QC-fail flag set
    pub qc_failed: u64,
    /// Records written to the output
    pub written: u64,
    /// `primer_trimmed / mapped_reads`
    pub frac_primer_trimmed: f64,
    /// `low_quality / mapped_reads`
    pub frac_low_quality: f64,
    /// `no_primer / mapped_reads`
    pub frac_no_primer: f64,
    /// `amplicon_rejected / mapped_reads`
    pub frac_amplicon_rejected: f64,
}

impl TrimMetrics {
    /// Creates an empty metrics row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills in the fraction fields from the counters.
    pub fn finalize(&mut self) {
        self.frac_primer_trimmed = fraction(self.primer_trimmed, self.mapped_reads);
        self.frac_low_quality = fraction(self.low_quality, self.mapped_reads);
        self.frac_no_primer = fraction(self.no_primer, self.mapped_reads);
        self.frac_amplicon_rejected = fraction(self.amplicon_rejected, self.mapped_reads);
    }
}

impl Metric for TrimMetrics {
    fn metric_name() -> &'static str {
        "trim"
    }
}

impl ProcessingMetrics for TrimMetrics {
    fn total_input(&self) -> u64 {
        self.total_records
    }

    fn total_output(&self) -> u64 {
        self.written
    }

    fn total_filtered(&self) -> u64 {
        self.total_records.saturating_sub(self.written)
    }
}

/// Number of reads attributed to one primer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimerReadCount {
    /// Primer name from the BED file
    pub name: String,
    /// Position of the primer in the BED file (0-based); written to the `XA` tag of reads
    pub index: usize,
    /// Reference sequence name
    pub chrom: String,
    /// 0-based inclusive start, after any primer offset
    pub start: i64,
    /// 0-based inclusive end, after any primer offset
    pub end: i64,
    /// `+`, `-` or `.`
    pub strand: String,
    /// Reads trimmed against this primer
    pub read_count: u64,
    /// `read_count` over the total read count of all primers
    pub frac_reads: f64,
}

impl Metric for PrimerReadCount {
    fn metric_name() -> &'static str {
        "primer read count"
    }
}

/// Fills `frac_reads` of every row from the total read count across rows.
pub fn finalize_primer_counts(rows: &mut [PrimerReadCount]) {
    let total: u64 = rows.iter().map(|r| r.read_count).sum();
    for row in rows {
        row.frac_reads = fraction(row.read_count, total);
    }
}

#[expect(clippy::cast_precision_loss, reason = "read counts never exceed 2^53")]
fn fraction(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}
