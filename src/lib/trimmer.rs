//! Per-read trimming decisions over a stream of alignments.
//!
//! [`TrimOrchestrator`] owns the primer and amplicon indexes together with the run counters.
//! Each mapped record is optionally checked against the amplicons on its reference sequence,
//! primer-trimmed from one or both ends, quality-trimmed at its 3' end and condensed, and then
//! routed by the write policy in [`TrimOptions`]. Records are processed strictly in input
//! order.

use anyhow::{Context, Result};
use log::{debug, trace, warn};
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use std::io;

use fgtrim_cigar::{QualityTrim, ScanDirection, condense, primer, quality, reference_length};
use fgtrim_metrics::{PrimerReadCount, TrimMetrics};
use fgtrim_sam::{
    end_position, insert_size, mark_qc_fail, operations, quality_scores, reference_start,
    set_operations, set_primer_index, set_reference_start,
};

use crate::amplicons::{AmpliconIndex, fragment_interval};
use crate::bam_io::RecordSink;
use crate::errors::FgtrimError;
use crate::primers::{PrimerIndex, PrimerQuery, PrimerStrand};
use crate::progress::ProgressTracker;

/// Default minimum mean window quality.
pub const DEFAULT_MIN_QUALITY: u8 = 20;
/// Default sliding window width.
pub const DEFAULT_WINDOW: usize = 4;
/// Default minimum reference length after trimming.
pub const DEFAULT_MIN_LENGTH: usize = 30;

/// Thresholds and write policy for a trimming run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimOptions {
    /// Minimum mean quality of the sliding window
    pub min_quality: u8,
    /// Width of the sliding window
    pub window: usize,
    /// Reads spanning fewer reference bases after trimming are treated as low quality
    pub min_length: usize,
    /// Write reads that did not overlap any primer
    pub write_no_primer_reads: bool,
    /// Write filtered reads with the QC-fail flag instead of dropping them
    pub keep_for_reanalysis: bool,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            min_quality: DEFAULT_MIN_QUALITY,
            window: DEFAULT_WINDOW,
            min_length: DEFAULT_MIN_LENGTH,
            write_no_primer_reads: false,
            keep_for_reanalysis: false,
        }
    }
}

/// What to do with a record once it has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Pass the (possibly modified) record to the sink
    Write,
    /// Discard the record
    Drop,
}

/// Applies primer and quality trimming to records and tracks the run counters.
#[derive(Debug)]
pub struct TrimOrchestrator {
    options: TrimOptions,
    reference_names: Vec<String>,
    primers: PrimerIndex,
    amplicons: Option<AmpliconIndex>,
    longest_primer_len: i64,
    metrics: TrimMetrics,
    progress_interval: u64,
}

impl TrimOrchestrator {
    /// Creates an orchestrator for records described by `header`. Pass an empty
    /// [`PrimerIndex`] to quality-trim only.
    #[must_use]
    pub fn new(
        options: TrimOptions,
        header: &Header,
        primers: PrimerIndex,
        amplicons: Option<AmpliconIndex>,
    ) -> Self {
        let reference_names: Vec<String> =
            header.reference_sequences().keys().map(ToString::to_string).collect();
        let mut missing: Vec<&str> = primers
            .primers()
            .iter()
            .map(|p| p.chrom.as_str())
            .filter(|chrom| !reference_names.iter().any(|name| name == chrom))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        for chrom in missing {
            warn!("Primers on {chrom} will never match: it is not a reference in the BAM header");
        }

        let longest_primer_len = primers.longest_primer_len();
        Self {
            options,
            reference_names,
            primers,
            amplicons,
            longest_primer_len,
            metrics: TrimMetrics::new(),
            progress_interval: 1_000_000,
        }
    }

    /// Sets how often [`run`](Self::run) logs progress.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Counters accumulated so far (fractions are only filled in by [`finish`](Self::finish)).
    #[must_use]
    pub fn metrics(&self) -> &TrimMetrics {
        &self.metrics
    }

    /// The primer index with its current read counts.
    #[must_use]
    pub fn primers(&self) -> &PrimerIndex {
        &self.primers
    }

    /// Trims every record from `records` and writes the kept ones to `sink`.
    ///
    /// # Errors
    ///
    /// Fails on the first record that cannot be read, trimmed or written. I/O failures are
    /// reported as [`FgtrimError::RecordIo`] with the 0-based record index.
    pub fn run<I, S>(&mut self, records: I, sink: &mut S) -> Result<()>
    where
        I: IntoIterator<Item = io::Result<RecordBuf>>,
        S: RecordSink + ?Sized,
    {
        let mut progress =
            ProgressTracker::new("Processed records").with_interval(self.progress_interval);

        for (index, result) in records.into_iter().enumerate() {
            let index = index as u64;
            let mut record = result.map_err(|source| FgtrimError::RecordIo { index, source })?;

            let disposition = self
                .process(&mut record)
                .with_context(|| format!("Failed to trim record {index}"))?;
            if disposition == Disposition::Write {
                sink.write_record(&record)
                    .map_err(|source| FgtrimError::RecordIo { index, source })?;
                self.metrics.written += 1;
            }

            progress.log_if_needed(1);
        }

        progress.log_final();
        Ok(())
    }

    /// Trims a single record in place and decides whether it is written.
    ///
    /// Does not touch the `written` counter; [`run`](Self::run) maintains that. Records
    /// without a position or whose reference is not in the header count as unmapped.
    ///
    /// # Errors
    ///
    /// Returns an error if a trimmed position or the primer tag cannot be stored.
    pub fn process(&mut self, record: &mut RecordBuf) -> Result<Disposition> {
        self.metrics.total_records += 1;

        let flags = record.flags();
        let chrom = record.reference_sequence_id().and_then(|id| self.reference_names.get(id));
        let position = reference_start(record).filter(|_| !flags.is_unmapped());
        let (Some(chrom), Some(start)) = (chrom, position) else {
            self.metrics.unmapped_reads += 1;
            trace!("Skipping unmapped record");
            return Ok(Disposition::Drop);
        };
        self.metrics.mapped_reads += 1;

        if let Some(amplicons) = &self.amplicons {
            let end = end_position(record).unwrap_or(start + 1);
            let (low, high) = fragment_interval(start, end, i64::from(record.template_length()));
            if !amplicons.envelope_contains(chrom, low, high) {
                debug!("Fragment {chrom}:[{low}, {high}] is not inside any amplicon");
                self.metrics.amplicon_rejected += 1;
                return Ok(self.keep_for_reanalysis(record));
            }
        }

        let paired = flags.is_segmented();
        let is_reverse = flags.is_reverse_complemented();
        let insert = insert_size(record);
        let read_len = record.sequence().len() as i64;
        let insert_exceeds_read = insert - self.longest_primer_len > read_len;

        let mut trimmed_by = None;
        if paired && insert_exceeds_read {
            let direction = ScanDirection::for_read(paired, insert_exceeds_read, is_reverse, false);
            trimmed_by = Self::trim_primer(&mut self.primers, record, chrom, direction)?;
        } else {
            if insert <= read_len {
                self.metrics.insert_size_violations += 1;
            }
            for force_reverse in [false, true] {
                let direction =
                    ScanDirection::for_read(paired, insert_exceeds_read, is_reverse, force_reverse);
                let trimmed = Self::trim_primer(&mut self.primers, record, chrom, direction)?;
                if trimmed.is_some() {
                    trimmed_by = trimmed;
                }
            }
        }
        if trimmed_by.is_some() {
            self.metrics.primer_trimmed += 1;
        }

        self.trim_quality(record, paired && is_reverse, is_reverse)?;

        if reference_length(record.cigar().as_ref()) < self.options.min_length {
            self.metrics.low_quality += 1;
            return Ok(self.keep_for_reanalysis(record));
        }

        if let Some(index) = trimmed_by {
            set_primer_index(record, index)?;
            return Ok(Disposition::Write);
        }

        self.metrics.no_primer += 1;
        let no_primers_loaded = self.primers.is_empty();
        let write_no_primer = self.options.write_no_primer_reads;
        if self.options.keep_for_reanalysis {
            if no_primers_loaded || !write_no_primer {
                self.flag_qc_fail(record);
            }
            Ok(Disposition::Write)
        } else if no_primers_loaded || write_no_primer {
            Ok(Disposition::Write)
        } else {
            Ok(Disposition::Drop)
        }
    }

    /// Consumes the orchestrator, returning finalized run metrics and per-primer counts.
    #[must_use]
    pub fn finish(mut self) -> (TrimMetrics, Vec<PrimerReadCount>) {
        self.metrics.finalize();
        (self.metrics, self.primers.read_counts())
    }

    /// Soft-clips the primer found at one end of the alignment, if any, and returns its index.
    ///
    /// Forward trims shift the alignment start onto the first base after the primer.
    fn trim_primer(
        primers: &mut PrimerIndex,
        record: &mut RecordBuf,
        chrom: &str,
        direction: ScanDirection,
    ) -> Result<Option<usize>> {
        let (Some(start), Some(end)) = (reference_start(record), end_position(record)) else {
            return Ok(None);
        };
        let (anchor, strand) = match direction {
            ScanDirection::Forward => (start, PrimerStrand::Forward),
            ScanDirection::Reverse => (end - 1, PrimerStrand::Reverse),
        };

        let overlaps = primers.overlapping(PrimerQuery { chrom, anchor, strand });
        let Some(index) = primers.select_boundary_primer(&overlaps, direction) else {
            return Ok(None);
        };
        let boundary = {
            let primer = &primers.primers()[index];
            match direction {
                ScanDirection::Forward => primer.end + 1,
                ScanDirection::Reverse => primer.start - 1,
            }
        };

        let trimmed = primer::trim(&operations(record), start, boundary, direction);
        trace!(
            "{direction:?} primer trim at {chrom}:{boundary}: {}",
            fgtrim_cigar::cigar_string(&trimmed.ops)
        );
        set_operations(record, trimmed.ops);
        if direction == ScanDirection::Forward {
            set_reference_start(record, start + trimmed.reference_start_delta)?;
        }

        primers.record_trim(index);
        Ok(Some(index))
    }

    /// Quality-trims the 3' end and condenses the result. Reverse-strand reads take their
    /// alignment start from the trim.
    fn trim_quality(
        &self,
        record: &mut RecordBuf,
        reverse_scan: bool,
        is_reverse: bool,
    ) -> Result<()> {
        let Some(start) = reference_start(record) else {
            return Ok(());
        };
        let ops = operations(record);

        let trim = quality::trim(
            &ops,
            quality_scores(record),
            start,
            self.options.min_quality,
            self.options.window,
            reverse_scan,
        );
        match trim {
            QualityTrim::Trimmed { ops, alignment_start } => {
                set_operations(record, condense(ops));
                if is_reverse {
                    set_reference_start(record, alignment_start)?;
                }
            }
            QualityTrim::Unchanged => set_operations(record, condense(ops)),
        }
        Ok(())
    }

    fn keep_for_reanalysis(&mut self, record: &mut RecordBuf) -> Disposition {
        if self.options.keep_for_reanalysis {
            self.flag_qc_fail(record);
            Disposition::Write
        } else {
            Disposition::Drop
        }
    }

    fn flag_qc_fail(&mut self, record: &mut RecordBuf) {
        mark_qc_fail(record);
        self.metrics.qc_failed += 1;
    }
}
