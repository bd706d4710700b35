//! Trim primers and low-quality tails from amplicon alignments.
//!
//! Reads a coordinate-sorted BAM (optionally restricted to a region of an indexed BAM),
//! soft-clips primer sequence found at either end of each mapped read, clips the low-quality
//! 3' tail, and writes the rewritten records in input order.

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use noodles::sam::alignment::RecordBuf;
use std::path::PathBuf;

use fgtrim_lib::amplicons::AmpliconIndex;
use fgtrim_lib::bam_io::{BamSink, create_bam_reader, create_indexed_bam_reader, parse_region};
use fgtrim_lib::logging::{OperationTimer, log_primer_summary, log_trim_summary};
use fgtrim_lib::metrics::write_metrics_auto;
use fgtrim_lib::primers::PrimerIndex;
use fgtrim_lib::trimmer::{
    DEFAULT_MIN_LENGTH, DEFAULT_MIN_QUALITY, DEFAULT_WINDOW, TrimOptions, TrimOrchestrator,
};
use fgtrim_lib::validation::{validate_file_exists, validate_positive, validate_quality_score};

use crate::commands::command::Command;
use crate::commands::common::{BamIoOptions, ThreadingOptions, add_pg_record};

/// Trim primer sequence and low-quality 3' ends from aligned reads.
#[derive(Debug, Parser)]
#[command(
    name = "trim",
    about = "\x1b[38;5;72m[TRIMMING]\x1b[0m       \x1b[36mTrim primers and low-quality ends\x1b[0m",
    long_about = r#"
Trim primer sequence and low-quality 3' ends from aligned amplicon reads.

For every mapped read, primers from the BED file that contain the read's first aligned base
(forward reads) or last aligned base (reverse reads) are soft-clipped and the alignment start
is moved onto the first base after the primer. Paired reads whose insert is longer than the
read plus the longest primer are trimmed from their own 5' end only; all other reads
(single-end, or stitched/overlapping pairs) are checked for primers at both ends.

The 3' end of each read is then quality trimmed: a window slides from the 5' end towards the
3' end and everything after the first window whose mean quality drops below --min-quality is
soft-clipped.

Reads spanning fewer than --min-length reference bases after trimming, reads outside every
amplicon (with --primer-pairs) and reads without a primer are dropped unless
--keep-for-reanalysis is set, in which case they are written with the QC-fail flag.
Primer-trimmed reads carry an XA:s tag with the index of the primer that trimmed them.

Unmapped reads are never written.

Example usage:
  fgtrim trim -i aligned.bam -o trimmed.bam -b primers.bed
  fgtrim trim -i aligned.bam -o trimmed.bam -b primers.bed -f pairs.tsv -k
  fgtrim trim -i aligned.bam -o trimmed.bam -b primers.bed -r MN908947.3 --metrics trim.txt
"#
)]
pub struct Trim {
    /// Input/output BAM options
    #[command(flatten)]
    pub io: BamIoOptions,

    /// BED file of primer positions (chrom, start, end, name, score, strand). Without it reads
    /// are only quality trimmed.
    #[arg(short = 'b', long = "primers")]
    pub primers: Option<PathBuf>,

    /// Two-column file of primer names forming an amplicon; reads whose fragment does not lie
    /// inside an amplicon are filtered out
    #[arg(short = 'f', long = "primer-pairs", requires = "primers")]
    pub primer_pairs: Option<PathBuf>,

    /// Only trim reads in this region (e.g. `chr1` or `chr1:100-2000`); requires a BAM index
    #[arg(short = 'r', long = "region")]
    pub region: Option<String>,

    /// Minimum mean quality of the sliding window
    #[arg(short = 'q', long = "min-quality", default_value_t = DEFAULT_MIN_QUALITY)]
    pub min_quality: u8,

    /// Width of the sliding quality window
    #[arg(short = 's', long = "window", default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Minimum number of reference bases a read must span after trimming
    #[arg(short = 'm', long = "min-length", default_value_t = DEFAULT_MIN_LENGTH)]
    pub min_length: usize,

    /// Also write reads that do not start within a primer
    #[arg(short = 'e', long = "write-no-primer-reads", default_value = "false")]
    pub write_no_primer_reads: bool,

    /// Write filtered reads with the QC-fail flag set instead of dropping them
    #[arg(short = 'k', long = "keep-for-reanalysis", default_value = "false")]
    pub keep_for_reanalysis: bool,

    /// Number of bases to extend every primer by on both sides
    #[arg(short = 'x', long = "primer-offset", default_value_t = 0, allow_negative_numbers = true)]
    pub primer_offset: i64,

    /// Optional output file for summary trimming metrics
    #[arg(long = "metrics")]
    pub metrics: Option<PathBuf>,

    /// Optional output file for per-primer read counts
    #[arg(long = "primer-metrics")]
    pub primer_metrics: Option<PathBuf>,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Trim {
    /// Validates the arguments and builds the library options.
    fn validate(&self) -> Result<TrimOptions> {
        self.io.validate()?;
        if let Some(primers) = &self.primers {
            validate_file_exists(primers, "Primer BED")?;
        }
        if let Some(pairs) = &self.primer_pairs {
            validate_file_exists(pairs, "Primer pair")?;
        }
        validate_quality_score(self.min_quality, "min-quality")?;
        validate_positive(self.window, "window")?;
        validate_positive(self.threading.threads, "threads")?;
        if self.primer_offset < 0 {
            bail!("--primer-offset must be non-negative, got {}", self.primer_offset);
        }

        Ok(TrimOptions {
            min_quality: self.min_quality,
            window: self.window,
            min_length: self.min_length,
            write_no_primer_reads: self.write_no_primer_reads,
            keep_for_reanalysis: self.keep_for_reanalysis,
        })
    }

    fn load_primers(&self) -> Result<(PrimerIndex, Option<AmpliconIndex>)> {
        let primers = match &self.primers {
            Some(path) => PrimerIndex::from_bed(path, self.primer_offset)?,
            None => {
                info!("No primer file given; reads will only be quality trimmed");
                PrimerIndex::new(Vec::new())?
            }
        };
        let amplicons = self
            .primer_pairs
            .as_ref()
            .map(|path| AmpliconIndex::from_pair_file(path, &primers))
            .transpose()?;
        Ok((primers, amplicons))
    }
}

impl Command for Trim {
    fn execute(&self, command_line: &str) -> Result<()> {
        let options = self.validate()?;
        let threads = self.threading.threads;

        info!("Starting Trim");
        info!("Input: {}", self.io.input.display());
        info!("Output: {}", self.io.output.display());
        if let Some(region) = &self.region {
            info!("Region: {region}");
        }
        info!(
            "Minimum quality: {}, window: {}, minimum length: {}",
            options.min_quality, options.window, options.min_length
        );
        if self.primer_offset > 0 {
            info!("Primer offset: {}", self.primer_offset);
        }
        if options.keep_for_reanalysis {
            info!("Filtered reads will be written with the QC-fail flag");
        }

        let (primers, amplicons) = self.load_primers()?;
        let timer = OperationTimer::new("Trimming reads");

        let trimmer = match &self.region {
            Some(region) => {
                let region = parse_region(region)?;
                let (mut reader, header) = create_indexed_bam_reader(&self.io.input)?;
                let mut trimmer = TrimOrchestrator::new(options, &header, primers, amplicons);
                let mut sink = BamSink::create(
                    &self.io.output,
                    add_pg_record(header.clone(), command_line)?,
                    threads,
                )?;

                let query = reader
                    .query(&header, &region)
                    .with_context(|| format!("Failed to query region {region}"))?;
                let records = query.map(|result| {
                    result.and_then(|record| RecordBuf::try_from_alignment_record(&header, &record))
                });
                trimmer.run(records, &mut sink)?;
                sink.finish()?;
                trimmer
            }
            None => {
                let (mut reader, header) = create_bam_reader(&self.io.input, threads)?;
                let mut trimmer = TrimOrchestrator::new(options, &header, primers, amplicons);
                let mut sink = BamSink::create(
                    &self.io.output,
                    add_pg_record(header.clone(), command_line)?,
                    threads,
                )?;

                trimmer.run(reader.record_bufs(&header), &mut sink)?;
                sink.finish()?;
                trimmer
            }
        };

        let (metrics, primer_counts) = trimmer.finish();
        log_trim_summary(&metrics);
        log_primer_summary(&primer_counts);

        if let Some(path) = &self.metrics {
            write_metrics_auto(path, std::slice::from_ref(&metrics))?;
        }
        if let Some(path) = &self.primer_metrics {
            write_metrics_auto(path, &primer_counts)?;
        }

        timer.log_completion(metrics.total_records);
        Ok(())
    }
}
