#![deny(unsafe_code)]
// Clippy lint configuration for CI
// These lints are allowed because:
// - cast_*: coordinates move between noodles' usize positions and signed i64 arithmetic
// - missing_*_doc: Documentation improvements tracked separately
// - struct_excessive_bools: option structs mirror CLI flags
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::struct_excessive_bools,
    clippy::uninlined_format_args
)]

//! # fgtrim - primer and quality trimming for amplicon alignments
//!
//! This library soft-clips PCR primer sequence and low-quality 3' tails from aligned reads,
//! rewriting each read's alignment start and CIGAR in place.
//!
//! ## Overview
//!
//! ### Core Functionality
//!
//! - **[`primers`]** - BED primer loading and overlap queries
//! - **[`amplicons`]** - amplicons from primer pairs and the fragment envelope test
//! - **[`trimmer`]** - the per-read trimming pipeline and write policy
//! - [`cigar`] - CIGAR algebra (re-exported from `fgtrim-cigar`)
//!
//! ### Utilities
//!
//! - **[`bam_io`]** - BAM readers (whole file or indexed region) and writers
//! - **[`header`]** - `@PG` chaining
//! - **[`validation`]** - parameter and file checks
//! - **[`progress`]** / **[`logging`]** - progress and summary logging
//! - [`metrics`] - TSV metrics (re-exported from `fgtrim-metrics`)
//! - [`sam`] - record accessors and test builders (re-exported from `fgtrim-sam`)
//!
//! ## Quick Start
//!
//! ```no_run
//! use fgtrim_lib::bam_io::{BamSink, create_bam_reader};
//! use fgtrim_lib::primers::PrimerIndex;
//! use fgtrim_lib::trimmer::{TrimOptions, TrimOrchestrator};
//!
//! # fn main() -> anyhow::Result<()> {
//! let primers = PrimerIndex::from_bed("primers.bed", 0)?;
//! let (mut reader, header) = create_bam_reader("input.bam", 1)?;
//! let mut sink = BamSink::create("trimmed.bam", header.clone(), 1)?;
//!
//! let mut trimmer = TrimOrchestrator::new(TrimOptions::default(), &header, primers, None);
//! trimmer.run(reader.record_bufs(&header), &mut sink)?;
//! sink.finish()?;
//!
//! let (metrics, _per_primer) = trimmer.finish();
//! println!("{} reads primer-trimmed", metrics.primer_trimmed);
//! # Ok(())
//! # }
//! ```

pub mod amplicons;
pub mod bam_io;
pub mod errors;
pub mod header;
pub mod logging;
pub mod primers;
pub mod progress;
pub mod trimmer;
pub mod validation;

pub use fgtrim_cigar as cigar;
pub use fgtrim_metrics as metrics;
pub use fgtrim_sam as sam;

pub use errors::{FgtrimError, Result};
pub use trimmer::{Disposition, TrimOptions, TrimOrchestrator};
