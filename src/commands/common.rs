//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use noodles::sam::Header;

use fgtrim_lib::validation::validate_file_exists;

use crate::version::VERSION;

/// Common input/output options for commands that read a BAM and write a BAM.
#[derive(Debug, Clone, Args)]
pub struct BamIoOptions {
    /// Input BAM file (must be indexed when --region is given)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output BAM file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

impl BamIoOptions {
    /// Validates that the input file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the input file does not exist.
    pub fn validate(&self) -> Result<()> {
        validate_file_exists(&self.input, "Input BAM")?;
        Ok(())
    }
}

/// Threads used for BGZF compression and decompression.
#[derive(Debug, Clone, Args)]
pub struct ThreadingOptions {
    /// Number of BGZF worker threads for reading and writing.
    ///
    /// Records are always trimmed in input order on the main thread; only block
    /// (de)compression is parallelized.
    #[arg(long = "threads", default_value_t = 1)]
    pub threads: usize,
}

impl Default for ThreadingOptions {
    fn default() -> Self {
        Self { threads: 1 }
    }
}

/// Adds this program's `@PG` record, chained to the input's last program.
///
/// # Errors
///
/// Returns an error if the record cannot be added to the header.
pub fn add_pg_record(header: Header, command_line: &str) -> Result<Header> {
    fgtrim_lib::header::add_pg_record(header, VERSION.as_str(), command_line)
}
