//! Integration tests for the fgtrim command line.
//!
//! These tests write small BAM, BED and pair files, run the `fgtrim` binary and inspect
//! its outputs.

mod helpers;
mod test_error_paths;
mod test_trim_command;
