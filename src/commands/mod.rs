//! CLI command implementations for fgtrim.
//!
//! - [`trim`] - Trim primers and low-quality tails from aligned reads

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::missing_errors_doc,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

pub mod command;
pub mod common;
pub mod trim;
