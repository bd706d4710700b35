#![deny(unsafe_code)]
#![allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

//! CIGAR algebra used to soft-clip primers and low-quality tails from aligned reads.
//!
//! Every operation here works on a plain slice of noodles [`Op`] values together with a
//! 0-based signed leftmost reference coordinate, and returns a freshly owned operation vector.
//! Nothing in this crate touches a record directly: callers read the alignment start, CIGAR
//! and qualities off their record, run the trim, and move the result back.
//!
//! - [`ops`] - consumption table, lengths, reversal and CIGAR string conversion
//! - [`coords`] - reference position to query offset mapping (and back)
//! - [`quality`] - sliding-window 3' quality clipping
//! - [`primer`] - soft-clipping of primer bases up to a reference boundary
//! - [`condense`] - merging of adjacent operations of the same kind
//!
//! # Example
//!
//! ```
//! use fgtrim_cigar::ops::{cigar_string, parse_cigar_string};
//! use fgtrim_cigar::primer::{ScanDirection, trim};
//!
//! let ops = parse_cigar_string("50M").unwrap();
//! let clipped = trim(&ops, 100, 110, ScanDirection::Forward);
//! assert_eq!(cigar_string(&clipped.ops), "10S40M");
//! assert_eq!(clipped.reference_start_delta, 10);
//! ```

pub mod condense;
pub mod coords;
pub mod ops;
pub mod primer;
pub mod quality;

pub use condense::condense;
pub use coords::{query_offset_for_reference_pos, reference_pos_for_query_offset};
pub use ops::{CigarParseError, cigar_string, parse_cigar_string, query_length, reference_length};
pub use primer::{PrimerTrim, ScanDirection};
pub use quality::QualityTrim;
