#![deny(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

//! Alignment record helpers for fgtrim.
//!
//! - [`record`]: reading and updating the parts of a [`RecordBuf`] the trimmer touches,
//!   using 0-based signed reference coordinates throughout
//! - [`builder`]: fluent builders for test records and BAM files
//!
//! [`RecordBuf`]: noodles::sam::alignment::RecordBuf

pub mod builder;
pub mod record;

pub use builder::{RecordBuilder, SamBuilder};
pub use record::{
    PRIMER_INDEX_TAG, end_position, insert_size, mark_qc_fail, operations, primer_index,
    quality_scores, reference_start, set_operations, set_primer_index, set_reference_start,
};
