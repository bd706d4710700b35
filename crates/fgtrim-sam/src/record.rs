//! Record-level accessors and mutators used while trimming.
//!
//! Positions are 0-based and signed so they compose directly with the arithmetic in
//! `fgtrim_cigar`; the conversion to and from noodles' 1-based [`Position`] happens here and
//! nowhere else.

use anyhow::{Context, Result, bail};
use noodles::core::Position;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;

use fgtrim_cigar::reference_length;

/// Tag holding the index of the primer a read was trimmed against.
pub const PRIMER_INDEX_TAG: Tag = Tag::new(b'X', b'A');

/// The alignment's operations as an owned list.
#[must_use]
pub fn operations(record: &RecordBuf) -> Vec<Op> {
    record.cigar().as_ref().to_vec()
}

/// Replaces the alignment's operations.
pub fn set_operations(record: &mut RecordBuf, ops: Vec<Op>) {
    *record.cigar_mut() = ops.into_iter().collect();
}

/// 0-based leftmost reference position, if the record has one.
#[must_use]
pub fn reference_start(record: &RecordBuf) -> Option<i64> {
    record.alignment_start().map(|p| usize::from(p) as i64 - 1)
}

/// Sets the 0-based leftmost reference position.
///
/// # Errors
///
/// Returns an error if `start` is negative.
pub fn set_reference_start(record: &mut RecordBuf, start: i64) -> Result<()> {
    let one_based = usize::try_from(start + 1)
        .ok()
        .and_then(|p| Position::try_from(p).ok())
        .with_context(|| format!("Invalid alignment start: {start}"))?;
    *record.alignment_start_mut() = Some(one_based);
    Ok(())
}

/// Exclusive 0-based end of the alignment.
///
/// An alignment that spans no reference bases still occupies one position, so this is
/// `start + max(reference_length, 1)`. Returns `None` if the record has no start.
#[must_use]
pub fn end_position(record: &RecordBuf) -> Option<i64> {
    let start = reference_start(record)?;
    let span = reference_length(record.cigar().as_ref()).max(1);
    Some(start + span as i64)
}

/// Absolute template length.
#[must_use]
pub fn insert_size(record: &RecordBuf) -> i64 {
    i64::from(record.template_length()).abs()
}

/// Raw Phred quality scores in sequencing order as stored on the record.
#[must_use]
pub fn quality_scores(record: &RecordBuf) -> &[u8] {
    record.quality_scores().as_ref()
}

/// Sets the QC-fail flag.
pub fn mark_qc_fail(record: &mut RecordBuf) {
    record.flags_mut().insert(Flags::QC_FAIL);
}

/// Records the index of the primer used to trim this read in the `XA` tag (signed 16-bit).
///
/// # Errors
///
/// Returns an error if the index does not fit in an `i16`.
pub fn set_primer_index(record: &mut RecordBuf, index: usize) -> Result<()> {
    let Ok(value) = i16::try_from(index) else {
        bail!("Primer index {index} does not fit in the XA tag");
    };
    record.data_mut().insert(PRIMER_INDEX_TAG, Value::Int16(value));
    Ok(())
}

/// The primer index previously stored by [`set_primer_index`].
#[must_use]
pub fn primer_index(record: &RecordBuf) -> Option<i64> {
    match record.data().get(&PRIMER_INDEX_TAG)? {
        Value::Int8(v) => Some(i64::from(*v)),
        Value::UInt8(v) => Some(i64::from(*v)),
        Value::Int16(v) => Some(i64::from(*v)),
        Value::UInt16(v) => Some(i64::from(*v)),
        Value::Int32(v) => Some(i64::from(*v)),
        Value::UInt32(v) => Some(i64::from(*v)),
        _ => None,
    }
}
