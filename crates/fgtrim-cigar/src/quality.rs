//! Sliding-window quality trimming of the 3' end of a read.
//!
//! The scan starts at the 5' end of the read and slides a window of `window` bases towards
//! the 3' end, stopping at the first window whose mean quality falls below the threshold.
//! Everything from that point onwards is soft-clipped. For reads that were sequenced off the
//! reverse strand the 3' end is the left end of the alignment, so the scan runs over the
//! qualities back to front and the clip is applied to the leading operations, which moves
//! the alignment start.

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::coords::reference_pos_for_query_offset;
use crate::ops::consumes_query;

/// Outcome of quality-trimming one alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityTrim {
    /// New operations and the (0-based) alignment start that goes with them.
    Trimmed {
        /// Operations with the low-quality tail soft-clipped
        ops: Vec<Op>,
        /// Leftmost reference position of the trimmed alignment
        alignment_start: i64,
    },
    /// The trim would have moved a reverse-strand alignment start to or before its current
    /// position; the caller keeps its operations and position as they are.
    Unchanged,
}

/// Number of bases to clip from the 3' end of a read.
///
/// `quals` are in sequencing orientation when `reverse` is false and are read back to front
/// when it is true; the slice itself is never modified. A window larger than the read is
/// clamped to the read length, and once fewer than `window` bases remain the window shrinks
/// so that the final bases are still evaluated.
///
/// # Examples
///
/// ```
/// use fgtrim_cigar::quality::three_prime_clip_length;
///
/// let quals = [30, 30, 30, 10, 10, 5, 5, 5];
/// assert_eq!(three_prime_clip_length(&quals, 20, 3, false), 6);
/// assert_eq!(three_prime_clip_length(&quals, 20, 3, true), 8);
/// ```
#[must_use]
pub fn three_prime_clip_length(quals: &[u8], threshold: u8, window: usize, reverse: bool) -> usize {
    let len = quals.len();
    let mut window = window.min(len);
    if window == 0 {
        return 0;
    }

    let threshold = f64::from(threshold);
    let mut i = 0;
    while i < len {
        let slice = if reverse { &quals[len - i - window..len - i] } else { &quals[i..i + window] };
        if mean_quality(slice) < threshold {
            break;
        }
        i += 1;
        if i + window > len {
            window -= 1;
        }
    }

    len - i
}

fn mean_quality(quals: &[u8]) -> f64 {
    let sum: u32 = quals.iter().map(|&q| u32::from(q)).sum();
    f64::from(sum) / quals.len() as f64
}

/// Soft-clips the low-quality 3' tail from an alignment.
///
/// `reverse` selects reverse-strand handling (qualities scanned back to front, clip applied
/// at the left end of the alignment). The clip is expressed as soft clips over the first
/// `clip` read bases counted from the trimmed end: whole query-consuming operations become
/// soft clips, the operation straddling the boundary is split, and reference-only or
/// padding operations inside the clipped stretch are dropped.
///
/// For reverse reads the new alignment start is the reference position of the first
/// retained base; if that does not lie strictly to the right of `ref_start` nothing is
/// changed and [`QualityTrim::Unchanged`] is returned. Forward reads keep `ref_start`.
#[must_use]
pub fn trim(
    ops: &[Op],
    quals: &[u8],
    ref_start: i64,
    threshold: u8,
    window: usize,
    reverse: bool,
) -> QualityTrim {
    let clip = three_prime_clip_length(quals, threshold, window, reverse);

    if reverse {
        let alignment_start = reference_pos_for_query_offset(ops, clip as i64, ref_start);
        if alignment_start <= ref_start {
            return QualityTrim::Unchanged;
        }
        QualityTrim::Trimmed { ops: soft_clip_leading(ops.iter().copied(), clip), alignment_start }
    } else {
        let mut clipped = soft_clip_leading(ops.iter().rev().copied(), clip);
        clipped.reverse();
        QualityTrim::Trimmed { ops: clipped, alignment_start: ref_start }
    }
}

/// Soft-clips `remaining` read bases from the front of `ops`.
fn soft_clip_leading(ops: impl ExactSizeIterator<Item = Op>, mut remaining: usize) -> Vec<Op> {
    let mut out = Vec::with_capacity(ops.len() + 1);

    for op in ops {
        if remaining == 0 {
            out.push(op);
            continue;
        }
        if !consumes_query(op.kind()) {
            continue;
        }

        let clipped = remaining.min(op.len());
        out.push(Op::new(Kind::SoftClip, clipped));
        remaining -= clipped;
        if op.len() > clipped {
            out.push(Op::new(op.kind(), op.len() - clipped));
        }
    }

    out
}
