//! Soft-clipping of primer bases up to a reference boundary.
//!
//! A forward primer sits at the left end of an alignment and is clipped up to (but not
//! including) the first base after the primer; a reverse primer sits at the right end and is
//! clipped back to the last base before it. Both cases run the same left-to-right walk, the
//! reverse case over reversed operations.

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::coords::query_offset_for_reference_pos;
use crate::ops::{consumes, query_length};

/// Which end of the alignment a primer trim clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Clip from the leftmost operation (forward primer)
    Forward,
    /// Clip from the rightmost operation (reverse primer)
    Reverse,
}

impl ScanDirection {
    /// Chooses the clipping end for a read.
    ///
    /// Paired reads with an insert comfortably longer than the read are clipped according
    /// to their own strand. All other reads (single-end, or pairs whose mates overlap so
    /// much that they behave like one stitched fragment) are clipped from whichever end the
    /// caller asks for via `force_reverse`.
    #[must_use]
    pub fn for_read(
        paired: bool,
        insert_exceeds_read: bool,
        is_reverse: bool,
        force_reverse: bool,
    ) -> Self {
        let reverse = if paired && insert_exceeds_read { is_reverse } else { force_reverse };
        if reverse { Self::Reverse } else { Self::Forward }
    }
}

/// Operations after a primer trim together with the reference shift of the alignment start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimerTrim {
    /// The trimmed operations in alignment order
    pub ops: Vec<Op>,
    /// Reference bases removed ahead of the first retained aligned base. Callers add this to
    /// the alignment start after a forward trim and ignore it after a reverse trim.
    pub reference_start_delta: i64,
}

/// Number of read bases to soft-clip so that `boundary` becomes the first (forward) or last
/// (reverse) reference base of the alignment. Reads lying entirely inside the primer produce
/// a negative distance, which is clamped to zero.
#[must_use]
pub fn clip_length_for_boundary(
    ops: &[Op],
    ref_start: i64,
    boundary: i64,
    direction: ScanDirection,
) -> usize {
    let offset = query_offset_for_reference_pos(ops, boundary, ref_start);
    let len = match direction {
        ScanDirection::Forward => offset,
        ScanDirection::Reverse => query_length(ops) as i64 - offset - 1,
    };
    usize::try_from(len).unwrap_or(0)
}

/// Soft-clips primer bases from one end of an alignment.
///
/// Query-consuming operations are converted to soft clips until the clip length computed by
/// [`clip_length_for_boundary`] is used up, splitting the operation that straddles it. Once
/// the budget is spent, insertions (or existing soft clips) that still precede the first
/// aligned base are folded into the clip as well, so the result always starts with an
/// aligned base. Reference spans passed over on the way add to the returned delta; deletions
/// and skips there are dropped, as are hard clips and padding. Everything from the first
/// retained aligned base onwards is copied unchanged.
///
/// # Examples
///
/// ```
/// use fgtrim_cigar::ops::{cigar_string, parse_cigar_string};
/// use fgtrim_cigar::primer::{ScanDirection, trim};
///
/// let ops = parse_cigar_string("50M").unwrap();
/// let reverse = trim(&ops, 100, 139, ScanDirection::Reverse);
/// assert_eq!(cigar_string(&reverse.ops), "40M10S");
/// ```
#[must_use]
pub fn trim(ops: &[Op], ref_start: i64, boundary: i64, direction: ScanDirection) -> PrimerTrim {
    let mut remaining = clip_length_for_boundary(ops, ref_start, boundary, direction);

    let mut walk = ops.to_vec();
    if direction == ScanDirection::Reverse {
        walk.reverse();
    }

    let mut out = Vec::with_capacity(walk.len() + 1);
    let mut delta = 0i64;
    let mut anchored = false;

    for op in walk {
        if anchored {
            out.push(op);
            continue;
        }

        let kind = op.kind();
        let len = op.len();
        let (query, reference) = consumes(kind);

        if remaining == 0 && query && reference {
            anchored = true;
            out.push(op);
            continue;
        }

        let mut reference_advance = len;
        if query {
            if remaining == 0 {
                out.push(Op::new(Kind::SoftClip, len));
                continue;
            }

            let clipped = remaining.min(len);
            out.push(Op::new(Kind::SoftClip, clipped));
            reference_advance = clipped;
            remaining -= clipped;

            if len > clipped {
                out.push(Op::new(kind, len - clipped));
                anchored = reference;
            }
        }

        if reference {
            delta += reference_advance as i64;
        }
    }

    if direction == ScanDirection::Reverse {
        out.reverse();
    }

    PrimerTrim { ops: out, reference_start_delta: delta }
}
