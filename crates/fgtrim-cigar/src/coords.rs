//! Mapping between reference coordinates and offsets into the read.
//!
//! Both functions take the alignment's 0-based leftmost reference position and walk the
//! operations once. Coordinates are signed: a reference target to the left of the alignment
//! start yields a negative query offset, which callers clamp as needed.

use noodles::sam::alignment::record::cigar::Op;

use crate::ops::consumes;

/// Maps a reference position to an offset along the read.
///
/// Walks the operations accumulating reference and query positions. At the first
/// reference-consuming operation whose span reaches `target` (`target <= ref_pos + len`),
/// the remaining distance is added to the query offset if that operation also consumes the
/// read, and the offset is returned. A target inside a deletion therefore maps to the query
/// offset at the start of the deletion. A target beyond the alignment maps to the full
/// query length.
///
/// # Examples
///
/// ```
/// use fgtrim_cigar::coords::query_offset_for_reference_pos;
/// use fgtrim_cigar::ops::parse_cigar_string;
///
/// let ops = parse_cigar_string("5S20M").unwrap();
/// assert_eq!(query_offset_for_reference_pos(&ops, 110, 100), 15);
///
/// let ops = parse_cigar_string("20M").unwrap();
/// assert_eq!(query_offset_for_reference_pos(&ops, 95, 100), -5);
/// ```
#[must_use]
pub fn query_offset_for_reference_pos(ops: &[Op], target: i64, ref_start: i64) -> i64 {
    let mut ref_pos = ref_start;
    let mut query_offset = 0i64;

    for op in ops {
        let len = op.len() as i64;
        let (query, reference) = consumes(op.kind());

        if reference {
            if target <= ref_pos + len {
                if query {
                    query_offset += target - ref_pos;
                }
                return query_offset;
            }
            ref_pos += len;
        }

        if query {
            query_offset += len;
        }
    }

    query_offset
}

/// Maps an offset along the read to a reference position.
///
/// The mirror image of [`query_offset_for_reference_pos`]: the walk is keyed on
/// query-consuming operations (`target <= query_offset + len`), and the remaining distance
/// is added to the reference position only when that operation also consumes the reference.
/// An offset landing in a leading soft clip or insertion maps to the reference position
/// where that operation sits.
///
/// # Examples
///
/// ```
/// use fgtrim_cigar::coords::reference_pos_for_query_offset;
/// use fgtrim_cigar::ops::parse_cigar_string;
///
/// let ops = parse_cigar_string("5S20M").unwrap();
/// assert_eq!(reference_pos_for_query_offset(&ops, 8, 100), 103);
/// assert_eq!(reference_pos_for_query_offset(&ops, 3, 100), 100);
/// ```
#[must_use]
pub fn reference_pos_for_query_offset(ops: &[Op], target: i64, ref_start: i64) -> i64 {
    let mut ref_pos = ref_start;
    let mut query_offset = 0i64;

    for op in ops {
        let len = op.len() as i64;
        let (query, reference) = consumes(op.kind());

        if query {
            if target <= query_offset + len {
                if reference {
                    ref_pos += target - query_offset;
                }
                return ref_pos;
            }
            query_offset += len;
        }

        if reference {
            ref_pos += len;
        }
    }

    ref_pos
}
