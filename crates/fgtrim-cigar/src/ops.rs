//! Classification and simple arithmetic over CIGAR operations.

use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use thiserror::Error;

/// Error raised when a textual CIGAR cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CigarParseError {
    /// An operation character was not preceded by a length
    #[error("CIGAR operation '{op}' at offset {offset} has no length")]
    MissingLength {
        /// The operation character
        op: char,
        /// Byte offset of the operation in the CIGAR string
        offset: usize,
    },

    /// A character that is not a SAM CIGAR operation
    #[error("Unknown CIGAR operation '{op}' at offset {offset}")]
    UnknownOperation {
        /// The offending character
        op: char,
        /// Byte offset of the character in the CIGAR string
        offset: usize,
    },

    /// The string ended with digits that were never followed by an operation
    #[error("CIGAR string ends with a length but no operation")]
    TrailingLength,
}

/// Returns `(consumes_query, consumes_reference)` for an operation kind.
///
/// | kind    | query | reference |
/// |---------|-------|-----------|
/// | M, =, X | yes   | yes       |
/// | I, S    | yes   | no        |
/// | D, N    | no    | yes       |
/// | H, P    | no    | no        |
#[must_use]
pub const fn consumes(kind: Kind) -> (bool, bool) {
    match kind {
        Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => (true, true),
        Kind::Insertion | Kind::SoftClip => (true, false),
        Kind::Deletion | Kind::Skip => (false, true),
        Kind::HardClip | Kind::Pad => (false, false),
    }
}

/// True if the operation kind advances along the read.
#[inline]
#[must_use]
pub const fn consumes_query(kind: Kind) -> bool {
    consumes(kind).0
}

/// True if the operation kind advances along the reference.
#[inline]
#[must_use]
pub const fn consumes_reference(kind: Kind) -> bool {
    consumes(kind).1
}

/// True if the operation kind is an aligned base (M, = or X).
#[inline]
#[must_use]
pub const fn consumes_both(kind: Kind) -> bool {
    let (query, reference) = consumes(kind);
    query && reference
}

/// Reverses the order of operations in place.
///
/// Trimming is always written as "clip from the front"; reversing lets the same walk clip
/// from the back of an alignment.
pub fn reverse(ops: &mut [Op]) {
    ops.reverse();
}

/// Number of read bases described by the operations.
#[must_use]
pub fn query_length(ops: &[Op]) -> usize {
    ops.iter().filter(|op| consumes_query(op.kind())).map(|op| op.len()).sum()
}

/// Number of reference bases spanned by the operations.
#[must_use]
pub fn reference_length(ops: &[Op]) -> usize {
    ops.iter().filter(|op| consumes_reference(op.kind())).map(|op| op.len()).sum()
}

/// The SAM character for an operation kind.
#[must_use]
pub const fn kind_char(kind: Kind) -> char {
    match kind {
        Kind::Match => 'M',
        Kind::Insertion => 'I',
        Kind::Deletion => 'D',
        Kind::Skip => 'N',
        Kind::SoftClip => 'S',
        Kind::HardClip => 'H',
        Kind::Pad => 'P',
        Kind::SequenceMatch => '=',
        Kind::SequenceMismatch => 'X',
    }
}

fn kind_from_char(c: char) -> Option<Kind> {
    let kind = match c {
        'M' => Kind::Match,
        'I' => Kind::Insertion,
        'D' => Kind::Deletion,
        'N' => Kind::Skip,
        'S' => Kind::SoftClip,
        'H' => Kind::HardClip,
        'P' => Kind::Pad,
        '=' => Kind::SequenceMatch,
        'X' => Kind::SequenceMismatch,
        _ => return None,
    };
    Some(kind)
}

/// Formats operations as a SAM CIGAR string (`*` when empty).
#[must_use]
pub fn cigar_string(ops: &[Op]) -> String {
    if ops.is_empty() {
        return "*".to_string();
    }
    ops.iter().map(|op| format!("{}{}", op.len(), kind_char(op.kind()))).collect()
}

/// Parses a SAM CIGAR string such as `5S40M2I3M`. Both `*` and the empty string parse to
/// an empty operation list.
///
/// # Errors
///
/// Returns a [`CigarParseError`] if the string contains an unknown operation, an operation
/// without a length, or a dangling length.
pub fn parse_cigar_string(cigar: &str) -> Result<Vec<Op>, CigarParseError> {
    if cigar.is_empty() || cigar == "*" {
        return Ok(Vec::new());
    }

    let mut ops = Vec::new();
    let mut len: Option<usize> = None;

    for (offset, c) in cigar.char_indices() {
        if let Some(digit) = c.to_digit(10) {
            len = Some(len.unwrap_or(0) * 10 + digit as usize);
            continue;
        }
        let kind = kind_from_char(c).ok_or(CigarParseError::UnknownOperation { op: c, offset })?;
        let n = len.take().ok_or(CigarParseError::MissingLength { op: c, offset })?;
        ops.push(Op::new(kind, n));
    }

    if len.is_some() {
        return Err(CigarParseError::TrailingLength);
    }

    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn cigar(s: &str) -> Vec<Op> {
        parse_cigar_string(s).unwrap()
    }

    #[rstest]
    #[case(Kind::Match, (true, true))]
    #[case(Kind::SequenceMatch, (true, true))]
    #[case(Kind::SequenceMismatch, (true, true))]
    #[case(Kind::Insertion, (true, false))]
    #[case(Kind::SoftClip, (true, false))]
    #[case(Kind::Deletion, (false, true))]
    #[case(Kind::Skip, (false, true))]
    #[case(Kind::HardClip, (false, false))]
    #[case(Kind::Pad, (false, false))]
    fn test_consumes_table(#[case] kind: Kind, #[case] expected: (bool, bool)) {
        assert_eq!(consumes(kind), expected);
        assert_eq!(consumes_query(kind), expected.0);
        assert_eq!(consumes_reference(kind), expected.1);
        assert_eq!(consumes_both(kind), expected.0 && expected.1);
    }

    #[test]
    fn test_lengths() {
        let ops = cigar("2H5S10M2I3D4N6=1X3S1H");
        assert_eq!(query_length(&ops), 5 + 10 + 2 + 6 + 1 + 3);
        assert_eq!(reference_length(&ops), 10 + 3 + 4 + 6 + 1);
    }

    #[test]
    fn test_reverse_in_place() {
        let mut ops = cigar("5S10M2I");
        reverse(&mut ops);
        assert_eq!(cigar_string(&ops), "2I10M5S");
    }

    #[rstest]
    #[case("10M")]
    #[case("5S40M2I3D10M1H")]
    #[case("3=1X4=")]
    fn test_cigar_string_round_trips(#[case] s: &str) {
        assert_eq!(cigar_string(&cigar(s)), s);
    }

    #[test]
    fn test_parse_empty_and_star() {
        assert!(parse_cigar_string("").unwrap().is_empty());
        assert!(parse_cigar_string("*").unwrap().is_empty());
        assert_eq!(cigar_string(&[]), "*");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_cigar_string("10Q"),
            Err(CigarParseError::UnknownOperation { op: 'Q', offset: 2 })
        );
        assert_eq!(
            parse_cigar_string("M"),
            Err(CigarParseError::MissingLength { op: 'M', offset: 0 })
        );
        assert_eq!(parse_cigar_string("10M5"), Err(CigarParseError::TrailingLength));
    }

    proptest! {
        #[test]
        fn prop_reverse_is_an_involution(lens in proptest::collection::vec(1usize..50, 1..10)) {
            let kinds = [Kind::Match, Kind::Insertion, Kind::Deletion, Kind::SoftClip];
            let ops: Vec<Op> =
                lens.iter().enumerate().map(|(i, &n)| Op::new(kinds[i % kinds.len()], n)).collect();
            let mut twice = ops.clone();
            reverse(&mut twice);
            reverse(&mut twice);
            prop_assert_eq!(twice, ops);
        }
    }
}
