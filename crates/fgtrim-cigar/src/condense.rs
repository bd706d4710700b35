//! Merging of adjacent operations of the same kind.

use noodles::sam::alignment::record::cigar::Op;

/// Merges runs of adjacent same-kind operations, e.g. `5S3S40M` becomes `8S40M`.
///
/// Trims emit soft clips piecewise, so a trimmed alignment is condensed before it is written
/// back. The result never contains two neighbouring operations of the same kind, and
/// condensing an already condensed list returns it unchanged.
#[must_use]
pub fn condense(ops: Vec<Op>) -> Vec<Op> {
    let mut out: Vec<Op> = Vec::with_capacity(ops.len());

    for op in ops {
        if let Some(last) = out.last_mut() {
            if last.kind() == op.kind() {
                *last = Op::new(op.kind(), last.len() + op.len());
                continue;
            }
        }
        out.push(op);
    }

    out
}
