//! Amplicon intervals built from primer pairs, and the envelope test used to reject reads
//! whose fragment does not lie inside any amplicon.
//!
//! The pair file has one amplicon per line: two primer names separated by a tab (or other
//! whitespace). Blank lines and `#` comments are skipped. Both primers of a pair must lie on
//! the same reference sequence.

use coitrees::{BasicCOITree, Interval, IntervalTree};
use fgoxide::io::Io;
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::{FgtrimError, Result};
use crate::primers::PrimerIndex;

/// A closed reference interval `[low, high]` on one reference sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amplicon {
    /// Reference sequence name
    pub chrom: String,
    /// Leftmost covered position
    pub low: i64,
    /// Rightmost covered position
    pub high: i64,
}

impl Amplicon {
    /// True if `[low, high]` lies entirely inside this amplicon (ends inclusive).
    #[must_use]
    pub fn envelops(&self, low: i64, high: i64) -> bool {
        self.low <= low && high <= self.high
    }
}

/// Interval trees of amplicons, one per reference sequence, supporting envelope queries.
pub struct AmpliconIndex {
    amplicons: Vec<Amplicon>,
    trees: HashMap<String, BasicCOITree<u32, u32>>,
}

impl std::fmt::Debug for AmpliconIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmpliconIndex").field("amplicons", &self.amplicons).finish_non_exhaustive()
    }
}

impl AmpliconIndex {
    /// Builds the index.
    ///
    /// # Errors
    ///
    /// Returns an error if an amplicon does not fit the interval tree's 32-bit range.
    pub fn new(amplicons: Vec<Amplicon>) -> Result<Self> {
        let mut intervals: HashMap<String, Vec<Interval<u32>>> = HashMap::new();
        for (i, amplicon) in amplicons.iter().enumerate() {
            let (Ok(first), Ok(last), Ok(id)) =
                (i32::try_from(amplicon.low), i32::try_from(amplicon.high), u32::try_from(i))
            else {
                return Err(FgtrimError::InvalidParameter {
                    parameter: "primer-pairs".to_string(),
                    reason: format!("amplicon {}-{} is out of range", amplicon.low, amplicon.high),
                });
            };
            intervals.entry(amplicon.chrom.clone()).or_default().push(Interval {
                first,
                last,
                metadata: id,
            });
        }
        let trees = intervals
            .into_iter()
            .map(|(chrom, nodes)| (chrom, BasicCOITree::new(nodes.as_slice())))
            .collect();
        Ok(Self { amplicons, trees })
    }

    /// Reads a primer-pair file and builds one amplicon per pair from the loaded primers.
    ///
    /// Each amplicon spans from the smaller primer start to one past the larger primer end.
    /// Pairs naming an unknown primer, or primers on different references, are logged and
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FgtrimError::InvalidFileFormat`] if the file cannot be read, a line does not
    /// have two names, or no pair could be resolved.
    pub fn from_pair_file<P: AsRef<Path>>(path: P, primers: &PrimerIndex) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| FgtrimError::InvalidFileFormat {
            file_type: "primer pair".to_string(),
            path: path.display().to_string(),
            reason,
        };

        let lines = Io::default().read_lines(&path).map_err(|e| invalid(e.to_string()))?;
        let mut amplicons = Vec::new();

        for (line_no, line) in lines.iter().enumerate().map(|(i, l)| (i + 1, l.trim())) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let names: Vec<&str> = line.split_whitespace().collect();
            let [left, right] = names[..] else {
                return Err(invalid(format!("line {line_no}: expected two primer names")));
            };

            match (primers.by_name(left), primers.by_name(right)) {
                (Some(a), Some(b)) if a.chrom == b.chrom => amplicons.push(Amplicon {
                    chrom: a.chrom.clone(),
                    low: a.start.min(b.start),
                    high: a.end.max(b.end) + 1,
                }),
                (Some(a), Some(b)) => warn!(
                    "Skipping primer pair {left}/{right}: primers are on {} and {}",
                    a.chrom, b.chrom
                ),
                _ => warn!("Skipping primer pair {left}/{right}: primer not found in BED file"),
            }
        }

        if amplicons.is_empty() {
            return Err(invalid("no primer pairs matched the loaded primers".to_string()));
        }
        info!("Amplicons detected: {}", amplicons.len());
        for amplicon in &amplicons {
            log::debug!("  {}:[{}, {}]", amplicon.chrom, amplicon.low, amplicon.high);
        }
        Self::new(amplicons)
    }

    /// The amplicons in file order.
    #[must_use]
    pub fn amplicons(&self) -> &[Amplicon] {
        &self.amplicons
    }

    /// True if some amplicon on `chrom` contains `[low, high]` entirely.
    #[must_use]
    pub fn envelope_contains(&self, chrom: &str, low: i64, high: i64) -> bool {
        let Some(tree) = self.trees.get(chrom) else {
            return false;
        };
        let clamp = |v: i64| i32::try_from(v).unwrap_or(if v < 0 { i32::MIN } else { i32::MAX });

        let mut found = false;
        tree.query(clamp(low), clamp(high), |node| {
            let index = node.metadata.clone() as usize;
            found |= self.amplicons[index].envelops(low, high);
        });
        found
    }
}

/// The reference interval covered by a read's fragment.
///
/// With a positive insert size the fragment runs right from the read start; otherwise it
/// ends at the read's exclusive end and extends left by the (negative or zero) insert size.
///
/// # Examples
///
/// ```
/// use fgtrim_lib::amplicons::fragment_interval;
///
/// assert_eq!(fragment_interval(100, 250, 300), (100, 400));
/// assert_eq!(fragment_interval(100, 250, -300), (-50, 250));
/// ```
#[must_use]
pub fn fragment_interval(start: i64, end: i64, insert_size: i64) -> (i64, i64) {
    if insert_size > 0 { (start, start + insert_size) } else { (end + insert_size, end) }
}
