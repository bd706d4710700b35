//! Primer loading and overlap queries.
//!
//! Primers come from a BED file: `chrom`, `start`, `end` (half-open, 0-based), then the
//! optional `name`, `score` and `strand` columns. They are stored with inclusive ends and
//! indexed in one interval tree per reference sequence so that the primers under a read's
//! anchor position can be found quickly.

use coitrees::{BasicCOITree, Interval, IntervalTree};
use fgoxide::io::Io;
use log::{debug, info};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use fgtrim_cigar::ScanDirection;
use fgtrim_metrics::PrimerReadCount;
use fgtrim_metrics::trim::finalize_primer_counts;

use crate::errors::{FgtrimError, Result};

/// Strand of a primer, or of the read being matched against primers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimerStrand {
    /// `+`
    Forward,
    /// `-`
    Reverse,
    /// Strand column absent or neither `+` nor `-`; matches reads on either strand
    Unknown,
}

impl PrimerStrand {
    /// Parses the BED strand column.
    #[must_use]
    pub fn from_bed(column: Option<&str>) -> Self {
        match column.map(str::trim) {
            Some("+") => Self::Forward,
            Some("-") => Self::Reverse,
            _ => Self::Unknown,
        }
    }

    /// Strand of a read from its reverse-complement flag.
    #[must_use]
    pub fn of_read(is_reverse: bool) -> Self {
        if is_reverse { Self::Reverse } else { Self::Forward }
    }

    /// True if a primer on this strand may trim a read on `read_strand`.
    #[must_use]
    pub fn accepts(self, read_strand: Self) -> bool {
        self == Self::Unknown || self == read_strand
    }

    /// BED symbol for the strand.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Forward => "+",
            Self::Reverse => "-",
            Self::Unknown => ".",
        }
    }
}

impl fmt::Display for PrimerStrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A primer with 0-based inclusive reference coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primer {
    /// Name from the BED file (or `chrom:start-end` when absent)
    pub name: String,
    /// Reference sequence name
    pub chrom: String,
    /// First reference base covered by the primer
    pub start: i64,
    /// Last reference base covered by the primer
    pub end: i64,
    /// Primer strand
    pub strand: PrimerStrand,
    /// Position of the primer in the BED file
    pub index: usize,
    /// Reads trimmed against this primer so far
    pub read_count: u64,
}

impl Primer {
    /// Number of reference bases covered.
    #[must_use]
    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    /// True if the primer covers no bases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }

    /// True if `pos` lies within `[start, end]`.
    #[must_use]
    pub fn contains(&self, pos: i64) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// Where and on which strand to look for primers.
///
/// Forward reads are anchored at their first aligned base, reverse reads at their last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimerQuery<'a> {
    /// Reference sequence the read is aligned to
    pub chrom: &'a str,
    /// 0-based reference position that must fall inside the primer
    pub anchor: i64,
    /// Strand of the read
    pub strand: PrimerStrand,
}

/// The loaded primers with an interval tree per reference sequence.
pub struct PrimerIndex {
    primers: Vec<Primer>,
    trees: HashMap<String, BasicCOITree<u32, u32>>,
}

impl fmt::Debug for PrimerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimerIndex").field("primers", &self.primers).finish_non_exhaustive()
    }
}

impl PrimerIndex {
    /// Builds an index over `primers`, renumbering their `index` fields by position.
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate does not fit the interval tree's 32-bit range.
    pub fn new(mut primers: Vec<Primer>) -> Result<Self> {
        let mut intervals: HashMap<String, Vec<Interval<u32>>> = HashMap::new();
        for (i, primer) in primers.iter_mut().enumerate() {
            primer.index = i;
            let (Ok(first), Ok(last), Ok(id)) =
                (i32::try_from(primer.start), i32::try_from(primer.end), u32::try_from(i))
            else {
                return Err(FgtrimError::InvalidParameter {
                    parameter: "primers".to_string(),
                    reason: format!("primer '{}' coordinates are out of range", primer.name),
                });
            };
            intervals.entry(primer.chrom.clone()).or_default().push(Interval {
                first,
                last,
                metadata: id,
            });
        }
        let trees = intervals
            .into_iter()
            .map(|(chrom, nodes)| (chrom, BasicCOITree::new(nodes.as_slice())))
            .collect();
        Ok(Self { primers, trees })
    }

    /// Loads primers from a BED file, widening each by `offset` bases on both sides.
    ///
    /// `#` comments, `track`/`browser` lines and blank lines are skipped. The BED end is
    /// exclusive and stored as `end - 1`; widening clamps the start at 0.
    ///
    /// # Errors
    ///
    /// Returns [`FgtrimError::InvalidFileFormat`] for unreadable files or malformed lines and
    /// [`FgtrimError::NoPrimers`] if the file holds no primers.
    pub fn from_bed<P: AsRef<Path>>(path: P, offset: i64) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| FgtrimError::InvalidFileFormat {
            file_type: "BED".to_string(),
            path: path.display().to_string(),
            reason,
        };

        let lines = Io::default().read_lines(&path).map_err(|e| invalid(e.to_string()))?;
        let primers = parse_bed_lines(lines.iter().map(String::as_str), offset).map_err(invalid)?;
        if primers.is_empty() {
            return Err(FgtrimError::NoPrimers { path: path.display().to_string() });
        }

        info!("Loaded {} primers from {}", primers.len(), path.display());
        Self::new(primers)
    }

    /// All primers in BED order.
    #[must_use]
    pub fn primers(&self) -> &[Primer] {
        &self.primers
    }

    /// Number of primers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.primers.len()
    }

    /// True if no primers are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primers.is_empty()
    }

    /// True if some primer lies on `chrom`.
    #[must_use]
    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.trees.contains_key(chrom)
    }

    /// Looks up a primer by name (first match).
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Primer> {
        self.primers.iter().find(|p| p.name == name)
    }

    /// Indices, in BED order, of the primers on the read's reference that contain the anchor
    /// and whose strand accepts the read's strand.
    #[must_use]
    pub fn overlapping(&self, query: PrimerQuery<'_>) -> Vec<usize> {
        let (Some(tree), Ok(anchor)) = (self.trees.get(query.chrom), i32::try_from(query.anchor))
        else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        tree.query(anchor, anchor, |node| {
            let index = node.metadata.clone() as usize;
            if self.primers[index].strand.accepts(query.strand) {
                hits.push(index);
            }
        });
        hits.sort_unstable();
        hits
    }

    /// Picks the primer that sets the trim boundary among `overlaps`.
    ///
    /// For a forward scan this is the primer reaching furthest right (max `end`), for a
    /// reverse scan the one reaching furthest left (min `start`). Ties go to the earliest
    /// candidate. Returns `None` for an empty candidate list.
    #[must_use]
    pub fn select_boundary_primer(
        &self,
        overlaps: &[usize],
        direction: ScanDirection,
    ) -> Option<usize> {
        let mut best: Option<usize> = None;
        for &candidate in overlaps {
            let primer = &self.primers[candidate];
            let better = match best.map(|b| &self.primers[b]) {
                None => true,
                Some(current) => match direction {
                    ScanDirection::Forward => primer.end > current.end,
                    ScanDirection::Reverse => primer.start < current.start,
                },
            };
            if better {
                best = Some(candidate);
            }
        }
        best
    }

    /// Length of the longest primer (0 when none are loaded).
    #[must_use]
    pub fn longest_primer_len(&self) -> i64 {
        self.primers.iter().map(Primer::len).max().unwrap_or(0)
    }

    /// Attributes one trimmed read to the primer at `index`.
    pub fn record_trim(&mut self, index: usize) {
        if let Some(primer) = self.primers.get_mut(index) {
            primer.read_count += 1;
            debug!("Read trimmed by primer {} ({})", primer.name, primer.read_count);
        }
    }

    /// Per-primer read counts for reporting, with fractions filled in.
    #[must_use]
    pub fn read_counts(&self) -> Vec<PrimerReadCount> {
        let mut rows: Vec<PrimerReadCount> = self
            .primers
            .iter()
            .map(|p| PrimerReadCount {
                name: p.name.clone(),
                index: p.index,
                chrom: p.chrom.clone(),
                start: p.start,
                end: p.end,
                strand: p.strand.symbol().to_string(),
                read_count: p.read_count,
                frac_reads: 0.0,
            })
            .collect();
        finalize_primer_counts(&mut rows);
        rows
    }
}

/// Parses BED lines into primers. Errors carry the 1-based line number.
fn parse_bed_lines<'a>(
    lines: impl Iterator<Item = &'a str>,
    offset: i64,
) -> std::result::Result<Vec<Primer>, String> {
    let mut primers = Vec::new();

    for (line_no, line) in lines.enumerate().map(|(i, l)| (i + 1, l.trim_end())) {
        if line.trim().is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(format!(
                "line {line_no}: expected at least 3 columns, found {}",
                fields.len()
            ));
        }

        let coord = |i: usize, what: &str| {
            fields[i]
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("line {line_no}: invalid {what} '{}'", fields[i]))
        };
        let start = coord(1, "start")?;
        let end = coord(2, "end")?;
        if start < 0 || end <= start {
            return Err(format!("line {line_no}: invalid interval {start}-{end}"));
        }

        let chrom = fields[0].to_string();
        let name = fields
            .get(3)
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map_or_else(|| format!("{chrom}:{start}-{end}"), ToString::to_string);

        primers.push(Primer {
            name,
            chrom,
            start: (start - offset).max(0),
            end: end - 1 + offset,
            strand: PrimerStrand::from_bed(fields.get(5).copied()),
            index: primers.len(),
            read_count: 0,
        });
    }

    Ok(primers)
}
