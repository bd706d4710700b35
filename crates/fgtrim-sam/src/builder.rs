//! Builders for test records and BAM files.
//!
//! [`RecordBuilder`] creates single records with sensible defaults; [`SamBuilder`] owns a
//! coordinate-sorted header, accumulates records and writes them (optionally indexed) to disk.
//!
//! ```rust
//! use fgtrim_sam::builder::{RecordBuilder, SamBuilder};
//!
//! let mut builder = SamBuilder::with_single_ref("chr1", 1000);
//! builder.push_record(
//!     RecordBuilder::mapped_read().name("r1").cigar("50M").alignment_start(101).build(),
//! );
//! assert_eq!(builder.len(), 1);
//! ```

use anyhow::{Context, Result};
use bstr::BString;
use noodles::bam;
use noodles::bam::bai;
use noodles::core::Position;
use noodles::sam::Header;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::{QualityScores, RecordBuf, Sequence};
use noodles::sam::header::record::value::Map;
use noodles::sam::header::record::value::map::header::tag as header_tag;
use noodles::sam::header::record::value::map::{ReadGroup, ReferenceSequence};
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use fgtrim_cigar::{parse_cigar_string, query_length};

pub const DEFAULT_BASE_QUALITY: u8 = 30;
pub const DEFAULT_MAPQ: u8 = 60;
pub const DEFAULT_READ_GROUP_ID: &str = "A";

/// Accumulates records under a coordinate-sorted header and writes them to BAM.
#[derive(Debug)]
pub struct SamBuilder {
    /// SAM header
    pub header: Header,
    records: Vec<RecordBuf>,
}

impl SamBuilder {
    /// Creates a builder whose header has one reference sequence.
    ///
    /// # Panics
    ///
    /// Panics if `ref_length` is zero.
    #[must_use]
    pub fn with_single_ref(ref_name: &str, ref_length: usize) -> Self {
        Self::with_refs(&[(ref_name, ref_length)])
    }

    /// Creates a builder whose header has the given reference sequences, in order.
    ///
    /// # Panics
    ///
    /// Panics if any reference length is zero.
    #[must_use]
    pub fn with_refs(refs: &[(&str, usize)]) -> Self {
        let hd = Map::<noodles::sam::header::record::value::map::Header>::builder()
            .insert(header_tag::SORT_ORDER, BString::from("coordinate"))
            .build()
            .expect("valid header");

        let mut header = Header::builder().set_header(hd);
        for (name, len) in refs {
            let map = Map::<ReferenceSequence>::new(
                NonZeroUsize::new(*len).expect("reference length must be non-zero"),
            );
            header = header.add_reference_sequence(BString::from(*name), map);
        }
        header = header
            .add_read_group(BString::from(DEFAULT_READ_GROUP_ID), Map::<ReadGroup>::default());

        Self { header: header.build(), records: Vec::new() }
    }

    /// The accumulated records.
    #[must_use]
    pub fn records(&self) -> &[RecordBuf] {
        &self.records
    }

    /// Number of accumulated records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no records have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds a record.
    pub fn push_record(&mut self, record: RecordBuf) {
        self.records.push(record);
    }

    /// Orders records by reference and start, unmapped records last.
    pub fn sort_by_coordinate(&mut self) {
        self.records.sort_by_key(|r| {
            (
                r.reference_sequence_id().unwrap_or(usize::MAX),
                r.alignment_start().map_or(usize::MAX, usize::from),
            )
        });
    }

    /// Writes accumulated records to a BAM file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_bam(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create BAM file: {}", path.display()))?;
        let mut writer = bam::io::Writer::new(file);
        writer.write_header(&self.header)?;

        for record in &self.records {
            writer.write_alignment_record(&self.header, record)?;
        }

        writer.try_finish()?;
        Ok(())
    }

    /// Sorts and writes records to a BAM file, then writes a `.bai` index next to it.
    ///
    /// Returns the path of the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the BAM or its index cannot be written.
    pub fn write_indexed_bam(&mut self, path: &Path) -> Result<PathBuf> {
        self.sort_by_coordinate();
        self.write_bam(path)?;

        let index = bam::fs::index(path)
            .with_context(|| format!("Failed to index BAM file: {}", path.display()))?;
        let index_path = path.with_extension("bam.bai");
        let mut writer = bai::io::Writer::new(File::create(&index_path)?);
        writer.write_index(&index)?;
        Ok(index_path)
    }

    /// Writes to a temporary BAM file and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created or written.
    pub fn to_temp_file(&self) -> Result<NamedTempFile> {
        let temp = NamedTempFile::with_suffix(".bam")?;
        self.write_bam(temp.path())?;
        Ok(temp)
    }
}

/// Builder for a single record.
///
/// Without an explicit CIGAR a record with a sequence gets `{len}M`; without an explicit
/// sequence a record with a CIGAR gets a generated sequence of the CIGAR's query length.
/// Qualities default to [`DEFAULT_BASE_QUALITY`].
#[derive(Debug)]
pub struct RecordBuilder {
    name: Option<Vec<u8>>,
    flags: Flags,
    reference_sequence_id: Option<usize>,
    alignment_start: Option<usize>,
    cigar: Option<String>,
    sequence: Vec<u8>,
    qualities: Vec<u8>,
    template_length: Option<i32>,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            flags: Flags::empty(),
            reference_sequence_id: None,
            alignment_start: None,
            cigar: None,
            sequence: Vec::new(),
            qualities: Vec::new(),
            template_length: None,
        }
    }

    /// A builder for a read mapped to the first reference sequence.
    #[must_use]
    pub fn mapped_read() -> Self {
        Self { reference_sequence_id: Some(0), ..Self::new() }
    }

    /// Sets the read name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.as_bytes().to_vec());
        self
    }

    /// Sets the sequence.
    #[must_use]
    pub fn sequence(mut self, seq: &str) -> Self {
        self.sequence = seq.as_bytes().to_vec();
        self
    }

    /// Sets the raw Phred quality scores.
    #[must_use]
    pub fn qualities(mut self, quals: &[u8]) -> Self {
        self.qualities = quals.to_vec();
        self
    }

    /// Sets the first segment (R1) flag. Implies paired.
    #[must_use]
    pub fn first_segment(mut self, is_first: bool) -> Self {
        self.flags.set(Flags::SEGMENTED, true);
        self.flags.set(Flags::FIRST_SEGMENT, is_first);
        self.flags.set(Flags::LAST_SEGMENT, !is_first);
        self
    }

    /// Sets the unmapped flag.
    #[must_use]
    pub fn unmapped(mut self, unmapped: bool) -> Self {
        self.flags.set(Flags::UNMAPPED, unmapped);
        self
    }

    /// Sets the reverse complement flag.
    #[must_use]
    pub fn reverse_complement(mut self, reverse: bool) -> Self {
        self.flags.set(Flags::REVERSE_COMPLEMENTED, reverse);
        self
    }

    /// Sets the reference sequence ID (0-based).
    #[must_use]
    pub fn reference_sequence_id(mut self, id: usize) -> Self {
        self.reference_sequence_id = Some(id);
        self
    }

    /// Sets the alignment start position (1-based).
    #[must_use]
    pub fn alignment_start(mut self, pos: usize) -> Self {
        self.alignment_start = Some(pos);
        self
    }

    /// Sets the CIGAR string.
    #[must_use]
    pub fn cigar(mut self, cigar: &str) -> Self {
        self.cigar = Some(cigar.to_string());
        self
    }

    /// Sets the template length (insert size).
    #[must_use]
    pub fn template_length(mut self, tlen: i32) -> Self {
        self.template_length = Some(tlen);
        self
    }

    /// Builds the `RecordBuf`.
    ///
    /// # Panics
    ///
    /// Panics on an invalid CIGAR or a zero alignment start.
    #[must_use]
    pub fn build(self) -> RecordBuf {
        let mut record = RecordBuf::default();

        if let Some(name) = self.name {
            *record.name_mut() = Some(name.into());
        }
        *record.flags_mut() = self.flags;
        *record.reference_sequence_id_mut() = self.reference_sequence_id;
        if let Some(pos) = self.alignment_start {
            *record.alignment_start_mut() =
                Some(Position::try_from(pos).expect("alignment_start must be >= 1"));
        }
        if let Some(tlen) = self.template_length {
            *record.template_length_mut() = tlen;
        }
        *record.mapping_quality_mut() = MappingQuality::new(DEFAULT_MAPQ);

        let ops: Vec<Op> = match &self.cigar {
            Some(cigar) => parse_cigar_string(cigar).expect("valid CIGAR"),
            None if self.sequence.is_empty() => Vec::new(),
            None => vec![Op::new(Kind::Match, self.sequence.len())],
        };

        let sequence = if self.sequence.is_empty() {
            b"ACGT".iter().cycle().take(query_length(&ops)).copied().collect()
        } else {
            self.sequence
        };
        let qualities = if self.qualities.is_empty() {
            vec![DEFAULT_BASE_QUALITY; sequence.len()]
        } else {
            self.qualities
        };

        *record.cigar_mut() = ops.into_iter().collect();
        *record.sequence_mut() = Sequence::from(sequence);
        *record.quality_scores_mut() = QualityScores::from(qualities);

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgtrim_cigar::cigar_string;

    #[test]
    fn test_cigar_generates_sequence_and_qualities() {
        let record = RecordBuilder::mapped_read().cigar("5S20M2I").alignment_start(10).build();
        assert_eq!(record.sequence().len(), 27);
        assert_eq!(record.quality_scores().as_ref(), vec![DEFAULT_BASE_QUALITY; 27].as_slice());
        assert_eq!(record.reference_sequence_id(), Some(0));
    }

    #[test]
    fn test_sequence_generates_cigar() {
        let record = RecordBuilder::new().sequence("ACGTA").build();
        assert_eq!(cigar_string(record.cigar().as_ref()), "5M");
    }

    #[test]
    fn test_first_segment_sets_pair_flags() {
        let r2 = RecordBuilder::new().first_segment(false).build();
        assert!(r2.flags().is_segmented());
        assert!(r2.flags().is_last_segment());
        assert!(!r2.flags().is_first_segment());
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        let mut builder = SamBuilder::with_single_ref("chr1", 1000);
        builder.push_record(
            RecordBuilder::mapped_read().name("r1").cigar("30M").alignment_start(5).build(),
        );
        let file = builder.to_temp_file()?;

        let mut reader = bam::io::reader::Builder.build_from_path(file.path())?;
        let header = reader.read_header()?;
        let records: Vec<RecordBuf> = reader.record_bufs(&header).collect::<std::io::Result<_>>()?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].alignment_start().map(usize::from), Some(5));
        Ok(())
    }

    #[test]
    fn test_write_indexed_bam() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("in.bam");
        let mut builder = SamBuilder::with_refs(&[("chr1", 1000), ("chr2", 1000)]);
        builder.push_record(
            RecordBuilder::mapped_read()
                .reference_sequence_id(1)
                .cigar("10M")
                .alignment_start(50)
                .build(),
        );
        builder.push_record(RecordBuilder::mapped_read().cigar("10M").alignment_start(20).build());

        let index_path = builder.write_indexed_bam(&path)?;
        assert!(index_path.exists());
        assert_eq!(builder.records()[0].reference_sequence_id(), Some(0));
        Ok(())
    }
}
