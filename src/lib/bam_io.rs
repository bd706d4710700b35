//! BAM readers, writers and the record sink used by the trimmer.
//!
//! # Threading Model
//!
//! BGZF (de)compression can run on worker threads without changing record order:
//!
//! - `threads <= 1`: single-threaded reader/writer (lower overhead for small files)
//! - `threads > 1`: noodles' multi-threaded BGZF reader/writer
//!
//! Region queries go through the indexed reader, which is always single-threaded.

use anyhow::{Context, Result};
use noodles::bam;
use noodles::bgzf::io::{
    MultithreadedReader, MultithreadedWriter, Reader as BgzfReader, Writer as BgzfWriter,
};
use noodles::core::Region;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::num::NonZero;
use std::path::Path;

/// Single- or multi-threaded BGZF reader.
pub enum BgzfReaderEnum {
    /// Single-threaded BGZF reader
    SingleThreaded(BgzfReader<File>),
    /// Multi-threaded BGZF reader
    MultiThreaded(MultithreadedReader<File>),
}

impl Read for BgzfReaderEnum {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.read(buf),
            BgzfReaderEnum::MultiThreaded(r) => r.read(buf),
        }
    }
}

impl BufRead for BgzfReaderEnum {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.fill_buf(),
            BgzfReaderEnum::MultiThreaded(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            BgzfReaderEnum::SingleThreaded(r) => r.consume(amt),
            BgzfReaderEnum::MultiThreaded(r) => r.consume(amt),
        }
    }
}

/// BAM reader over either kind of BGZF reader.
pub type BamReaderAuto = bam::io::Reader<BgzfReaderEnum>;

/// BAM reader that supports region queries through a `.bai` index.
pub type IndexedBamReader = bam::io::IndexedReader<BgzfReader<File>>;

/// Single- or multi-threaded BGZF writer.
pub enum BgzfWriterEnum {
    /// Single-threaded BGZF writer
    SingleThreaded(BgzfWriter<File>),
    /// Multi-threaded BGZF writer
    MultiThreaded(MultithreadedWriter<File>),
}

impl Write for BgzfWriterEnum {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BgzfWriterEnum::SingleThreaded(w) => w.write(buf),
            BgzfWriterEnum::MultiThreaded(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BgzfWriterEnum::SingleThreaded(w) => w.flush(),
            BgzfWriterEnum::MultiThreaded(w) => w.flush(),
        }
    }
}

impl BgzfWriterEnum {
    /// Flushes all pending blocks and writes the BGZF EOF marker.
    ///
    /// # Errors
    /// Returns an error if flushing or finalizing the writer fails.
    pub fn finish(self) -> io::Result<()> {
        match self {
            BgzfWriterEnum::SingleThreaded(mut w) => w.try_finish(),
            BgzfWriterEnum::MultiThreaded(mut w) => w.finish().map(|_| ()),
        }
    }
}

/// BAM writer over either kind of BGZF writer.
pub type BamWriter = bam::io::Writer<BgzfWriterEnum>;

/// Opens a BAM file and reads its header.
///
/// # Errors
/// Returns an error if the file cannot be opened or the header cannot be read
///
/// # Example
/// ```no_run
/// use fgtrim_lib::bam_io::create_bam_reader;
///
/// let (mut reader, header) = create_bam_reader("input.bam", 4).unwrap();
/// for result in reader.record_bufs(&header) {
///     let record = result.unwrap();
/// }
/// ```
pub fn create_bam_reader<P: AsRef<Path>>(
    path: P,
    threads: usize,
) -> Result<(BamReaderAuto, Header)> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open input BAM: {}", path_ref.display()))?;

    let bgzf_reader = match NonZero::new(threads).filter(|n| n.get() > 1) {
        Some(worker_count) => BgzfReaderEnum::MultiThreaded(
            MultithreadedReader::with_worker_count(worker_count, file),
        ),
        None => BgzfReaderEnum::SingleThreaded(BgzfReader::new(file)),
    };

    let mut reader = bam::io::Reader::from(bgzf_reader);
    let header = reader
        .read_header()
        .with_context(|| format!("Failed to read header from: {}", path_ref.display()))?;

    Ok((reader, header))
}

/// Opens an indexed BAM file (`<path>.bai` next to it) and reads its header.
///
/// # Errors
/// Returns an error if the BAM or its index cannot be opened or the header cannot be read
pub fn create_indexed_bam_reader<P: AsRef<Path>>(path: P) -> Result<(IndexedBamReader, Header)> {
    let path_ref = path.as_ref();
    let mut reader = bam::io::indexed_reader::Builder::default()
        .build_from_path(path_ref)
        .with_context(|| format!("Failed to open indexed BAM: {}", path_ref.display()))?;
    let header = reader
        .read_header()
        .with_context(|| format!("Failed to read header from: {}", path_ref.display()))?;
    Ok((reader, header))
}

/// Parses a region such as `chr1`, `chr1:100` or `chr1:100-200` (1-based, inclusive).
///
/// # Errors
/// Returns an error if the region string is malformed
///
/// # Example
/// ```
/// use fgtrim_lib::bam_io::parse_region;
///
/// let region = parse_region("chr1:100-200").unwrap();
/// assert_eq!(region.name(), b"chr1".as_slice());
/// ```
pub fn parse_region(region: &str) -> Result<Region> {
    region.parse().with_context(|| format!("Invalid region: '{region}'"))
}

/// Creates a BAM file and writes the header.
///
/// # Errors
/// Returns an error if the file cannot be created or the header cannot be written
pub fn create_bam_writer<P: AsRef<Path>>(
    path: P,
    header: &Header,
    threads: usize,
) -> Result<BamWriter> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref)
        .with_context(|| format!("Failed to create output BAM: {}", path_ref.display()))?;

    let bgzf_writer = match NonZero::new(threads).filter(|n| n.get() > 1) {
        Some(worker_count) => BgzfWriterEnum::MultiThreaded(
            MultithreadedWriter::with_worker_count(worker_count, file),
        ),
        None => BgzfWriterEnum::SingleThreaded(BgzfWriter::new(file)),
    };

    let mut writer = bam::io::Writer::from(bgzf_writer);
    writer
        .write_header(header)
        .with_context(|| format!("Failed to write header to: {}", path_ref.display()))?;
    Ok(writer)
}

/// Destination for trimmed records.
pub trait RecordSink {
    /// Writes one record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written.
    fn write_record(&mut self, record: &RecordBuf) -> io::Result<()>;
}

impl RecordSink for Vec<RecordBuf> {
    fn write_record(&mut self, record: &RecordBuf) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// A [`RecordSink`] writing BAM.
pub struct BamSink {
    writer: BamWriter,
    header: Header,
}

impl BamSink {
    /// Creates the output BAM and writes `header` to it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or the header cannot be written
    pub fn create<P: AsRef<Path>>(path: P, header: Header, threads: usize) -> Result<Self> {
        let writer = create_bam_writer(path, &header, threads)?;
        Ok(Self { writer, header })
    }

    /// Finishes the BGZF stream.
    ///
    /// # Errors
    /// Returns an error if the final blocks cannot be written.
    pub fn finish(self) -> Result<()> {
        self.writer.into_inner().finish().context("Failed to finish output BAM")
    }
}

impl RecordSink for BamSink {
    fn write_record(&mut self, record: &RecordBuf) -> io::Result<()> {
        self.writer.write_alignment_record(&self.header, record)
    }
}
