use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;

use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::io::Write as _;
use noodles::{bam, sam};

use htcount_core::models::{AlignmentHeader, AlignmentRecord};
use htcount_core::utils::{DynamicWriter, get_dynamic_reader_w_stdin, get_dynamic_writer};

use crate::error::{HtcountIoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentFormat {
    /// SAM text, plain or gzip-compressed.
    Sam,
    Bam,
}

impl AlignmentFormat {
    /// `.bam` files are BAM, everything else (stdin included) is SAM.
    pub fn from_path(path: &Path) -> Self {
        match path.extension() == Some(OsStr::new("bam")) {
            true => AlignmentFormat::Bam,
            false => AlignmentFormat::Sam,
        }
    }
}

/// The one thing the reader needs from a `noodles` SAM or BAM reader.
trait RecordSource {
    fn read_record_buf(&mut self, header: &sam::Header, record: &mut RecordBuf) -> io::Result<usize>;
}

impl<R: BufRead> RecordSource for sam::io::Reader<R> {
    fn read_record_buf(&mut self, header: &sam::Header, record: &mut RecordBuf) -> io::Result<usize> {
        sam::io::Reader::read_record_buf(self, header, record)
    }
}

impl<R: Read> RecordSource for bam::io::Reader<R> {
    fn read_record_buf(&mut self, header: &sam::Header, record: &mut RecordBuf) -> io::Result<usize> {
        bam::io::Reader::read_record_buf(self, header, record)
    }
}

///
/// Streaming reader for SAM (plain or gzip) and BAM alignments.
///
/// The header is read when the reader is created; records are then pulled
/// one at a time through the [`Iterator`] implementation.
///
pub struct AlignmentReader {
    source: Box<dyn RecordSource>,
    header: AlignmentHeader,
    records_read: usize,
}

impl AlignmentReader {
    /// Open a `.bam`, `.sam` or `.sam.gz` file, or SAM on stdin when the path is `-`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match AlignmentFormat::from_path(path) {
            AlignmentFormat::Bam => {
                let file = File::open(path)?;
                AlignmentReader::from_bam(file)
            }
            AlignmentFormat::Sam => {
                let reader = get_dynamic_reader_w_stdin(&path.to_string_lossy())?;
                AlignmentReader::from_sam(reader)
            }
        }
    }

    pub fn from_sam<R: BufRead + 'static>(reader: R) -> Result<Self> {
        let mut reader = sam::io::Reader::new(reader);
        let header = reader.read_header()?;
        Ok(AlignmentReader::new(Box::new(reader), header))
    }

    /// `reader` yields the BGZF-compressed bytes of a BAM file.
    pub fn from_bam<R: Read + 'static>(reader: R) -> Result<Self> {
        let mut reader = bam::io::Reader::new(reader);
        let header = reader.read_header()?;
        Ok(AlignmentReader::new(Box::new(reader), header))
    }

    fn new(source: Box<dyn RecordSource>, header: sam::Header) -> Self {
        let header = AlignmentHeader::new(header);
        log::debug!(
            "Alignment header: sort order {:?}, {} reference sequences",
            header.sort_order,
            header.reference_sequences.len()
        );
        AlignmentReader {
            source,
            header,
            records_read: 0,
        }
    }

    pub fn header(&self) -> &AlignmentHeader {
        &self.header
    }
}

impl Iterator for AlignmentReader {
    type Item = Result<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.header.sam_header();
        let mut record = RecordBuf::default();
        let number = self.records_read + 1;

        match self.source.read_record_buf(header, &mut record) {
            Ok(0) => None,
            Ok(_) => {
                self.records_read = number;
                Some(
                    AlignmentRecord::from_record_buf(header, record)
                        .map_err(|source| HtcountIoError::Record { number, source }),
                )
            }
            Err(source) => Some(Err(HtcountIoError::Record { number, source })),
        }
    }
}

///
/// Writes SAM text under the header the records were read with.
///
/// The header is written when the writer is created.
///
pub struct SamWriter<W: Write> {
    writer: sam::io::Writer<W>,
    header: sam::Header,
}

impl SamWriter<DynamicWriter> {
    /// Create a SAM file, gzip-compressed when the name ends with `.gz`. `-` writes to stdout.
    pub fn from_path<P: AsRef<Path>>(path: P, header: &AlignmentHeader) -> Result<Self> {
        SamWriter::new(get_dynamic_writer(path.as_ref())?, header)
    }

    /// Flush everything, gzip trailer included.
    pub fn finish(self) -> Result<()> {
        self.writer.into_inner().finish()?;
        Ok(())
    }
}

impl<W: Write> SamWriter<W> {
    pub fn new(inner: W, header: &AlignmentHeader) -> Result<Self> {
        let mut writer = sam::io::Writer::new(inner);
        writer.write_header(header.sam_header())?;
        Ok(SamWriter {
            writer,
            header: header.sam_header().clone(),
        })
    }

    pub fn write_record(&mut self, record: &AlignmentRecord) -> Result<()> {
        self.writer
            .write_alignment_record(&self.header, record.record())?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use htcount_core::models::{ReferenceSequence, SortOrder, parse_tag};
    use noodles::sam::alignment::record::cigar::Op;
    use noodles::sam::alignment::io::Write as _;
    use noodles::sam::alignment::record::cigar::op::Kind;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn sam_text() -> &'static str {
        "@HD\tVN:1.6\tSO:queryname\n\
         @SQ\tSN:chr1\tLN:5000\n\
         @SQ\tSN:chr2\tLN:3000\n\
         @PG\tID:aligner\n\
         read1\t99\tchr1\t100\t60\t10M200N40M\t=\t400\t350\t*\t*\tNH:i:1\n\
         read1\t147\tchr1\t400\t60\t50M\t=\t100\t-350\t*\t*\tNH:i:1\n\
         read2\t4\t*\t0\t0\t*\t*\t0\t0\t*\t*\n"
    }

    #[rstest]
    #[case("reads.bam", AlignmentFormat::Bam)]
    #[case("reads.sam", AlignmentFormat::Sam)]
    #[case("reads.sam.gz", AlignmentFormat::Sam)]
    #[case("-", AlignmentFormat::Sam)]
    fn test_format_from_path(#[case] name: &str, #[case] expected: AlignmentFormat) {
        assert_eq!(AlignmentFormat::from_path(Path::new(name)), expected);
    }

    #[rstest]
    fn test_read_header(sam_text: &'static str) {
        let reader = AlignmentReader::from_sam(Cursor::new(sam_text)).unwrap();
        let header = reader.header();
        assert_eq!(header.sort_order, SortOrder::QueryName);
        assert_eq!(
            header.reference_sequences,
            vec![
                ReferenceSequence { name: "chr1".to_string(), length: 5000 },
                ReferenceSequence { name: "chr2".to_string(), length: 3000 },
            ]
        );
    }

    #[rstest]
    fn test_read_records(sam_text: &'static str) {
        let reader = AlignmentReader::from_sam(Cursor::new(sam_text)).unwrap();
        let records: Vec<AlignmentRecord> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.name(), "read1");
        assert_eq!(first.reference(), "chr1");
        assert!(first.is_paired() && first.is_first_of_pair());
        assert_eq!(first.start(), 100);
        assert_eq!(
            first.cigar(),
            &[
                Op::new(Kind::Match, 10),
                Op::new(Kind::Skip, 200),
                Op::new(Kind::Match, 40),
            ][..]
        );
        assert_eq!(first.hit_count(), Ok(Some(1)));

        assert!(records[2].is_unmapped());
        assert_eq!(records[2].reference(), "*");
        assert!(records[2].cigar().is_empty());
    }

    #[rstest]
    fn test_undeclared_reference_is_an_error() {
        let text = "@SQ\tSN:chr1\tLN:5000\nr\t0\tchrM\t1\t60\t5M\t*\t0\t0\t*\t*\n";
        let mut reader = AlignmentReader::from_sam(Cursor::new(text)).unwrap();
        assert!(matches!(
            reader.next(),
            Some(Err(HtcountIoError::Record { number: 1, .. }))
        ));
    }

    #[rstest]
    fn test_bad_record_reports_its_number(sam_text: &'static str) {
        let text = format!("{}read3\tx\tchr1\t1\t60\t5M\t*\t0\t0\t*\t*\n", sam_text);
        let results: Vec<Result<AlignmentRecord>> =
            AlignmentReader::from_sam(Cursor::new(text)).unwrap().collect();
        assert_eq!(results.len(), 4);
        let Err(err) = &results[3] else {
            panic!("a flag of 'x' should not parse");
        };
        assert!(err.to_string().starts_with("Alignment record 4: "), "{}", err);
    }

    #[rstest]
    fn test_write_tagged_records(sam_text: &'static str) {
        let reader = AlignmentReader::from_sam(Cursor::new(sam_text)).unwrap();
        let header = reader.header().clone();
        let tag = parse_tag("XF").unwrap();

        let mut writer = SamWriter::new(Vec::new(), &header).unwrap();
        for record in reader {
            let mut record = record.unwrap();
            record.set_tag(tag, "geneA");
            writer.write_record(&record).unwrap();
        }
        let written = String::from_utf8(writer.into_inner()).unwrap();

        assert_eq!(written.lines().filter(|l| l.starts_with('@')).count(), 4);
        let records: Vec<&str> = written.lines().filter(|l| !l.starts_with('@')).collect();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|l| l.ends_with("\tXF:Z:geneA")));
        assert!(records[0].starts_with("read1\t99\tchr1\t100\t60\t10M200N40M\t"));
    }

    #[rstest]
    fn test_write_gz_file(sam_text: &'static str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.sam.gz");

        let reader = AlignmentReader::from_sam(Cursor::new(sam_text)).unwrap();
        let mut writer = SamWriter::from_path(&path, &reader.header().clone()).unwrap();
        for record in reader {
            writer.write_record(&record.unwrap()).unwrap();
        }
        writer.finish().unwrap();

        let reread = AlignmentReader::from_path(&path).unwrap();
        assert_eq!(reread.header().sort_order, SortOrder::QueryName);
        assert_eq!(reread.count(), 3);
    }

    #[rstest]
    fn test_read_bam_file(sam_text: &'static str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.bam");

        let reader = AlignmentReader::from_sam(Cursor::new(sam_text)).unwrap();
        let header = reader.header().sam_header().clone();
        let expected: Vec<AlignmentRecord> = reader.collect::<Result<_>>().unwrap();

        let mut writer = bam::io::Writer::new(File::create(&path).unwrap());
        writer.write_header(&header).unwrap();
        for record in &expected {
            writer.write_alignment_record(&header, record.record()).unwrap();
        }
        writer.try_finish().unwrap();

        let reader = AlignmentReader::from_path(&path).unwrap();
        assert_eq!(reader.header().sort_order, SortOrder::QueryName);
        let records: Vec<AlignmentRecord> = reader.collect::<Result<_>>().unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["read1", "read1", "read2"]);
        assert_eq!(records[0].cigar(), expected[0].cigar());
        assert_eq!(records[1].start(), 400);
    }
}
