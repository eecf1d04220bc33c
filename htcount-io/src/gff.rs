use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use htcount_core::models::{AnnotationRecord, Attributes, GenomicInterval, Strand};
use htcount_core::utils::get_dynamic_reader;

use crate::error::{HtcountIoError, Result};

const FASTA_DIRECTIVE: &str = "##FASTA";
const GFF_COLUMNS: usize = 9;

/// Layout of the attribute column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationFormat {
    /// `key "value"; key "value";`
    Gtf,
    /// `key=value;key=value` with percent-encoded reserved characters
    Gff3,
}

impl AnnotationFormat {
    ///
    /// Guess the format from a file name: `.gtf` and `.gtf.gz` are GTF,
    /// anything else is read as GFF3.
    ///
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        match name.ends_with(".gtf") {
            true => AnnotationFormat::Gtf,
            false => AnnotationFormat::Gff3,
        }
    }
}

///
/// Streaming reader over the feature lines of a GTF or GFF3 file.
///
/// Comment and directive lines are skipped and a `##FASTA` directive ends the
/// stream. Every item is either a parsed [`AnnotationRecord`] or an error
/// naming the line that could not be parsed.
///
pub struct AnnotationReader<R: BufRead> {
    reader: R,
    format: AnnotationFormat,
    line_number: usize,
    buf: String,
    done: bool,
}

impl AnnotationReader<BufReader<Box<dyn Read>>> {
    /// Open a (possibly gzip-compressed) annotation file, guessing the format from its name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = AnnotationFormat::from_path(path);
        Self::from_path_with_format(path, format)
    }

    pub fn from_path_with_format<P: AsRef<Path>>(path: P, format: AnnotationFormat) -> Result<Self> {
        let reader = get_dynamic_reader(path.as_ref())?;
        Ok(AnnotationReader::new(reader, format))
    }
}

impl<R: BufRead> AnnotationReader<R> {
    pub fn new(reader: R, format: AnnotationFormat) -> Self {
        AnnotationReader {
            reader,
            format,
            line_number: 0,
            buf: String::new(),
            done: false,
        }
    }

    pub fn format(&self) -> AnnotationFormat {
        self.format
    }
}

impl<R: BufRead> Iterator for AnnotationReader<R> {
    type Item = Result<AnnotationRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.buf.trim_end_matches(['\n', '\r']);
                    if line.starts_with(FASTA_DIRECTIVE) {
                        log::debug!("{} reached at line {}", FASTA_DIRECTIVE, self.line_number);
                        self.done = true;
                    } else if line.is_empty() || line.starts_with('#') {
                        continue;
                    } else {
                        return Some(parse_annotation_line(line, self.line_number, self.format));
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}

///
/// Parse one feature line.
///
/// # Arguments
/// - line: the line, without its trailing newline
/// - line_number: 1-based, only used in errors
/// - format: layout of the attribute column
pub fn parse_annotation_line(
    line: &str,
    line_number: usize,
    format: AnnotationFormat,
) -> Result<AnnotationRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < GFF_COLUMNS {
        return Err(HtcountIoError::MissingColumns {
            line: line_number,
            expected: GFF_COLUMNS,
            found: fields.len(),
        });
    }

    let parse_position = |field: &'static str, value: &str| {
        value
            .trim()
            .parse::<u32>()
            .map_err(|_| HtcountIoError::InvalidField {
                line: line_number,
                field,
                value: value.to_string(),
            })
    };
    let start = parse_position("start", fields[3])?;
    let end = parse_position("end", fields[4])?;

    // GFF3 uses '?' for features whose strand is relevant but unknown
    let strand = match fields[6].trim() {
        "?" => Strand::Unknown,
        s => s.parse::<Strand>().map_err(|source| HtcountIoError::Strand {
            line: line_number,
            source,
        })?,
    };

    GenomicInterval::new(fields[0], start, end, strand).map_err(|source| {
        HtcountIoError::Interval {
            line: line_number,
            source,
        }
    })?;

    let attributes = match format {
        AnnotationFormat::Gtf => parse_gtf_attributes(fields[8], line_number)?,
        AnnotationFormat::Gff3 => parse_gff3_attributes(fields[8], line_number)?,
    };

    Ok(AnnotationRecord {
        seqid: fields[0].to_string(),
        source: fields[1].to_string(),
        feature_type: fields[2].to_string(),
        start,
        end,
        strand,
        attributes,
    })
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Parse a GTF attribute column. When a key repeats, the first value wins.
pub fn parse_gtf_attributes(column: &str, line_number: usize) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    let column = column.trim();
    if column == "." {
        return Ok(attributes);
    }

    for part in column.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once(char::is_whitespace) else {
            return Err(HtcountIoError::MalformedAttribute {
                line: line_number,
                attribute: part.to_string(),
            });
        };
        if !attributes.contains(key) {
            attributes.insert(key, unquote(value));
        }
    }
    Ok(attributes)
}

///
/// Parse a GFF3 attribute column, percent-decoding keys and values.
///
/// A value is split into its list items on `,` before decoding, so an escaped
/// comma (`%2C`) stays inside its item.
///
pub fn parse_gff3_attributes(column: &str, line_number: usize) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    let column = column.trim();
    if column == "." {
        return Ok(attributes);
    }

    for part in column.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Some((key, value)) = part.split_once('=') else {
            return Err(HtcountIoError::MalformedAttribute {
                line: line_number,
                attribute: part.to_string(),
            });
        };
        let key = percent_decode(key.trim());
        if !attributes.contains(&key) {
            let values = value.trim().split(',').map(percent_decode).collect();
            attributes.insert_list(key, values);
        }
    }
    Ok(attributes)
}

///
/// Decode `%XX` escapes (`%3B` is `;`, `%3D` is `=`, `%2C` is `,` ...).
/// Anything that is not a valid escape is kept as is.
///
pub fn percent_decode(value: &str) -> String {
    if !value.contains('%') {
        return value.to_string();
    }

    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data/counting")
            .join(file_name)
    }

    #[rstest]
    #[case("genes.gtf", AnnotationFormat::Gtf)]
    #[case("genes.GTF.gz", AnnotationFormat::Gtf)]
    #[case("genes.gff3", AnnotationFormat::Gff3)]
    #[case("genes.gff.gz", AnnotationFormat::Gff3)]
    fn test_format_from_path(#[case] name: &str, #[case] expected: AnnotationFormat) {
        assert_eq!(AnnotationFormat::from_path(Path::new(name)), expected);
    }

    #[rstest]
    fn test_parse_gtf_line() {
        let line = "chr1\ttest\texon\t100\t200\t.\t+\t.\tgene_id \"geneA\"; transcript_id \"txA.1\"; tag \"basic\"; tag \"CCDS\";";
        let record = parse_annotation_line(line, 1, AnnotationFormat::Gtf).unwrap();
        assert_eq!(record.seqid, "chr1");
        assert_eq!(record.feature_type, "exon");
        assert_eq!((record.start, record.end), (100, 200));
        assert_eq!(record.strand, Strand::Plus);
        assert_eq!(record.attributes.get("gene_id"), Some("geneA"));
        assert_eq!(record.attributes.get("transcript_id"), Some("txA.1"));
        assert_eq!(record.attributes.get("tag"), Some("basic"));
    }

    #[rstest]
    fn test_parse_gff3_line() {
        let line = "chr2\ttest\texon\t5\t50\t.\t-\t.\tID=exon1;Parent=tx1,tx2;Note=a%3Bb%3Dc%2Cd";
        let record = parse_annotation_line(line, 7, AnnotationFormat::Gff3).unwrap();
        assert_eq!(record.strand, Strand::Minus);
        assert_eq!(record.attributes.get("Parent"), Some("tx1,tx2"));
        assert_eq!(record.attributes.get("Note"), Some("a;b=c,d"));
        assert_eq!(
            record.attributes.get_list("Parent"),
            Some(&["tx1".to_string(), "tx2".to_string()][..])
        );
    }

    #[rstest]
    fn test_escaped_comma_stays_in_its_item() {
        let line = "chr2\ttest\texon\t5\t50\t.\t-\t.\tParent=tx%2Cweird,tx2";
        let record = parse_annotation_line(line, 7, AnnotationFormat::Gff3).unwrap();
        assert_eq!(record.attributes.get("Parent"), Some("tx,weird,tx2"));
        assert_eq!(
            record.attributes.get_list("Parent"),
            Some(&["tx,weird".to_string(), "tx2".to_string()][..])
        );
    }

    #[rstest]
    #[case("chr1\ttest\texon\t100\t200\t.\t+\t.", "expected at least 9")]
    #[case("chr1\ttest\texon\tabc\t200\t.\t+\t.\tgene_id \"a\";", "invalid start")]
    #[case("chr1\ttest\texon\t300\t200\t.\t+\t.\tgene_id \"a\";", "before its start")]
    #[case("chr1\ttest\texon\t100\t200\t.\t*\t.\tgene_id \"a\";", "Invalid strand")]
    #[case("chr1\ttest\texon\t100\t200\t.\t+\t.\tgene_id;", "malformed attribute")]
    fn test_parse_bad_gtf_line(#[case] line: &str, #[case] message: &str) {
        let err = parse_annotation_line(line, 12, AnnotationFormat::Gtf).unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.starts_with("Line 12: "), "{}", rendered);
        assert!(rendered.contains(message), "{}", rendered);
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case("100%25", "100%")]
    #[case("tab%09here", "tab\there")]
    #[case("broken%2", "broken%2")]
    #[case("%zz", "%zz")]
    fn test_percent_decode(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(percent_decode(input), expected);
    }

    #[rstest]
    fn test_reader_skips_comments_and_stops_at_fasta() {
        let content = "##gff-version 3\n\
            # a comment\n\
            chr1\tt\tgene\t1\t1000\t.\t+\t.\tID=geneA\n\
            \n\
            chr1\tt\texon\t10\t100\t.\t+\t.\tParent=geneA\n\
            ###\n\
            ##FASTA\n\
            >chr1\n\
            ACGT\n";
        let reader = AnnotationReader::new(Cursor::new(content), AnnotationFormat::Gff3);
        let records: Vec<AnnotationRecord> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].attributes.get("Parent"), Some("geneA"));
    }

    #[rstest]
    fn test_reader_reports_line_number() {
        let content = "# header\nchr1\tt\texon\t10\t100\t.\t+\t.\tgene_id \"a\";\nchr1\tt\texon\n";
        let mut reader = AnnotationReader::new(Cursor::new(content), AnnotationFormat::Gtf);
        assert!(reader.next().unwrap().is_ok());
        match reader.next().unwrap() {
            Err(HtcountIoError::MissingColumns { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[rstest]
    fn test_read_fixture_files() {
        let gtf: Vec<AnnotationRecord> = AnnotationReader::from_path(get_test_path("genes.gtf"))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        let gff: Vec<AnnotationRecord> = AnnotationReader::from_path(get_test_path("genes.gff3"))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert!(!gtf.is_empty());
        assert!(!gff.is_empty());
        assert!(gtf.iter().all(|r| r.attributes.contains("gene_id")));
    }
}
