use std::io;

use noodles::sam;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::header::record::value::map::header::tag::SORT_ORDER;

use crate::errors::AttributeError;
use crate::models::Strand;

/// `MAPQ` of a record that does not report one.
pub const MAPQ_UNAVAILABLE: u8 = 255;

///
/// Turn a two-letter field name such as `XF` into a tag. Anything else is
/// `None`.
///
pub fn parse_tag(tag: &str) -> Option<Tag> {
    match tag.as_bytes() {
        [a, b] => Some(Tag::new(*a, *b)),
        _ => None,
    }
}

///
/// One alignment of a sequenced read.
///
/// Wraps the `noodles` record with the two things the counter asks for on
/// every read: the read name and the reference sequence name, resolved once
/// against the header.
///
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    name: String,
    reference: String,
    record: RecordBuf,
}

impl AlignmentRecord {
    /// Wrap a record whose reference sequence name is already known.
    pub fn new(reference: impl Into<String>, record: RecordBuf) -> Self {
        let name = record
            .name()
            .map(|name| name.to_string())
            .unwrap_or_else(|| "*".to_string());
        AlignmentRecord {
            name,
            reference: reference.into(),
            record,
        }
    }

    ///
    /// Wrap a record read against `header`.
    ///
    /// # Errors
    /// - the record points at a reference sequence the header does not declare
    pub fn from_record_buf(header: &sam::Header, record: RecordBuf) -> io::Result<Self> {
        let reference = match record.reference_sequence_id() {
            None => "*".to_string(),
            Some(id) => header
                .reference_sequences()
                .get_index(id)
                .map(|(name, _)| name.to_string())
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("reference sequence #{} is not in the header", id),
                    )
                })?,
        };
        Ok(AlignmentRecord::new(reference, record))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference sequence name, `*` when there is none.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn flags(&self) -> Flags {
        self.record.flags()
    }

    /// 1-based alignment start, 0 when unavailable.
    pub fn start(&self) -> u32 {
        self.record
            .alignment_start()
            .map(|position| u32::try_from(position.get()).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }

    pub fn mapq(&self) -> u8 {
        self.record
            .mapping_quality()
            .map(|mapq| mapq.get())
            .unwrap_or(MAPQ_UNAVAILABLE)
    }

    pub fn cigar(&self) -> &[Op] {
        self.record.cigar().as_ref()
    }

    pub fn is_paired(&self) -> bool {
        self.flags().is_segmented()
    }

    pub fn is_first_of_pair(&self) -> bool {
        self.flags().is_first_segment()
    }

    pub fn is_second_of_pair(&self) -> bool {
        self.flags().is_last_segment()
    }

    pub fn is_unmapped(&self) -> bool {
        self.flags().is_unmapped()
    }

    pub fn is_secondary(&self) -> bool {
        self.flags().is_secondary()
    }

    pub fn is_supplementary(&self) -> bool {
        self.flags().is_supplementary()
    }

    /// Strand the read was sequenced on, as reported by the aligner.
    pub fn physical_strand(&self) -> Strand {
        if self.flags().is_reverse_complemented() {
            Strand::Minus
        } else {
            Strand::Plus
        }
    }

    /// Value of the `NH` field, if present.
    pub fn hit_count(&self) -> Result<Option<i64>, AttributeError> {
        match self.record.data().get(&Tag::ALIGNMENT_HIT_COUNT) {
            None => Ok(None),
            Some(value) => value
                .as_int()
                .map(Some)
                .ok_or_else(|| AttributeError::Malformed {
                    key: "NH".to_string(),
                    value: format!("{:?}", value),
                    expected: "integer",
                }),
        }
    }

    pub fn is_multi_mapped(&self) -> Result<bool, AttributeError> {
        Ok(self.hit_count()?.is_some_and(|nh| nh > 1))
    }

    pub fn get_tag(&self, tag: Tag) -> Option<&Value> {
        self.record.data().get(&tag)
    }

    /// Set a `Z` (string) field, replacing any field with the same tag.
    pub fn set_tag(&mut self, tag: Tag, value: &str) {
        self.record
            .data_mut()
            .insert(tag, Value::String(value.into()));
    }

    pub fn record(&self) -> &RecordBuf {
        &self.record
    }

    pub fn into_record_buf(self) -> RecordBuf {
        self.record
    }
}

/// Sort order declared by the `@HD SO:` header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Unknown,
    Unsorted,
    QueryName,
    Coordinate,
}

impl SortOrder {
    pub fn from_bytes(value: &[u8]) -> Self {
        match value {
            b"unsorted" => SortOrder::Unsorted,
            b"queryname" => SortOrder::QueryName,
            b"coordinate" => SortOrder::Coordinate,
            _ => SortOrder::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceSequence {
    pub name: String,
    pub length: u32,
}

///
/// What the counter needs to know about an alignment stream before the first
/// record: its sort order and the reference sequences it was aligned against.
///
/// The `noodles` header is kept as read, so tagged records can be written
/// back under it.
///
#[derive(Debug, Clone, Default)]
pub struct AlignmentHeader {
    pub sort_order: SortOrder,
    pub reference_sequences: Vec<ReferenceSequence>,
    header: sam::Header,
}

impl AlignmentHeader {
    pub fn new(header: sam::Header) -> Self {
        let sort_order = header
            .header()
            .and_then(|hd| hd.other_fields().get(&SORT_ORDER))
            .map(|value| SortOrder::from_bytes(value.as_ref()))
            .unwrap_or_default();

        let reference_sequences = header
            .reference_sequences()
            .iter()
            .map(|(name, sequence)| ReferenceSequence {
                name: name.to_string(),
                length: u32::try_from(sequence.length().get()).unwrap_or(u32::MAX),
            })
            .collect();

        AlignmentHeader {
            sort_order,
            reference_sequences,
            header,
        }
    }

    /// Same header, with the sort order overridden.
    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn sam_header(&self) -> &sam::Header {
        &self.header
    }
}

impl From<sam::Header> for AlignmentHeader {
    fn from(header: sam::Header) -> Self {
        AlignmentHeader::new(header)
    }
}
