use std::collections::BTreeSet;
use std::path::Path;

use htcount_core::models::{AnnotationRecord, ReferenceSequence, Strand, StrandUsage};
use htcount_io::{AnnotationReader, HtcountIoError};
use htcount_overlaprs::{GenomicArray, GenomicArrayError, Segment, SegmentIndex};

use crate::config::CounterConfig;
use crate::errors::{CounterError, Result};

///
/// A built, read-only feature index.
///
/// The only way to get one is [`AnnotationIndexBuilder::build`], which fails
/// when no feature was indexed. Holding an `AnnotationIndex` therefore means
/// the index is complete and non-empty. Share it between counters with an
/// [`Arc`](std::sync::Arc).
///
#[derive(Debug, Clone)]
pub struct AnnotationIndex {
    array: GenomicArray<String>,
    strand_usage: StrandUsage,
    genomic_type: String,
    attribute_id: String,
    num_entries: usize,
}

impl AnnotationIndex {
    pub fn array(&self) -> &GenomicArray<String> {
        &self.array
    }

    /// Every feature id known to the index, sorted.
    pub fn feature_ids(&self) -> &BTreeSet<String> {
        self.array.values()
    }

    pub fn num_features(&self) -> usize {
        self.array.values().len()
    }

    /// Number of annotation intervals that went into the index.
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    pub fn is_stranded(&self) -> bool {
        self.array.is_stranded()
    }

    pub fn strand_usage(&self) -> StrandUsage {
        self.strand_usage
    }

    pub fn genomic_type(&self) -> &str {
        &self.genomic_type
    }

    pub fn attribute_id(&self) -> &str {
        &self.attribute_id
    }
}

impl SegmentIndex<String> for AnnotationIndex {
    fn contains_chromosome(&self, chromosome: &str) -> bool {
        self.array.contains_chromosome(chromosome)
    }

    fn get_entries(
        &self,
        chromosome: &str,
        start: u32,
        end: u32,
    ) -> std::result::Result<Vec<Segment<'_, String>>, GenomicArrayError> {
        self.array.get_entries(chromosome, start, end)
    }
}

///
/// Fills a [`GenomicArray`] from annotation records.
///
/// Only records whose type equals the configured genomic type are used. Their
/// feature id is read from the configured attribute, optionally split on
/// commas (`Parent=tx1,tx2`).
///
pub struct AnnotationIndexBuilder {
    array: GenomicArray<String>,
    strand_usage: StrandUsage,
    genomic_type: String,
    attribute_id: String,
    split_attribute_values: bool,
    num_entries: usize,
}

impl AnnotationIndexBuilder {
    pub fn new(config: &CounterConfig) -> Self {
        Self::with_array(config, GenomicArray::new(config.strand_usage.is_stranded()))
    }

    ///
    /// A builder whose chromosomes are known up front, e.g. from the
    /// `@SQ` lines of an alignment header. Reads on any other chromosome
    /// will then be reported as unknown.
    ///
    pub fn with_reference_sequences(config: &CounterConfig, sequences: &[ReferenceSequence]) -> Self {
        let array = GenomicArray::with_chromosomes(
            sequences.iter().map(|s| (s.name.clone(), s.length)),
            config.strand_usage.is_stranded(),
        );
        Self::with_array(config, array)
    }

    fn with_array(config: &CounterConfig, array: GenomicArray<String>) -> Self {
        AnnotationIndexBuilder {
            array,
            strand_usage: config.strand_usage,
            genomic_type: config.genomic_type.clone(),
            attribute_id: config.attribute_id.clone(),
            split_attribute_values: config.split_attribute_values,
            num_entries: 0,
        }
    }

    ///
    /// Index one record. Returns `false` when the record is of another type
    /// and was skipped.
    ///
    /// # Errors
    /// - the record lacks the feature id attribute
    /// - the record has no strand while reads are counted stranded
    pub fn add_record(&mut self, record: &AnnotationRecord) -> Result<bool> {
        if record.feature_type != self.genomic_type {
            return Ok(false);
        }

        let value = record
            .attributes
            .get(&self.attribute_id)
            .ok_or_else(|| CounterError::MissingAttribute {
                attribute: self.attribute_id.clone(),
                feature_type: record.feature_type.clone(),
                location: format!("{}:{}-{}", record.seqid, record.start, record.end),
            })?;

        let feature_ids: Vec<&str> = match self.split_attribute_values {
            true => record
                .attributes
                .get_list(&self.attribute_id)
                .unwrap_or_default()
                .iter()
                .map(|id| id.trim())
                .filter(|id| !id.is_empty())
                .collect(),
            false => vec![value],
        };

        if self.strand_usage.is_stranded() && record.strand == Strand::Unknown {
            return Err(CounterError::UnstrandedFeature {
                feature_id: value.to_string(),
                feature_type: record.feature_type.clone(),
                strand_usage: self.strand_usage,
            });
        }

        let interval = record.interval().map_err(|source| CounterError::Interval {
            context: format!("feature '{}'", value),
            source,
        })?;

        for feature_id in feature_ids {
            self.array.add_entry(&interval, feature_id.to_string());
        }
        self.num_entries += 1;
        Ok(true)
    }

    /// Index every record of a stream, stopping at the first error.
    pub fn add_records<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = std::result::Result<AnnotationRecord, HtcountIoError>>,
    {
        for record in records {
            self.add_record(&record?)?;
        }
        Ok(())
    }

    /// Freeze the index.
    pub fn build(self) -> Result<AnnotationIndex> {
        if self.array.is_empty() {
            return Err(CounterError::NoFeatures {
                feature_type: self.genomic_type,
                attribute: self.attribute_id,
            });
        }

        log::info!(
            "Index built: {} features from {} '{}' entries on {} chromosomes",
            self.array.values().len(),
            self.num_entries,
            self.genomic_type,
            self.array.chromosomes().len()
        );

        Ok(AnnotationIndex {
            array: self.array,
            strand_usage: self.strand_usage,
            genomic_type: self.genomic_type,
            attribute_id: self.attribute_id,
            num_entries: self.num_entries,
        })
    }
}

///
/// Read a GTF/GFF3 file (plain or gzip) and build its index.
///
/// # Arguments
/// - path: the annotation file, its format is guessed from its name
/// - config: genomic type, attribute id, strand usage and split flag
/// - reference_sequences: when given, restrict the index to these chromosomes
pub fn build_index_from_path(
    path: &Path,
    config: &CounterConfig,
    reference_sequences: Option<&[ReferenceSequence]>,
) -> Result<AnnotationIndex> {
    config.validate()?;
    log::debug!("Reading annotation from {:?}", path);

    let mut builder = match reference_sequences {
        Some(sequences) => AnnotationIndexBuilder::with_reference_sequences(config, sequences),
        None => AnnotationIndexBuilder::new(config),
    };
    builder.add_records(AnnotationReader::from_path(path)?)?;
    builder.build()
}
