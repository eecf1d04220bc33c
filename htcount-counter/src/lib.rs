//! HTSeq-compatible read counting.
//!
//! Builds a feature index from a GTF/GFF3 annotation, then assigns every read
//! (or read pair) of an alignment stream to the feature it overlaps, keeping
//! the diagnostic counters `htseq-count` reports.
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use htcount_counter::{CounterConfig, ReadCounter, build_index_from_path};
//! use htcount_io::AlignmentReader;
//!
//! let config = CounterConfig::default();
//! let index = Arc::new(build_index_from_path(Path::new("genes.gtf"), &config, None).unwrap());
//!
//! let reader = AlignmentReader::from_path("reads.bam").unwrap();
//! let counter = ReadCounter::new(index, config).unwrap().with_header(reader.header());
//! let result = counter.count(reader).unwrap();
//! println!("{} reads had no feature", result.stats.empty);
//! ```
pub mod config;
pub mod consts;
pub mod counter;
pub mod errors;
pub mod extractor;
pub mod index_builder;
pub mod kinds;
pub mod outcome;
pub mod session;
pub mod stats;

// re-exports
pub use self::config::CounterConfig;
pub use self::counter::{Assignment, CountResult, ReadCounter};
pub use self::errors::{ConfigError, CounterError};
pub use self::extractor::{IntervalExtractor, match_blocks};
pub use self::index_builder::{AnnotationIndex, AnnotationIndexBuilder, build_index_from_path};
pub use self::kinds::CounterKind;
pub use self::outcome::Outcome;
pub use self::session::{CountingSession, IndexKey, check_annotation, count_shards};
pub use self::stats::{CounterSink, CountingStats, LogSink};

#[cfg(test)]
pub(crate) mod test_utils {
    use htcount_core::models::AlignmentRecord;
    use noodles::core::Position;
    use noodles::sam::alignment::RecordBuf;
    use noodles::sam::alignment::record::cigar::Op;
    use noodles::sam::alignment::record::cigar::op::Kind;
    use noodles::sam::alignment::record::data::field::Tag;
    use noodles::sam::alignment::record::{Flags, MappingQuality};
    use noodles::sam::alignment::record_buf::data::field::Value;

    /// An alignment on `chr1`. A `start` of 0 leaves the position unset.
    pub fn read(
        name: &str,
        flags: Flags,
        start: u32,
        cigar: &[(Kind, usize)],
        mapq: u8,
        nh: Option<i32>,
    ) -> AlignmentRecord {
        let mut builder = RecordBuf::builder()
            .set_name(name)
            .set_flags(flags)
            .set_reference_sequence_id(0)
            .set_cigar(cigar.iter().map(|&(kind, len)| Op::new(kind, len)).collect());
        if let Some(position) = Position::new(start as usize) {
            builder = builder.set_alignment_start(position);
        }
        if let Some(mapq) = MappingQuality::new(mapq) {
            builder = builder.set_mapping_quality(mapq);
        }
        if let Some(nh) = nh {
            builder = builder.set_data([(Tag::ALIGNMENT_HIT_COUNT, Value::from(nh))].into_iter().collect());
        }
        AlignmentRecord::new("chr1", builder.build())
    }
}
