pub mod alignment;
pub mod annotation;
pub mod attributes;
pub mod interval;
pub mod strand;

// re-export for cleaner imports
pub use self::alignment::{
    AlignmentHeader, AlignmentRecord, MAPQ_UNAVAILABLE, ReferenceSequence, SortOrder, parse_tag,
};
pub use self::annotation::AnnotationRecord;
pub use self::attributes::{Attribute, Attributes};
pub use self::interval::GenomicInterval;
pub use self::strand::{Strand, StrandUsage};
