//! Core models shared by every htcount crate.
//!
//! - [`models::GenomicInterval`]: an immutable, 1-based inclusive region on a chromosome.
//! - [`models::Strand`] / [`models::StrandUsage`]: strands and how reads relate to them.
//! - [`models::AnnotationRecord`]: one GFF3/GTF feature line.
//! - [`models::AlignmentRecord`]: one read alignment read through `noodles`, with its reference name resolved.
//! - [`models::Attributes`]: a string-keyed bag with typed accessors that fail loudly.
pub mod errors;
pub mod models;
pub mod utils;
