//! # Input/Output utilities for read counting.
//!
//! This small crate reads the two inputs of a counting run and writes its
//! output: streaming GTF/GFF3 annotation readers, a SAM/BAM alignment reader and a SAM
//! writer built on `noodles`, and the tab-separated count table.
//!
pub mod alignment;
pub mod counts;
pub mod error;
pub mod gff;

// re-expose core types
pub use alignment::*;
pub use counts::*;
pub use error::*;
pub use gff::*;
