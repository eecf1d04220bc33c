//! Genomic arrays and overlap resolution for read counting.
//!
//! This crate answers the central question of expression counting: given the
//! intervals one read (or read pair) aligned to, which annotated features does
//! it belong to? It is part of the htcount workspace.
//!
//! ## Features
//!
//! - **Step vectors**: piecewise-constant maps from positions to sets of features,
//!   split and merged on every insertion so that adjacent steps always differ
//! - **Genomic arrays**: one step vector per chromosome and strand, optionally
//!   pre-seeded with a genome description
//! - **Overlap resolution**: `union`, `intersection-strict` and
//!   `intersection-nonempty`, with optional strand filtering
//! - **Thread-safe**: a built [`GenomicArray`] is read-only and can be shared across threads
//!
//! ## Quick Start
//!
//! ```rust
//! use htcount_core::models::{GenomicInterval, Strand, StrandUsage};
//! use htcount_overlaprs::{GenomicArray, OverlapMode, OverlapResolver};
//!
//! // index two overlapping genes
//! let mut genes = GenomicArray::new(false);
//! genes.add_entry(&GenomicInterval::new("chr1", 1000, 2000, Strand::Plus).unwrap(), "BRCA1");
//! genes.add_entry(&GenomicInterval::new("chr1", 1800, 3000, Strand::Plus).unwrap(), "TP53");
//!
//! // a spliced read with one block in each gene
//! let read = vec![
//!     GenomicInterval::new("chr1", 1100, 1150, Strand::Plus).unwrap(),
//!     GenomicInterval::new("chr1", 2500, 2550, Strand::Plus).unwrap(),
//! ];
//!
//! let resolver = OverlapResolver::new(OverlapMode::Union, StrandUsage::No);
//! let features = resolver.resolve(&read, &genes).unwrap();
//! assert_eq!(features.into_iter().collect::<Vec<_>>(), vec!["BRCA1", "TP53"]);
//! ```

/// Genome-wide arrays of feature sets.
///
/// See [`GenomicArray`] for details.
pub mod genomic_array;

/// Read-to-feature overlap resolution.
///
/// See [`OverlapResolver`] for details.
pub mod resolver;

/// Piecewise-constant position to value-set maps.
pub mod step_vector;

/// Core traits for segment lookups.
///
/// See [`SegmentIndex`] for the main trait.
pub mod traits;

// re-exports
pub use self::genomic_array::{GenomicArray, GenomicArrayError, Segment};
pub use self::resolver::{OverlapMode, OverlapResolver, ParseOverlapModeError};
pub use self::step_vector::{Step, StepVector};
pub use self::traits::SegmentIndex;
