//! Turn the intervals of one read (or read pair) into the set of features it belongs to.
//!
//! Three overlap modes are supported, with the semantics of `htseq-count`:
//!
//! - [`OverlapMode::Union`]: every feature touched by any segment of any interval.
//! - [`OverlapMode::IntersectionStrict`]: features covering every segment of every interval.
//! - [`OverlapMode::IntersectionNonempty`]: like strict, but segments holding no
//!   feature at all are ignored.
//!
//! For the same read, `Union ⊇ IntersectionNonempty ⊇ IntersectionStrict`.
//!
//! # Examples
//!
//! ```
//! use htcount_core::models::{GenomicInterval, Strand, StrandUsage};
//! use htcount_overlaprs::{GenomicArray, OverlapMode, OverlapResolver};
//!
//! let mut genes = GenomicArray::new(false);
//! genes.add_entry(&GenomicInterval::new("chr1", 100, 200, Strand::Plus).unwrap(), "geneA");
//! genes.add_entry(&GenomicInterval::new("chr1", 150, 300, Strand::Plus).unwrap(), "geneB");
//!
//! let read = vec![GenomicInterval::new("chr1", 120, 170, Strand::Plus).unwrap()];
//!
//! let union = OverlapResolver::new(OverlapMode::Union, StrandUsage::No);
//! assert_eq!(union.resolve(&read, &genes).unwrap().len(), 2);
//!
//! let strict = OverlapResolver::new(OverlapMode::IntersectionStrict, StrandUsage::No);
//! assert!(strict.resolve(&read, &genes).unwrap().is_empty());
//! ```
use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::str::FromStr;

use htcount_core::models::{GenomicInterval, StrandUsage};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::genomic_array::GenomicArrayError;
use crate::traits::SegmentIndex;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "Invalid overlap mode: '{0}' (expected 'union', 'intersection-strict' or 'intersection-nonempty')"
)]
pub struct ParseOverlapModeError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OverlapMode {
    #[default]
    Union,
    IntersectionStrict,
    IntersectionNonempty,
}

impl OverlapMode {
    pub fn all() -> [OverlapMode; 3] {
        [
            OverlapMode::Union,
            OverlapMode::IntersectionStrict,
            OverlapMode::IntersectionNonempty,
        ]
    }
}

impl FromStr for OverlapMode {
    type Err = ParseOverlapModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "union" => Ok(OverlapMode::Union),
            "intersection-strict" => Ok(OverlapMode::IntersectionStrict),
            "intersection-nonempty" => Ok(OverlapMode::IntersectionNonempty),
            _ => Err(ParseOverlapModeError(s.to_string())),
        }
    }
}

impl Display for OverlapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlapMode::Union => write!(f, "union"),
            OverlapMode::IntersectionStrict => write!(f, "intersection-strict"),
            OverlapMode::IntersectionNonempty => write!(f, "intersection-nonempty"),
        }
    }
}

///
/// Resolves read intervals against a [`SegmentIndex`] under one overlap mode
/// and one strand usage.
///
/// The resolver holds no per-read state: [`OverlapResolver::resolve`] hands
/// back a fresh set on every call and one resolver can serve any number of
/// threads.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapResolver {
    mode: OverlapMode,
    strand_usage: StrandUsage,
}

impl OverlapResolver {
    pub fn new(mode: OverlapMode, strand_usage: StrandUsage) -> Self {
        OverlapResolver { mode, strand_usage }
    }

    pub fn mode(&self) -> OverlapMode {
        self.mode
    }

    pub fn strand_usage(&self) -> StrandUsage {
        self.strand_usage
    }

    ///
    /// Compute the features the intervals belong to. The returned set is sorted.
    ///
    /// # Errors
    /// [`GenomicArrayError::UnknownChromosome`] if any interval lies on a
    /// chromosome the index does not know. Nothing is resolved in that case.
    ///
    pub fn resolve<T, I>(
        &self,
        intervals: &[GenomicInterval],
        index: &I,
    ) -> Result<BTreeSet<T>, GenomicArrayError>
    where
        T: Ord + Clone + Send + Sync,
        I: SegmentIndex<T> + ?Sized,
    {
        let mut features = BTreeSet::new();
        self.resolve_into(intervals, index, &mut features)?;
        Ok(features)
    }

    ///
    /// Same as [`OverlapResolver::resolve`] but writes into a caller-owned
    /// buffer, which is cleared first. Useful in tight loops to avoid one
    /// allocation per read; the buffer must not be shared between threads.
    ///
    pub fn resolve_into<T, I>(
        &self,
        intervals: &[GenomicInterval],
        index: &I,
        out: &mut BTreeSet<T>,
    ) -> Result<(), GenomicArrayError>
    where
        T: Ord + Clone + Send + Sync,
        I: SegmentIndex<T> + ?Sized,
    {
        out.clear();
        let stranded = self.strand_usage.is_stranded();
        let mut intersection: Option<BTreeSet<T>> = None;

        for interval in intervals {
            if !index.contains_chromosome(interval.chromosome()) {
                return Err(GenomicArrayError::UnknownChromosome(
                    interval.chromosome().to_string(),
                ));
            }

            let segments = index.get_entries(interval.chromosome(), interval.start(), interval.end())?;
            let mut seen_segment = false;

            for segment in segments
                .iter()
                .filter(|s| !stranded || s.strand == interval.strand())
            {
                seen_segment = true;
                match self.mode {
                    OverlapMode::Union => out.extend(segment.values.iter().cloned()),
                    OverlapMode::IntersectionStrict => intersect(&mut intersection, segment.values),
                    OverlapMode::IntersectionNonempty => {
                        if !segment.values.is_empty() {
                            intersect(&mut intersection, segment.values)
                        }
                    }
                }
            }

            // an interval nothing was indexed for still constrains the intersection
            if !seen_segment && self.mode != OverlapMode::Union {
                intersect(&mut intersection, &BTreeSet::new());
            }
        }

        if let Some(features) = intersection {
            out.extend(features);
        }
        Ok(())
    }
}

fn intersect<T: Ord + Clone>(acc: &mut Option<BTreeSet<T>>, values: &BTreeSet<T>) {
    match acc {
        None => *acc = Some(values.clone()),
        Some(acc) => acc.retain(|v| values.contains(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GenomicArray;

    use htcount_core::models::Strand;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn iv(chr: &str, start: u32, end: u32, strand: Strand) -> GenomicInterval {
        GenomicInterval::new(chr, start, end, strand).unwrap()
    }

    fn ids(set: BTreeSet<&'static str>) -> Vec<&'static str> {
        set.into_iter().collect()
    }

    ///
    /// chr1:  geneA 100-200(+), geneB 150-300(+), geneC 500-600(-)
    ///
    fn build(stranded: bool) -> GenomicArray<&'static str> {
        let mut array = GenomicArray::new(stranded);
        array.add_entry(&iv("chr1", 100, 200, Strand::Plus), "geneA");
        array.add_entry(&iv("chr1", 150, 300, Strand::Plus), "geneB");
        array.add_entry(&iv("chr1", 500, 600, Strand::Minus), "geneC");
        array
    }

    #[fixture]
    fn unstranded() -> GenomicArray<&'static str> {
        build(false)
    }

    #[fixture]
    fn stranded() -> GenomicArray<&'static str> {
        build(true)
    }

    #[rstest]
    #[case(OverlapMode::Union, vec![iv("chr1", 160, 180, Strand::Plus)], vec!["geneA", "geneB"])]
    #[case(OverlapMode::IntersectionStrict, vec![iv("chr1", 160, 180, Strand::Plus)], vec!["geneA", "geneB"])]
    #[case(OverlapMode::IntersectionNonempty, vec![iv("chr1", 160, 180, Strand::Plus)], vec!["geneA", "geneB"])]
    // read hanging off the end of geneA into geneB only territory
    #[case(OverlapMode::Union, vec![iv("chr1", 190, 250, Strand::Plus)], vec!["geneA", "geneB"])]
    #[case(OverlapMode::IntersectionStrict, vec![iv("chr1", 190, 250, Strand::Plus)], vec!["geneB"])]
    #[case(OverlapMode::IntersectionNonempty, vec![iv("chr1", 190, 250, Strand::Plus)], vec!["geneB"])]
    // read hanging into an unannotated region
    #[case(OverlapMode::Union, vec![iv("chr1", 280, 320, Strand::Plus)], vec!["geneB"])]
    #[case(OverlapMode::IntersectionStrict, vec![iv("chr1", 280, 320, Strand::Plus)], vec![])]
    #[case(OverlapMode::IntersectionNonempty, vec![iv("chr1", 280, 320, Strand::Plus)], vec!["geneB"])]
    // spliced read: one block in geneA only, one block in geneB only
    #[case(OverlapMode::Union, vec![iv("chr1", 110, 120, Strand::Plus), iv("chr1", 250, 260, Strand::Plus)], vec!["geneA", "geneB"])]
    #[case(OverlapMode::IntersectionNonempty, vec![iv("chr1", 110, 120, Strand::Plus), iv("chr1", 250, 260, Strand::Plus)], vec![])]
    // no interval at all
    #[case(OverlapMode::Union, vec![], vec![])]
    #[case(OverlapMode::IntersectionStrict, vec![], vec![])]
    fn test_overlap_modes(
        unstranded: GenomicArray<&'static str>,
        #[case] mode: OverlapMode,
        #[case] intervals: Vec<GenomicInterval>,
        #[case] expected: Vec<&'static str>,
    ) {
        let resolver = OverlapResolver::new(mode, StrandUsage::No);
        assert_eq!(ids(resolver.resolve(&intervals, &unstranded).unwrap()), expected);
    }

    #[rstest]
    #[case(vec![iv("chr1", 150, 250, Strand::Plus)])]
    #[case(vec![iv("chr1", 90, 110, Strand::Plus), iv("chr1", 290, 510, Strand::Plus)])]
    #[case(vec![iv("chr1", 120, 130, Strand::Plus), iv("chr1", 160, 170, Strand::Plus)])]
    #[case(vec![iv("chr1", 700, 800, Strand::Plus)])]
    fn test_overlap_mode_monotonicity(
        unstranded: GenomicArray<&'static str>,
        #[case] intervals: Vec<GenomicInterval>,
    ) {
        let resolve = |mode| {
            OverlapResolver::new(mode, StrandUsage::No)
                .resolve(&intervals, &unstranded)
                .unwrap()
        };
        let union = resolve(OverlapMode::Union);
        let nonempty = resolve(OverlapMode::IntersectionNonempty);
        let strict = resolve(OverlapMode::IntersectionStrict);

        assert!(union.is_superset(&nonempty));
        assert!(nonempty.is_superset(&strict));
    }

    #[rstest]
    #[case(StrandUsage::Yes)]
    #[case(StrandUsage::Reverse)]
    fn test_strand_filter_excludes_opposite_strand(
        stranded: GenomicArray<&'static str>,
        #[case] strand_usage: StrandUsage,
    ) {
        for mode in OverlapMode::all() {
            let resolver = OverlapResolver::new(mode, strand_usage);

            // geneA and geneB are on +, a - read never sees them
            let minus_read = vec![iv("chr1", 160, 180, Strand::Minus)];
            assert!(resolver.resolve(&minus_read, &stranded).unwrap().is_empty());

            let plus_read = vec![iv("chr1", 160, 180, Strand::Plus)];
            assert_eq!(
                ids(resolver.resolve(&plus_read, &stranded).unwrap()),
                vec!["geneA", "geneB"]
            );

            // geneC is on -
            let plus_read = vec![iv("chr1", 550, 560, Strand::Plus)];
            assert!(resolver.resolve(&plus_read, &stranded).unwrap().is_empty());
        }
    }

    #[rstest]
    fn test_unstranded_ignores_read_strand(unstranded: GenomicArray<&'static str>) {
        let resolver = OverlapResolver::new(OverlapMode::Union, StrandUsage::No);
        let read = vec![iv("chr1", 550, 560, Strand::Plus)];
        assert_eq!(ids(resolver.resolve(&read, &unstranded).unwrap()), vec!["geneC"]);
    }

    #[rstest]
    fn test_unknown_chromosome_aborts_resolve(unstranded: GenomicArray<&'static str>) {
        let resolver = OverlapResolver::new(OverlapMode::Union, StrandUsage::No);
        let read = vec![
            iv("chr1", 160, 180, Strand::Plus),
            iv("chrUn", 1, 50, Strand::Plus),
        ];
        assert_eq!(
            resolver.resolve(&read, &unstranded),
            Err(GenomicArrayError::UnknownChromosome("chrUn".to_string()))
        );
    }

    #[rstest]
    fn test_resolve_into_clears_buffer(unstranded: GenomicArray<&'static str>) {
        let resolver = OverlapResolver::new(OverlapMode::Union, StrandUsage::No);
        let mut buffer = BTreeSet::from(["stale"]);
        resolver
            .resolve_into(&[iv("chr1", 550, 560, Strand::Plus)], &unstranded, &mut buffer)
            .unwrap();
        assert_eq!(ids(buffer), vec!["geneC"]);
    }

    #[rstest]
    #[case("union", OverlapMode::Union)]
    #[case("intersection-strict", OverlapMode::IntersectionStrict)]
    #[case("Intersection-Nonempty", OverlapMode::IntersectionNonempty)]
    fn test_parse_overlap_mode(#[case] input: &str, #[case] expected: OverlapMode) {
        assert_eq!(input.parse::<OverlapMode>().unwrap(), expected);
        assert_eq!(expected.to_string(), input.to_lowercase());
    }

    #[rstest]
    fn test_parse_bad_overlap_mode() {
        assert_eq!(
            "intersection".parse::<OverlapMode>(),
            Err(ParseOverlapModeError("intersection".to_string()))
        );
    }
}
