use std::cmp::Ordering;
use std::fmt::{self, Display};

use crate::errors::IntervalError;
use crate::models::Strand;

/// A region on a chromosome, from `start` to `end`, both inclusive and 1-based.
///
/// Built once per annotation line or alignment match-block and never mutated,
/// so the fields are only reachable through getters.
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct GenomicInterval {
    chromosome: String,
    start: u32,
    end: u32,
    strand: Strand,
}

impl GenomicInterval {
    pub fn new(
        chromosome: impl Into<String>,
        start: u32,
        end: u32,
        strand: Strand,
    ) -> Result<Self, IntervalError> {
        let chromosome = chromosome.into();
        if chromosome.is_empty() {
            return Err(IntervalError::EmptyChromosome);
        }
        if start < 1 {
            return Err(IntervalError::StartBeforeOne(start));
        }
        if end < start {
            return Err(IntervalError::EndBeforeStart {
                chromosome,
                start,
                end,
            });
        }
        Ok(GenomicInterval {
            chromosome,
            start,
            end,
            strand,
        })
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Number of bases covered.
    #[inline]
    pub fn length(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Number of bases shared with `other`, 0 when on another chromosome.
    #[inline]
    pub fn intersect(&self, other: &GenomicInterval) -> u32 {
        if self.chromosome != other.chromosome {
            return 0;
        }
        std::cmp::min(self.end, other.end)
            .saturating_add(1)
            .saturating_sub(std::cmp::max(self.start, other.start))
    }

    /// Check if the interval overlaps `[start, end]` (inclusive).
    #[inline]
    pub fn overlap(&self, start: u32, end: u32) -> bool {
        self.start <= end && self.end >= start
    }

    pub fn include(&self, position: u32) -> bool {
        self.start <= position && position <= self.end
    }
}

impl Ord for GenomicInterval {
    #[inline]
    fn cmp(&self, other: &GenomicInterval) -> Ordering {
        self.chromosome
            .cmp(&other.chromosome)
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
            .then(self.strand.cmp(&other.strand))
    }
}

impl PartialOrd for GenomicInterval {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for GenomicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}({})",
            self.chromosome, self.start, self.end, self.strand
        )
    }
}
