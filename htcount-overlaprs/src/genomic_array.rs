//! Genome-wide interval index mapping every position to the set of features covering it.
//!
//! [`GenomicArray`] keeps one [`StepVector`] per chromosome and strand track. A
//! stranded array keeps separate `+` and `-` tracks so that every segment it
//! returns carries the strand of the features inside it; an unstranded array
//! keeps a single strand-less (`.`) track per chromosome.
//!
//! # Examples
//!
//! ```
//! use htcount_core::models::{GenomicInterval, Strand};
//! use htcount_overlaprs::genomic_array::GenomicArray;
//!
//! let mut genes: GenomicArray<String> = GenomicArray::new(false);
//! let exon1 = GenomicInterval::new("chr1", 1000, 2000, Strand::Plus).unwrap();
//! let exon2 = GenomicInterval::new("chr1", 1500, 2500, Strand::Minus).unwrap();
//! genes.add_entry(&exon1, "BRCA1".to_string());
//! genes.add_entry(&exon2, "TP53".to_string());
//!
//! let segments = genes.get_entries("chr1", 1800, 2200).unwrap();
//! assert_eq!(segments.len(), 2);
//! assert_eq!(segments[0].values.len(), 2);
//! ```

use std::collections::BTreeSet;

use fxhash::FxHashMap as HashMap;
use htcount_core::models::{GenomicInterval, Strand};
use thiserror::Error;

use crate::step_vector::StepVector;
use crate::traits::SegmentIndex;

/// Errors that can occur when querying a [`GenomicArray`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenomicArrayError {
    /// The chromosome was never registered in the array.
    #[error("Unknown chromosome: {0}")]
    UnknownChromosome(String),
}

/// A stretch of one chromosome track with the set of values covering all of it.
///
/// Coordinates are 1-based and inclusive, clipped to the query that produced the segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a, T> {
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    pub values: &'a BTreeSet<T>,
}

impl<T> Segment<'_, T> {
    pub fn to_interval(&self, chromosome: &str) -> Option<GenomicInterval> {
        GenomicInterval::new(chromosome, self.start, self.end, self.strand).ok()
    }
}

#[derive(Debug, Clone)]
struct ChromosomeTracks<T>
where
    T: Ord + Clone,
{
    length: u32,
    tracks: Vec<(Strand, StepVector<T>)>,
}

impl<T> ChromosomeTracks<T>
where
    T: Ord + Clone,
{
    fn new(length: u32, stranded: bool) -> Self {
        let strands: &[Strand] = if stranded {
            &[Strand::Plus, Strand::Minus]
        } else {
            &[Strand::Unknown]
        };
        ChromosomeTracks {
            length,
            tracks: strands
                .iter()
                .map(|strand| (*strand, StepVector::new(length)))
                .collect(),
        }
    }

    fn track_mut(&mut self, strand: Strand) -> &mut StepVector<T> {
        let pos = match self.tracks.iter().position(|(s, _)| *s == strand) {
            Some(pos) => pos,
            None => {
                self.tracks.push((strand, StepVector::new(self.length)));
                self.tracks.len() - 1
            }
        };
        &mut self.tracks[pos].1
    }
}

///
/// Per-chromosome segment index ("genomic array of sets").
///
/// Chromosomes are registered lazily by [`GenomicArray::add_entry`], spanning
/// every representable position. An array created with
/// [`GenomicArray::with_chromosomes`] knows its chromosomes and their lengths
/// up front; querying any other chromosome then fails with
/// [`GenomicArrayError::UnknownChromosome`].
///
/// Once built the array is only read, so it can be shared between threads
/// (`GenomicArray<T>: Send + Sync` when `T` is).
///
#[derive(Debug, Clone)]
pub struct GenomicArray<T>
where
    T: Ord + Clone,
{
    chromosomes: HashMap<String, ChromosomeTracks<T>>,
    stranded: bool,
    preseeded: bool,
    values: BTreeSet<T>,
}

impl<T> GenomicArray<T>
where
    T: Ord + Clone,
{
    /// Create an empty array. `stranded` selects separate `+`/`-` tracks.
    pub fn new(stranded: bool) -> Self {
        GenomicArray {
            chromosomes: HashMap::default(),
            stranded,
            preseeded: false,
            values: BTreeSet::new(),
        }
    }

    ///
    /// Create an array pre-seeded with a genome description.
    ///
    /// # Arguments
    /// - chromosomes: `(name, length)` pairs
    /// - stranded: keep separate `+`/`-` tracks
    pub fn with_chromosomes<I, S>(chromosomes: I, stranded: bool) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut array = GenomicArray::new(stranded);
        array.preseeded = true;
        for (name, length) in chromosomes {
            array.add_chromosome(name, length);
        }
        array
    }

    /// Register a chromosome of the given length. Already known chromosomes are left untouched.
    pub fn add_chromosome(&mut self, name: impl Into<String>, length: u32) {
        let stranded = self.stranded;
        self.chromosomes
            .entry(name.into())
            .or_insert_with(|| ChromosomeTracks::new(length, stranded));
    }

    ///
    /// Associate `value` with every position of `interval`.
    ///
    /// Segments already covering part of the interval are split so that each
    /// resulting segment holds the union of its previous values and `value`.
    ///
    pub fn add_entry(&mut self, interval: &GenomicInterval, value: T) {
        let stranded = self.stranded;
        let chromosome = self
            .chromosomes
            .entry(interval.chromosome().to_string())
            .or_insert_with(|| ChromosomeTracks::new(u32::MAX, stranded));

        let strand = if stranded {
            interval.strand()
        } else {
            Strand::Unknown
        };

        chromosome
            .track_mut(strand)
            .add_value(interval.start(), interval.end(), value.clone());
        self.values.insert(value);
    }

    pub fn contains_chromosome(&self, name: &str) -> bool {
        self.chromosomes.contains_key(name)
    }

    ///
    /// All segments of `chromosome` intersecting `[start, end]`, with the set of
    /// values covering each one. Segments holding no value are included.
    ///
    /// An unregistered chromosome yields no segment, or an
    /// [`GenomicArrayError::UnknownChromosome`] error when the array was
    /// pre-seeded with a genome description.
    ///
    pub fn get_entries(
        &self,
        chromosome: &str,
        start: u32,
        end: u32,
    ) -> Result<Vec<Segment<'_, T>>, GenomicArrayError> {
        let Some(tracks) = self.chromosomes.get(chromosome) else {
            return match self.preseeded {
                true => Err(GenomicArrayError::UnknownChromosome(
                    chromosome.to_string(),
                )),
                false => Ok(Vec::new()),
            };
        };

        let mut segments = Vec::new();
        for (strand, track) in tracks.tracks.iter() {
            segments.extend(track.steps_in(start, end).into_iter().map(|step| Segment {
                start: step.start,
                end: step.end,
                strand: *strand,
                values: step.values,
            }));
        }
        Ok(segments)
    }

    /// Every value ever added, in sorted order.
    pub fn values(&self) -> &BTreeSet<T> {
        &self.values
    }

    /// Names of the registered chromosomes, sorted.
    pub fn chromosomes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.chromosomes.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn is_stranded(&self) -> bool {
        self.stranded
    }

    pub fn is_preseeded(&self) -> bool {
        self.preseeded
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> SegmentIndex<T> for GenomicArray<T>
where
    T: Ord + Clone + Send + Sync,
{
    fn contains_chromosome(&self, chromosome: &str) -> bool {
        GenomicArray::contains_chromosome(self, chromosome)
    }

    fn get_entries(
        &self,
        chromosome: &str,
        start: u32,
        end: u32,
    ) -> Result<Vec<Segment<'_, T>>, GenomicArrayError> {
        GenomicArray::get_entries(self, chromosome, start, end)
    }
}
