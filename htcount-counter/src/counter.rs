//! The per-read counting state machine.
//!
//! Records arrive one at a time, grouped by read name. Single-end records are
//! resolved as soon as they arrive; a paired record waits for its mate:
//!
//! - no mate pending: the record becomes the pending mate
//! - pending mate with the same name and the other mate role: the pair is resolved
//! - anything else: the pending mate is an orphan (missing mate) and the new
//!   record takes its place
//!
//! Every read or pair then goes through the same checks, first match wins:
//! not aligned, secondary, supplementary, multi-mapped, low quality. What
//! survives is turned into intervals and resolved against the index.
use std::collections::BTreeSet;
use std::sync::Arc;

use fxhash::FxHashMap as HashMap;
use htcount_core::models::{AlignmentHeader, AlignmentRecord, GenomicInterval, SortOrder};
use htcount_io::HtcountIoError;
use htcount_overlaprs::{GenomicArrayError, OverlapResolver};
use noodles::sam::alignment::record::data::field::Tag;

use crate::config::CounterConfig;
use crate::consts::DIAGNOSTIC_PREFIX;
use crate::errors::{CounterError, Result};
use crate::extractor::IntervalExtractor;
use crate::index_builder::AnnotationIndex;
use crate::outcome::Outcome;
use crate::stats::CountingStats;

/// The records of one read (one record) or pair (two records) and what happened to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub records: Vec<AlignmentRecord>,
    pub outcome: Outcome,
}

impl Assignment {
    ///
    /// Write the outcome on every record as a `Z` typed field, replacing any
    /// existing field with the same tag.
    ///
    /// Outcomes starting with `__` are skipped when `remove_non_assigned` is set.
    /// Removed secondary/supplementary alignments and orphan mates are never tagged.
    ///
    pub fn apply_tag(&mut self, tag: Tag, remove_non_assigned: bool) {
        let Some(value) = self.outcome.tag_value() else {
            return;
        };
        if remove_non_assigned && value.starts_with(DIAGNOSTIC_PREFIX) {
            return;
        }
        for record in self.records.iter_mut() {
            record.set_tag(tag, &value);
        }
    }
}

/// Feature counts and diagnostics of a run (or of several merged runs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountResult {
    pub counts: HashMap<String, u64>,
    pub stats: CountingStats,
}

impl CountResult {
    /// Sum another result into this one.
    pub fn merge(&mut self, other: CountResult) {
        for (feature, count) in other.counts {
            *self.counts.entry(feature).or_insert(0) += count;
        }
        self.stats.merge(&other.stats);
    }

    ///
    /// Make sure every feature of the index has a row, with a count of 0 for
    /// features no read was assigned to.
    ///
    pub fn add_zero_count_features(&mut self, index: &AnnotationIndex) {
        for feature in index.feature_ids() {
            if !self.counts.contains_key(feature) {
                self.counts.insert(feature.clone(), 0);
            }
        }
    }

    pub fn get(&self, feature: &str) -> Option<u64> {
        self.counts.get(feature).copied()
    }

    /// Counts sorted by feature id.
    pub fn sorted_counts(&self) -> Vec<(&str, u64)> {
        let mut counts: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(feature, count)| (feature.as_str(), *count))
            .collect();
        counts.sort_unstable_by(|a, b| a.0.cmp(b.0));
        counts
    }
}

///
/// Counts reads of one alignment stream against a shared index.
///
/// A counter owns all of its state; run one counter per stream (or shard) and
/// [`CountResult::merge`] the results.
///
pub struct ReadCounter {
    index: Arc<AnnotationIndex>,
    config: CounterConfig,
    extractor: IntervalExtractor,
    resolver: OverlapResolver,
    sort_order: SortOrder,
    checked_sort_order: bool,
    pending: Option<AlignmentRecord>,
    intervals: Vec<GenomicInterval>,
    result: CountResult,
}

impl ReadCounter {
    pub fn new(index: Arc<AnnotationIndex>, config: CounterConfig) -> Result<Self> {
        config.validate()?;
        if index.is_stranded() != config.strand_usage.is_stranded() {
            return Err(CounterError::IndexMismatch {
                strand_usage: config.strand_usage,
            });
        }

        Ok(ReadCounter {
            extractor: IntervalExtractor::new(config.strand_usage),
            resolver: OverlapResolver::new(config.overlap_mode, config.strand_usage),
            index,
            config,
            sort_order: SortOrder::Unknown,
            checked_sort_order: false,
            pending: None,
            intervals: Vec::new(),
            result: CountResult::default(),
        })
    }

    /// Take the sort order declared by the alignment header into account.
    pub fn with_header(mut self, header: &AlignmentHeader) -> Self {
        self.sort_order = header.sort_order;
        self
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    pub fn stats(&self) -> &CountingStats {
        &self.result.stats
    }

    ///
    /// Feed one record.
    ///
    /// Returns the reads or pairs this record completed: usually zero or one,
    /// two when it also turned a pending mate into an orphan.
    ///
    /// # Errors
    /// - paired records in a coordinate-sorted stream
    /// - a malformed `NH` field or an aligned record at position 0
    pub fn push(&mut self, record: AlignmentRecord) -> Result<Vec<Assignment>> {
        self.result.stats.input += 1;

        if !record.is_paired() {
            let mut done = Vec::with_capacity(2);
            if let Some(orphan) = self.pending.take() {
                done.push(self.orphan(orphan));
            }
            done.push(self.process(vec![record])?);
            return Ok(done);
        }

        if !self.checked_sort_order {
            self.checked_sort_order = true;
            if self.sort_order == SortOrder::Coordinate {
                return Err(CounterError::CoordinateSortedPairedInput);
            }
        }

        match self.pending.take() {
            None => {
                self.pending = Some(record);
                Ok(Vec::new())
            }
            Some(mate)
                if mate.name() == record.name()
                    && mate.is_first_of_pair() != record.is_first_of_pair() =>
            {
                let pair = match mate.is_first_of_pair() {
                    true => vec![mate, record],
                    false => vec![record, mate],
                };
                Ok(vec![self.process(pair)?])
            }
            Some(orphan) => {
                self.pending = Some(record);
                Ok(vec![self.orphan(orphan)])
            }
        }
    }

    /// Give up on a mate still waiting for its partner.
    pub fn flush(&mut self) -> Option<Assignment> {
        let orphan = self.pending.take()?;
        log::warn!("Read {} has no mate at the end of the input", orphan.name());
        Some(self.orphan(orphan))
    }

    /// Close the run and hand back the counts.
    pub fn finish(mut self) -> CountResult {
        self.flush();
        self.result
    }

    /// Count a whole stream.
    pub fn count<I>(self, records: I) -> Result<CountResult>
    where
        I: IntoIterator<Item = std::result::Result<AlignmentRecord, HtcountIoError>>,
    {
        self.count_with(records, |_| Ok(()))
    }

    ///
    /// Count a whole stream, handing every completed read or pair to
    /// `on_assignment` (to write tagged records, report progress...).
    ///
    pub fn count_with<I, F>(mut self, records: I, mut on_assignment: F) -> Result<CountResult>
    where
        I: IntoIterator<Item = std::result::Result<AlignmentRecord, HtcountIoError>>,
        F: FnMut(Assignment) -> Result<()>,
    {
        for record in records {
            for assignment in self.push(record?)? {
                on_assignment(assignment)?;
            }
        }
        if let Some(assignment) = self.flush() {
            on_assignment(assignment)?;
        }
        Ok(self.finish())
    }

    fn orphan(&mut self, record: AlignmentRecord) -> Assignment {
        log::debug!("Mate of read {} is missing", record.name());
        self.result.stats.missing_mate += 1;
        self.result.stats.eliminated += 1;
        Assignment {
            records: vec![record],
            outcome: Outcome::MissingMate,
        }
    }

    fn process(&mut self, records: Vec<AlignmentRecord>) -> Result<Assignment> {
        let outcome = self.classify(&records)?;
        Ok(Assignment { records, outcome })
    }

    fn classify(&mut self, records: &[AlignmentRecord]) -> Result<Outcome> {
        let stats = &mut self.result.stats;
        let aligned: Vec<&AlignmentRecord> = records.iter().filter(|r| !r.is_unmapped()).collect();

        if aligned.is_empty() {
            stats.not_aligned += 1;
            stats.eliminated += 1;
            return Ok(Outcome::NotAligned);
        }

        if self.config.remove_secondary_alignments && records.iter().any(|r| r.is_secondary()) {
            stats.secondary += 1;
            stats.eliminated += 1;
            return Ok(Outcome::Secondary);
        }

        if self.config.remove_supplementary_alignments
            && records.iter().any(|r| r.is_supplementary())
        {
            stats.supplementary += 1;
            stats.eliminated += 1;
            return Ok(Outcome::Supplementary);
        }

        let mut multi_mapped = false;
        for record in aligned.iter() {
            multi_mapped |= record
                .is_multi_mapped()
                .map_err(|source| CounterError::Attribute {
                    read: record.name().to_string(),
                    source,
                })?;
        }
        if multi_mapped {
            stats.non_unique += 1;
            if self.config.remove_non_unique_alignments {
                stats.eliminated += 1;
                return Ok(Outcome::NotUnique);
            }
        }

        let min_quality = self.config.minimum_alignment_quality;
        if aligned.iter().any(|r| u32::from(r.mapq()) < min_quality) {
            stats.low_qual += 1;
            stats.eliminated += 1;
            return Ok(Outcome::LowQuality);
        }

        self.intervals.clear();
        for record in aligned.iter() {
            self.extractor
                .extract_into(record, &mut self.intervals)
                .map_err(|source| CounterError::Interval {
                    context: format!("read '{}'", record.name()),
                    source,
                })?;
        }

        let mut features: BTreeSet<String> = match self
            .resolver
            .resolve(&self.intervals, self.index.as_ref())
        {
            Ok(features) => features,
            Err(GenomicArrayError::UnknownChromosome(chromosome)) => {
                log::debug!(
                    "Read {} aligned to {}, which has no annotation",
                    records[0].name(),
                    chromosome
                );
                BTreeSet::new()
            }
        };

        let stats = &mut self.result.stats;
        if features.len() < 2 {
            let Some(feature) = features.pop_first() else {
                stats.empty += 1;
                stats.eliminated += 1;
                return Ok(Outcome::NoFeature);
            };
            *self.result.counts.entry(feature.clone()).or_insert(0) += 1;
            return Ok(Outcome::Feature(feature));
        }

        stats.ambiguous += 1;
        if self.config.remove_ambiguous_cases {
            stats.eliminated += 1;
        } else {
            for feature in features.iter() {
                *self.result.counts.entry(feature.clone()).or_insert(0) += 1;
            }
        }
        Ok(Outcome::Ambiguous(features.into_iter().collect()))
    }
}
