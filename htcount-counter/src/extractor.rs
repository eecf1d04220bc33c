use htcount_core::errors::IntervalError;
use htcount_core::models::{AlignmentRecord, GenomicInterval, Strand, StrandUsage};
use noodles::sam::alignment::record::cigar::Op;
use noodles::sam::alignment::record::cigar::op::Kind;

///
/// The reference stretches `[start, end]` (1-based, inclusive) covered by the
/// match operations of an alignment starting at `start`.
///
/// Insertions and padding never move the position. Any other operation moves
/// it by its length, except when it comes first: a leading clip (or deletion)
/// is skipped because the alignment start already points at the first aligned
/// base.
///
pub fn match_blocks(start: u32, cigar: &[Op]) -> Vec<(u32, u32)> {
    let mut blocks = Vec::new();
    let mut pos = start;

    for op in cigar {
        let len = u32::try_from(op.len()).unwrap_or(u32::MAX);
        match op.kind() {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                if len > 0 {
                    blocks.push((pos, pos.saturating_add(len - 1)));
                }
                pos = pos.saturating_add(len);
            }
            Kind::Insertion | Kind::Pad => continue,
            _ if pos == start => continue,
            _ => pos = pos.saturating_add(len),
        }
    }
    blocks
}

///
/// Turns one alignment into the intervals used for overlap resolution, with
/// the strand the features must be on.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalExtractor {
    strand_usage: StrandUsage,
}

impl IntervalExtractor {
    pub fn new(strand_usage: StrandUsage) -> Self {
        IntervalExtractor { strand_usage }
    }

    ///
    /// Strand a feature must be on to match this read.
    ///
    /// Mate 2 of a pair is sequenced from the other end of the fragment, so its
    /// strand is flipped to agree with mate 1. `reverse` flips everything.
    ///
    pub fn effective_strand(&self, record: &AlignmentRecord) -> Strand {
        let physical = record.physical_strand();
        let strand = match record.is_paired() && record.is_second_of_pair() {
            true => physical.flip(),
            false => physical,
        };
        match self.strand_usage {
            StrandUsage::No => physical,
            StrandUsage::Yes => strand,
            StrandUsage::Reverse => strand.flip(),
        }
    }

    pub fn extract(&self, record: &AlignmentRecord) -> Result<Vec<GenomicInterval>, IntervalError> {
        let mut intervals = Vec::new();
        self.extract_into(record, &mut intervals)?;
        Ok(intervals)
    }

    /// Append the intervals of `record` to `out`. Unmapped records add nothing.
    pub fn extract_into(
        &self,
        record: &AlignmentRecord,
        out: &mut Vec<GenomicInterval>,
    ) -> Result<(), IntervalError> {
        if record.is_unmapped() {
            return Ok(());
        }
        let strand = self.effective_strand(record);
        for (start, end) in match_blocks(record.start(), record.cigar()) {
            out.push(GenomicInterval::new(
                record.reference(),
                start,
                end,
                strand,
            )?);
        }
        Ok(())
    }
}
