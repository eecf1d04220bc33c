use std::fmt::{self, Display};

use crate::errors::IntervalError;
use crate::models::{Attributes, GenomicInterval, Strand};

///
/// One feature line of a GFF3 or GTF file.
///
/// `start` and `end` are 1-based and inclusive, as in the file.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRecord {
    pub seqid: String,
    pub source: String,
    pub feature_type: String,
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
    pub attributes: Attributes,
}

impl AnnotationRecord {
    ///
    /// Get the genomic interval covered by the feature
    ///
    pub fn interval(&self) -> Result<GenomicInterval, IntervalError> {
        GenomicInterval::new(self.seqid.clone(), self.start, self.end, self.strand)
    }

    pub fn length(&self) -> u32 {
        (self.end + 1).saturating_sub(self.start)
    }
}

impl Display for AnnotationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t.\t{}\t.\t{}",
            self.seqid,
            self.source,
            self.feature_type,
            self.start,
            self.end,
            self.strand,
            self.attributes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_interval_from_record() {
        let mut attributes = Attributes::new();
        attributes.insert("gene_id", "geneA");
        let record = AnnotationRecord {
            seqid: "chr2".to_string(),
            source: "test".to_string(),
            feature_type: "exon".to_string(),
            start: 100,
            end: 200,
            strand: Strand::Minus,
            attributes,
        };

        let interval = record.interval().unwrap();
        assert_eq!(interval.chromosome(), "chr2");
        assert_eq!(interval.start(), 100);
        assert_eq!(interval.end(), 200);
        assert_eq!(interval.strand(), Strand::Minus);
        assert_eq!(record.length(), 101);
    }
}
