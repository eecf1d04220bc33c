use std::fmt::{self, Display};

use crate::consts::{
    ALIGNMENT_NOT_UNIQUE, AMBIGUOUS, DIAGNOSTIC_PREFIX, NO_FEATURE, NOT_ALIGNED, TOO_LOW_AQUAL,
};

/// What happened to one read (or read pair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Assigned to exactly one feature.
    Feature(String),
    /// Overlaps several features; ids are sorted.
    Ambiguous(Vec<String>),
    NoFeature,
    NotAligned,
    LowQuality,
    /// Removed because the aligner reported more than one hit.
    NotUnique,
    /// Removed secondary alignment.
    Secondary,
    /// Removed supplementary alignment.
    Supplementary,
    /// A paired record whose mate never showed up.
    MissingMate,
}

impl Outcome {
    ///
    /// The value written in the alignment tag, or `None` for outcomes that
    /// leave records untagged.
    ///
    pub fn tag_value(&self) -> Option<String> {
        match self {
            Outcome::Secondary | Outcome::Supplementary | Outcome::MissingMate => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, Outcome::Feature(_))
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Feature(id) => write!(f, "{}", id),
            Outcome::Ambiguous(ids) => write!(f, "{}[{}]", AMBIGUOUS, ids.join("+")),
            Outcome::NoFeature => write!(f, "{}", NO_FEATURE),
            Outcome::NotAligned => write!(f, "{}", NOT_ALIGNED),
            Outcome::LowQuality => write!(f, "{}", TOO_LOW_AQUAL),
            Outcome::NotUnique => write!(f, "{}", ALIGNMENT_NOT_UNIQUE),
            Outcome::Secondary => write!(f, "{}secondary", DIAGNOSTIC_PREFIX),
            Outcome::Supplementary => write!(f, "{}supplementary", DIAGNOSTIC_PREFIX),
            Outcome::MissingMate => write!(f, "{}missing_mate", DIAGNOSTIC_PREFIX),
        }
    }
}
