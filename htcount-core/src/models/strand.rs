use std::fmt::{self, Display};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::StrandError;

///
/// Strand of a genomic interval. `Unknown` is the `.` of GFF/GTF files.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    pub fn from_char(c: char) -> Result<Self, StrandError> {
        match c {
            '+' => Ok(Strand::Plus),
            '-' => Ok(Strand::Minus),
            '.' => Ok(Strand::Unknown),
            other => Err(StrandError::InvalidStrand(other.to_string())),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
            Strand::Unknown => '.',
        }
    }

    /// `+` becomes `-` and vice versa. `.` stays `.`.
    pub fn flip(&self) -> Self {
        match self {
            Strand::Plus => Strand::Minus,
            Strand::Minus => Strand::Plus,
            Strand::Unknown => Strand::Unknown,
        }
    }
}

impl FromStr for Strand {
    type Err = StrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Strand::from_char(c),
            _ => Err(StrandError::InvalidStrand(s.to_string())),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

///
/// How the strand of a read relates to the strand of the features it may be
/// assigned to.
///
/// - `No`: strand is ignored.
/// - `Yes`: the feature must be on the same strand as the read (mate 2 is flipped).
/// - `Reverse`: the feature must be on the opposite strand of the read.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StrandUsage {
    #[default]
    No,
    Yes,
    Reverse,
}

impl StrandUsage {
    pub fn is_stranded(&self) -> bool {
        !matches!(self, StrandUsage::No)
    }

    pub fn all() -> [StrandUsage; 3] {
        [StrandUsage::No, StrandUsage::Yes, StrandUsage::Reverse]
    }
}

impl FromStr for StrandUsage {
    type Err = StrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "no" => Ok(StrandUsage::No),
            "yes" => Ok(StrandUsage::Yes),
            "reverse" => Ok(StrandUsage::Reverse),
            _ => Err(StrandError::InvalidStrandUsage(s.to_string())),
        }
    }
}

impl Display for StrandUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrandUsage::No => write!(f, "no"),
            StrandUsage::Yes => write!(f, "yes"),
            StrandUsage::Reverse => write!(f, "reverse"),
        }
    }
}
