use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CounterConfig;
use crate::counter::ReadCounter;
use crate::errors::Result;
use crate::index_builder::AnnotationIndex;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown counter: '{0}'")]
pub struct UnknownCounterKind(pub String);

///
/// The counting algorithms this crate knows about.
///
/// The set is closed: adding a counter means adding a variant here, so every
/// `match` on the kind is checked by the compiler.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CounterKind {
    /// Union/intersection counting with the semantics of `htseq-count`.
    #[default]
    #[serde(rename = "htseq-count")]
    HtseqCount,
}

impl CounterKind {
    pub fn all() -> &'static [CounterKind] {
        &[CounterKind::HtseqCount]
    }

    pub fn name(&self) -> &'static str {
        match self {
            CounterKind::HtseqCount => "htseq-count",
        }
    }

    /// Create a fresh counter of this kind over a built index.
    pub fn counter(&self, index: Arc<AnnotationIndex>, config: CounterConfig) -> Result<ReadCounter> {
        match self {
            CounterKind::HtseqCount => ReadCounter::new(index, config),
        }
    }
}

impl FromStr for CounterKind {
    type Err = UnknownCounterKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        CounterKind::all()
            .iter()
            .find(|kind| kind.name() == name)
            .copied()
            .ok_or_else(|| UnknownCounterKind(s.to_string()))
    }
}

impl Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_registry_round_trip() {
        for kind in CounterKind::all() {
            assert_eq!(kind.name().parse::<CounterKind>(), Ok(*kind));
        }
        assert_eq!("HTSeq-Count".parse::<CounterKind>(), Ok(CounterKind::HtseqCount));
    }

    #[rstest]
    fn test_unknown_counter() {
        assert_eq!(
            "featurecounts".parse::<CounterKind>(),
            Err(UnknownCounterKind("featurecounts".to_string()))
        );
    }
}
