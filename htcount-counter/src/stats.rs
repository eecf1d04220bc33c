use fxhash::FxHashMap as HashMap;

use crate::consts::{ALIGNMENT_NOT_UNIQUE, AMBIGUOUS, NO_FEATURE, NOT_ALIGNED, TOO_LOW_AQUAL};

///
/// Diagnostic counters of one counting run.
///
/// All counters only ever grow. `eliminated` counts the reads or pairs that
/// did not contribute to any feature count.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountingStats {
    /// Alignment records consumed.
    pub input: u64,
    pub empty: u64,
    pub ambiguous: u64,
    pub not_aligned: u64,
    pub low_qual: u64,
    pub secondary: u64,
    pub supplementary: u64,
    pub non_unique: u64,
    pub missing_mate: u64,
    pub eliminated: u64,
}

impl CountingStats {
    pub fn merge(&mut self, other: &CountingStats) {
        self.input += other.input;
        self.empty += other.empty;
        self.ambiguous += other.ambiguous;
        self.not_aligned += other.not_aligned;
        self.low_qual += other.low_qual;
        self.secondary += other.secondary;
        self.supplementary += other.supplementary;
        self.non_unique += other.non_unique;
        self.missing_mate += other.missing_mate;
        self.eliminated += other.eliminated;
    }

    /// Every counter with its reporting name.
    pub fn entries(&self) -> [(&'static str, u64); 10] {
        [
            ("input", self.input),
            ("empty", self.empty),
            ("ambiguous", self.ambiguous),
            ("not_aligned", self.not_aligned),
            ("low_qual", self.low_qual),
            ("secondary", self.secondary),
            ("supplementary", self.supplementary),
            ("non_unique", self.non_unique),
            ("missing_mate", self.missing_mate),
            ("eliminated", self.eliminated),
        ]
    }

    /// The special rows `htseq-count` appends to its count table.
    pub fn summary_rows(&self) -> [(&'static str, u64); 5] {
        [
            (NO_FEATURE, self.empty),
            (AMBIGUOUS, self.ambiguous),
            (TOO_LOW_AQUAL, self.low_qual),
            (NOT_ALIGNED, self.not_aligned),
            (ALIGNMENT_NOT_UNIQUE, self.non_unique),
        ]
    }
}

/// Receives the diagnostic counters once a run is over.
pub trait CounterSink {
    fn increment(&mut self, name: &str, value: u64);

    fn report(&mut self, stats: &CountingStats) {
        for (name, value) in stats.entries() {
            self.increment(name, value);
        }
    }
}

/// Writes every counter through the `log` facade at info level.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    prefix: String,
}

impl LogSink {
    pub fn new(prefix: impl Into<String>) -> Self {
        LogSink {
            prefix: prefix.into(),
        }
    }
}

impl CounterSink for LogSink {
    fn increment(&mut self, name: &str, value: u64) {
        match self.prefix.is_empty() {
            true => log::info!("{}: {}", name, value),
            false => log::info!("[{}] {}: {}", self.prefix, name, value),
        }
    }
}

impl CounterSink for HashMap<String, u64> {
    fn increment(&mut self, name: &str, value: u64) {
        *self.entry(name.to_string()).or_insert(0) += value;
    }
}
