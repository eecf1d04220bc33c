use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Genomic interval has an empty chromosome name")]
    EmptyChromosome,

    #[error("Genomic interval start must be >= 1, got {0}")]
    StartBeforeOne(u32),

    #[error("Genomic interval end ({end}) is before its start ({start}) on {chromosome}")]
    EndBeforeStart {
        chromosome: String,
        start: u32,
        end: u32,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrandError {
    #[error("Invalid strand: '{0}' (expected '+', '-' or '.')")]
    InvalidStrand(String),

    #[error("Invalid strand usage: '{0}' (expected 'no', 'yes' or 'reverse')")]
    InvalidStrandUsage(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Missing attribute: {0}")]
    Missing(String),

    #[error("Attribute {key} has a malformed {expected} value: '{value}'")]
    Malformed {
        key: String,
        value: String,
        expected: &'static str,
    },
}
