use std::io;

use htcount_core::errors::{IntervalError, StrandError};
use thiserror::Error;

/// Error type for htcount-io operations.
///
/// Annotation parse errors carry the 1-based line number of the offending line.
#[derive(Error, Debug)]
pub enum HtcountIoError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Opening or creating a file failed.
    #[error(transparent)]
    Open(#[from] anyhow::Error),

    #[error("Line {line}: expected at least {expected} tab-separated columns, found {found}")]
    MissingColumns {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid {field}: '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: {source}")]
    Interval {
        line: usize,
        #[source]
        source: IntervalError,
    },

    #[error("Line {line}: {source}")]
    Strand {
        line: usize,
        #[source]
        source: StrandError,
    },

    #[error("Line {line}: malformed attribute: '{attribute}'")]
    MalformedAttribute { line: usize, attribute: String },

    /// An alignment record could not be read. `number` counts records, not lines.
    #[error("Alignment record {number}: {source}")]
    Record {
        number: usize,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for htcount-io operations.
pub type Result<T> = std::result::Result<T, HtcountIoError>;
