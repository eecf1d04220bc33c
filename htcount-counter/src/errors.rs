use htcount_core::errors::{AttributeError, IntervalError};
use htcount_core::models::StrandUsage;
use htcount_io::HtcountIoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown parameter: '{0}'")]
    UnknownParameter(String),

    #[error("Invalid value for parameter {parameter}: '{value}' ({reason})")]
    InvalidValue {
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("Invalid tag to use: '{0}' (expected two letters matching [X-Z][A-Z])")]
    InvalidTag(String),

    #[error("Parameter {0} must not be empty")]
    EmptyParameter(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum CounterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] HtcountIoError),

    #[error("Missing attribute '{attribute}' on {feature_type} feature at {location}")]
    MissingAttribute {
        attribute: String,
        feature_type: String,
        location: String,
    },

    #[error("No '{feature_type}' feature with a '{attribute}' attribute found in the annotation")]
    NoFeatures {
        feature_type: String,
        attribute: String,
    },

    #[error(
        "Feature '{feature_id}' ({feature_type}) has no strand, which is required with strand usage '{strand_usage}'"
    )]
    UnstrandedFeature {
        feature_id: String,
        feature_type: String,
        strand_usage: StrandUsage,
    },

    #[error(
        "Index strandedness does not match strand usage '{strand_usage}'; rebuild the index with the same configuration"
    )]
    IndexMismatch { strand_usage: StrandUsage },

    #[error(
        "Paired-end alignments are sorted by coordinate; sort them by read name before counting"
    )]
    CoordinateSortedPairedInput,

    #[error("Invalid field on read '{read}': {source}")]
    Attribute {
        read: String,
        #[source]
        source: AttributeError,
    },

    #[error("Invalid interval for {context}: {source}")]
    Interval {
        context: String,
        #[source]
        source: IntervalError,
    },
}

pub type Result<T> = std::result::Result<T, CounterError>;
