use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

use htcount_core::models::{StrandUsage, parse_tag};
use htcount_overlaprs::OverlapMode;
use noodles::sam::alignment::record::data::field::Tag;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ATTRIBUTE_ID, DEFAULT_GENOMIC_TYPE, DEFAULT_TAG};
use crate::errors::ConfigError;
use crate::kinds::CounterKind;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

///
/// Everything that changes how reads are counted.
///
/// Can be read from a TOML file (kebab-case keys, every key optional):
///
/// ```toml
/// genomic-type = "exon"
/// attribute-id = "gene_id"
/// strand-usage = "reverse"
/// overlap-mode = "intersection-nonempty"
/// minimum-alignment-quality = 10
/// ```
///
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct CounterConfig {
    pub counter: CounterKind,
    pub genomic_type: String,
    pub attribute_id: String,
    pub strand_usage: StrandUsage,
    pub overlap_mode: OverlapMode,
    pub remove_ambiguous_cases: bool,
    pub split_attribute_values: bool,
    pub minimum_alignment_quality: u32,
    pub remove_non_unique_alignments: bool,
    pub remove_secondary_alignments: bool,
    pub remove_supplementary_alignments: bool,
    pub remove_non_assigned_feature_tags: bool,
    pub tag_to_use: String,
}

impl Default for CounterConfig {
    fn default() -> Self {
        CounterConfig {
            counter: CounterKind::default(),
            genomic_type: DEFAULT_GENOMIC_TYPE.to_string(),
            attribute_id: DEFAULT_ATTRIBUTE_ID.to_string(),
            strand_usage: StrandUsage::No,
            overlap_mode: OverlapMode::Union,
            remove_ambiguous_cases: true,
            split_attribute_values: false,
            minimum_alignment_quality: 0,
            remove_non_unique_alignments: true,
            remove_secondary_alignments: false,
            remove_supplementary_alignments: false,
            remove_non_assigned_feature_tags: false,
            tag_to_use: DEFAULT_TAG.to_string(),
        }
    }
}

fn invalid(parameter: &str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(parameter: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(parameter, value, "expected a boolean")),
    }
}

fn parse_value<T>(parameter: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: ToString,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| invalid(parameter, value, e))
}

impl CounterConfig {
    ///
    /// Set one option by name.
    ///
    /// Names are the kebab-case keys of the TOML file; `.` and `_` are
    /// accepted in place of `-`.
    ///
    pub fn set_parameter(&mut self, name: &str, value: &str) -> ConfigResult<()> {
        let key = name.trim().to_lowercase().replace(['.', '_'], "-");
        match key.as_str() {
            "counter" => self.counter = parse_value(name, value)?,
            "genomic-type" => self.genomic_type = value.trim().to_string(),
            "attribute-id" => self.attribute_id = value.trim().to_string(),
            "strand-usage" | "stranded" => self.strand_usage = parse_value(name, value)?,
            "overlap-mode" => self.overlap_mode = parse_value(name, value)?,
            "remove-ambiguous-cases" => self.remove_ambiguous_cases = parse_bool(name, value)?,
            "split-attribute-values" => self.split_attribute_values = parse_bool(name, value)?,
            "minimum-alignment-quality" => {
                self.minimum_alignment_quality = parse_value(name, value)?
            }
            "remove-non-unique-alignments" => {
                self.remove_non_unique_alignments = parse_bool(name, value)?
            }
            "remove-secondary-alignments" => {
                self.remove_secondary_alignments = parse_bool(name, value)?
            }
            "remove-supplementary-alignments" => {
                self.remove_supplementary_alignments = parse_bool(name, value)?
            }
            "remove-non-assigned-feature-tags" => {
                self.remove_non_assigned_feature_tags = parse_bool(name, value)?
            }
            "tag-to-use" => self.tag_to_use = value.trim().to_string(),
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }

    /// Check the options that cannot be checked one at a time.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.genomic_type.trim().is_empty() {
            return Err(ConfigError::EmptyParameter("genomic-type"));
        }
        if self.attribute_id.trim().is_empty() {
            return Err(ConfigError::EmptyParameter("attribute-id"));
        }
        self.output_tag()?;
        Ok(())
    }

    /// The SAM tag receiving the assignment of each read.
    pub fn output_tag(&self) -> ConfigResult<Tag> {
        match parse_tag(&self.tag_to_use) {
            Some(tag) if is_valid_tag(&self.tag_to_use) => Ok(tag),
            _ => Err(ConfigError::InvalidTag(self.tag_to_use.clone())),
        }
    }
}

/// Two uppercase letters, the first in `X..=Z` (the SAM range reserved for end users).
fn is_valid_tag(tag: &str) -> bool {
    let bytes = tag.as_bytes();
    bytes.len() == 2 && (b'X'..=b'Z').contains(&bytes[0]) && bytes[1].is_ascii_uppercase()
}

impl TryFrom<&Path> for CounterConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config: CounterConfig = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
