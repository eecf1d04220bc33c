/// Default two-letter SAM tag receiving the assignment of each read.
pub const DEFAULT_TAG: &str = "XF";

pub const DEFAULT_GENOMIC_TYPE: &str = "exon";
pub const DEFAULT_ATTRIBUTE_ID: &str = "gene_id";

/// Prefix shared by every outcome that is not a feature id.
pub const DIAGNOSTIC_PREFIX: &str = "__";

pub const NO_FEATURE: &str = "__no_feature";
pub const AMBIGUOUS: &str = "__ambiguous";
pub const TOO_LOW_AQUAL: &str = "__too_low_aQual";
pub const NOT_ALIGNED: &str = "__not_aligned";
pub const ALIGNMENT_NOT_UNIQUE: &str = "__alignment_not_unique";
