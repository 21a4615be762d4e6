//! Run parameters for the artefact scan.
//!
//! Every user-facing mode string maps onto one of the enums below through
//! `FromStr`, so the CLI and library callers share the same validation and
//! error wording.

use std::fmt;
use std::str::FromStr;

use crate::align::{AlignMode, Scoring};
use crate::error::ConfigError;

/// Pipeline stages in evaluation order. The similarity stage is always last
/// because it is the only one that is quadratic in sequence length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Taxonomy,
    Quality,
    CoOccurrence,
    Similarity,
}

/// Which flavour of the scan to run. All three share one engine and differ
/// only in the stages they enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// taxonomy + quality + co-occurrence + similarity
    #[default]
    TaxonDependent,
    /// co-occurrence + similarity, taxonomy optional
    TaxonIndependent,
    /// taxonomy + quality, sequences optional
    TaxonMerge,
}

impl Method {
    pub fn stages(self) -> &'static [Stage] {
        match self {
            Method::TaxonDependent => &[Stage::Taxonomy, Stage::Quality, Stage::CoOccurrence, Stage::Similarity],
            Method::TaxonIndependent => &[Stage::CoOccurrence, Stage::Similarity],
            Method::TaxonMerge => &[Stage::Taxonomy, Stage::Quality],
        }
    }

    pub fn uses(self, stage: Stage) -> bool {
        self.stages().contains(&stage)
    }

    pub fn needs_sequences(self) -> bool {
        self.uses(Stage::Similarity)
    }

    pub fn needs_taxonomy(self) -> bool {
        self.uses(Stage::Taxonomy)
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "taxon-dependent" => Ok(Method::TaxonDependent),
            "taxon-independent" => Ok(Method::TaxonIndependent),
            "taxon-merge" => Ok(Method::TaxonMerge),
            other => Err(unknown("method", other, "'taxon-dependent', 'taxon-independent' or 'taxon-merge'")),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::TaxonDependent => "taxon-dependent co-occurrence (default)",
            Method::TaxonIndependent => "taxon-independent co-occurrence",
            Method::TaxonMerge => "taxon-dependent merging",
        };
        f.write_str(s)
    }
}

/// How per-sample counts are compared in the co-occurrence stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OccurrenceMode {
    #[default]
    PresenceAbsence,
    Abundance,
}

impl FromStr for OccurrenceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "presence-absence" => Ok(OccurrenceMode::PresenceAbsence),
            "abundance" => Ok(OccurrenceMode::Abundance),
            other => Err(unknown("occurrence-type", other, "'presence-absence' or 'abundance'")),
        }
    }
}

impl fmt::Display for OccurrenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OccurrenceMode::PresenceAbsence => "presence-absence",
            OccurrenceMode::Abundance => "abundance",
        })
    }
}

/// Cutoff policy for the co-occurrence stage.
///
/// - `Count`: at most `cutoff` child detections may lack a parent detection.
/// - `Global`: `1 - missing / retained_samples >= cutoff`.
/// - `Local`: `1 - missing / (parent_positive + missing) >= cutoff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatioPolicy {
    Count,
    Global,
    #[default]
    Local,
}

impl FromStr for RatioPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(RatioPolicy::Count),
            "global" => Ok(RatioPolicy::Global),
            "local" => Ok(RatioPolicy::Local),
            _ => Err(unknown("ratio-policy", s, "'count', 'global' or 'local'")),
        }
    }
}

impl fmt::Display for RatioPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RatioPolicy::Count => "COUNT",
            RatioPolicy::Global => "GLOBAL",
            RatioPolicy::Local => "LOCAL",
        })
    }
}

fn unknown(param: &'static str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::UnknownValue {
        param,
        value: value.to_string(),
        expected,
    }
}

/// Scan parameters. Defaults follow the command-line defaults.
#[derive(Debug, Clone)]
pub struct Params {
    pub method: Method,
    pub occurrence: OccurrenceMode,
    /// counts below this are treated as absent
    pub detection_threshold: u64,
    /// percent identity must be strictly greater than this
    pub similarity: f64,
    pub ratio_policy: RatioPolicy,
    pub ratio_cutoff: f64,
    /// sample exclusion patterns: `name`, `prefix*`, `*suffix`, `*substring*`
    pub exclude: Vec<String>,
    pub align_mode: AlignMode,
    pub scoring: Scoring,
    /// ignore a supplied precomputed alignment and align every pair
    pub force_realign: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            method: Method::default(),
            occurrence: OccurrenceMode::default(),
            detection_threshold: 1,
            similarity: 90.0,
            ratio_policy: RatioPolicy::default(),
            ratio_cutoff: 1.0,
            exclude: Vec::new(),
            align_mode: AlignMode::Global,
            scoring: Scoring::global_default(),
            force_realign: false,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ratio_cutoff >= 0.0) {
            return Err(ConfigError::InvalidValue {
                param: "ratio",
                reason: format!("must be a non-negative number, got {}", self.ratio_cutoff),
            });
        }
        if self.ratio_policy != RatioPolicy::Count && self.ratio_cutoff > 1.0 {
            return Err(ConfigError::InvalidValue {
                param: "ratio",
                reason: format!("must lie in [0, 1] for the {} policy, got {}", self.ratio_policy, self.ratio_cutoff),
            });
        }
        if !(0.0..=100.0).contains(&self.similarity) {
            return Err(ConfigError::InvalidValue {
                param: "similarity",
                reason: format!("must lie in [0, 100], got {}", self.similarity),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_sets_keep_similarity_last() {
        for m in [Method::TaxonDependent, Method::TaxonIndependent] {
            assert_eq!(m.stages().last(), Some(&Stage::Similarity));
        }
        assert!(!Method::TaxonMerge.needs_sequences());
        assert!(!Method::TaxonIndependent.needs_taxonomy());
    }

    #[test]
    fn unknown_mode_names_the_parameter() {
        let err = "presence".parse::<OccurrenceMode>().unwrap_err();
        match err {
            ConfigError::UnknownValue { param, value, .. } => {
                assert_eq!(param, "occurrence-type");
                assert_eq!(value, "presence");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!("GLOBAL".parse::<RatioPolicy>().unwrap(), RatioPolicy::Global);
        assert!("lulu".parse::<Method>().is_err());
    }

    #[test]
    fn ratio_above_one_only_allowed_for_count() {
        let mut p = Params { ratio_cutoff: 2.0, ..Params::default() };
        assert!(p.validate().is_err());
        p.ratio_policy = RatioPolicy::Count;
        assert!(p.validate().is_ok());
    }
}
