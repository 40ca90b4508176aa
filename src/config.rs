//! Run Configuration
//!
//! Explicit configuration objects for a metrics run: the reporting period
//! mode, the survey domain (which grouping keys and lookup files apply), and
//! the policy for species without biomass coefficients. Loaded once from
//! JSON and injected into the pipeline at construction time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Reporting bucket for metric aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodMode {
    /// One bucket per calendar day
    Daily,
    /// Calendar month truncation (year + month)
    Monthly,
    /// Season labels with calendar-aware year rollover for winter
    Seasonal,
}

impl PeriodMode {
    pub fn dir_name(&self) -> &'static str {
        match self {
            PeriodMode::Daily => "daily",
            PeriodMode::Monthly => "monthly",
            PeriodMode::Seasonal => "seasonal",
        }
    }
}

/// Survey domain, resolved once at pipeline construction
///
/// Each variant owns its grouping-key spec and lookup-file set; this replaces
/// dispatching on a raw group string throughout the calculators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyDomain {
    Fish,
    Inverts,
    #[serde(rename = "subs")]
    Substrate,
}

impl SurveyDomain {
    /// Daily aggregation keys for this domain
    pub fn grouping_keys(&self) -> &'static [&'static str] {
        match self {
            SurveyDomain::Fish | SurveyDomain::Inverts => {
                &["Date", "Site", "Species", "Size"]
            }
            SurveyDomain::Substrate => &["Date", "Site", "Group", "Status"],
        }
    }

    /// Suffix of the per-domain classification list files
    /// (e.g. `herbivore_fish.csv`). Substrate surveys have no species lists.
    pub fn list_suffix(&self) -> Option<&'static str> {
        match self {
            SurveyDomain::Fish => Some("fish"),
            SurveyDomain::Inverts => Some("inverts"),
            SurveyDomain::Substrate => None,
        }
    }

    /// Output directory segment for this domain
    pub fn dir_name(&self) -> &'static str {
        match self {
            SurveyDomain::Fish => "fish",
            SurveyDomain::Inverts => "inverts",
            SurveyDomain::Substrate => "subs",
        }
    }

    /// Whether rows carry a Species column (vs Group + Status)
    pub fn has_species(&self) -> bool {
        !matches!(self, SurveyDomain::Substrate)
    }
}

/// Policy for species present in survey data but absent from the biomass
/// coefficient table
///
/// `Fail` enumerates every missing species and aborts the run.
/// `ZeroBiomass` annotates such rows with 0.0 biomass; this reproduces the
/// historical behavior from before the coefficient table was complete and
/// must be opted into explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedSpeciesPolicy {
    Fail,
    ZeroBiomass,
}

impl Default for UnmatchedSpeciesPolicy {
    fn default() -> Self {
        UnmatchedSpeciesPolicy::Fail
    }
}

/// Full configuration for one metrics run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Raw survey export (one row per individual observation)
    pub input: PathBuf,
    /// Directory holding classification lists and biomass coefficients
    pub constants_dir: PathBuf,
    /// Root directory for per-site result files
    pub output_dir: PathBuf,
    pub domain: SurveyDomain,
    pub period: PeriodMode,
    /// Biomass coefficients were historically unavailable for invertebrates
    #[serde(default = "default_include_biomass")]
    pub include_biomass: bool,
    #[serde(default)]
    pub unmatched_species: UnmatchedSpeciesPolicy,
}

fn default_include_biomass() -> bool {
    true
}

impl RunConfig {
    /// Load run configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read run config: {:?}", path))?;
        let config: RunConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse run config JSON: {:?}", path))?;
        Ok(config)
    }
}
