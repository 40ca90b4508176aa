//! Classification Completeness Validation
//!
//! Every species appearing in a survey must be classified before any metric
//! computation runs: membership in at least one trophic list, and (when
//! biomass is on) an entry in the coefficient table. Gaps are fatal and
//! reported all at once, so a data fix needs a single round trip.

use crate::config::{SurveyDomain, UnmatchedSpeciesPolicy};
use crate::data::SurveyLookups;
use anyhow::Result;
use polars::prelude::*;
use rustc_hash::FxHashSet;
use thiserror::Error;

/// Data-completeness failures surfaced before metric computation
#[derive(Debug, Error)]
pub enum DataGapError {
    #[error("species missing from every trophic classification list: {0:?}")]
    UnclassifiedSpecies(Vec<String>),

    #[error("species missing biomass coefficients: {0:?}")]
    MissingCoefficients(Vec<String>),
}

/// Distinct species names present in a cleaned survey
pub fn distinct_species(df: &DataFrame) -> Result<Vec<String>> {
    let species = df.column("Species")?.str()?;
    let mut seen = FxHashSet::default();
    let mut names = Vec::new();
    for name in species.into_iter().flatten() {
        if seen.insert(name) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Check the survey's species against the loaded lookups
///
/// Substrate surveys carry no species and always pass. Coefficient coverage
/// is only enforced when biomass metrics are on and the unmatched-species
/// policy is `Fail`; the `ZeroBiomass` legacy mode tolerates gaps.
pub fn check_classification(
    df: &DataFrame,
    lookups: &SurveyLookups,
    domain: SurveyDomain,
    include_biomass: bool,
    policy: UnmatchedSpeciesPolicy,
) -> Result<()> {
    if !domain.has_species() {
        return Ok(());
    }

    let species = distinct_species(df)?;

    let classified = lookups.all_classified_species();
    let mut unclassified: Vec<String> = species
        .iter()
        .filter(|name| !classified.contains(*name))
        .cloned()
        .collect();
    if !unclassified.is_empty() {
        unclassified.sort();
        return Err(DataGapError::UnclassifiedSpecies(unclassified).into());
    }

    if include_biomass && policy == UnmatchedSpeciesPolicy::Fail {
        let mut uncovered: Vec<String> = species
            .iter()
            .filter(|name| !lookups.biomass_coeffs.contains_key(*name))
            .cloned()
            .collect();
        if !uncovered.is_empty() {
            uncovered.sort();
            return Err(DataGapError::MissingCoefficients(uncovered).into());
        }
    }

    println!(
        "All {} surveyed species are classified.",
        species.len()
    );
    Ok(())
}
