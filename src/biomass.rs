//! Biomass Annotation
//!
//! Attaches a `Total Biomass` value to every daily-aggregated row using the
//! allometric formula `biomass = total * coeff_a * size^coeff_b`. The
//! transform is pure and row-independent: permuting input rows permutes the
//! output values identically.

use crate::config::UnmatchedSpeciesPolicy;
use crate::data::BiomassCoeffs;
use crate::validate::DataGapError;
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// Results-table/field name carrying per-row biomass in grams
pub const TOTAL_BIOMASS: &str = "Total Biomass";

/// Append per-row biomass to a daily-aggregated frame
///
/// Species without coefficients abort the run with every missing name
/// enumerated, unless the explicit `ZeroBiomass` legacy policy is active,
/// in which case those rows contribute 0.0.
pub fn annotate_biomass(
    df: &DataFrame,
    coeffs: &FxHashMap<String, BiomassCoeffs>,
    policy: UnmatchedSpeciesPolicy,
) -> Result<DataFrame> {
    let species = df.column("Species")?.str()?;
    let sizes = df.column("Size")?.cast(&DataType::Float64)?;
    let sizes = sizes.f64()?;
    let totals = df.column("Total")?.cast(&DataType::Float64)?;
    let totals = totals.f64()?;

    let mut values: Vec<f64> = Vec::with_capacity(df.height());
    let mut missing: FxHashSet<&str> = FxHashSet::default();
    for idx in 0..df.height() {
        let name = species.get(idx).context("Null species name")?;
        let size = sizes.get(idx).context("Null size")?;
        let total = totals.get(idx).context("Null total")?;

        match coeffs.get(name) {
            Some(c) => values.push(total * c.a * libm::pow(size, c.b)),
            None => {
                if policy == UnmatchedSpeciesPolicy::Fail {
                    missing.insert(name);
                }
                values.push(0.0);
            }
        }
    }

    if !missing.is_empty() {
        let mut names: Vec<String> = missing.into_iter().map(String::from).collect();
        names.sort();
        return Err(DataGapError::MissingCoefficients(names).into());
    }

    let mut out = df.clone();
    out.with_column(Series::new(TOTAL_BIOMASS.into(), values))?;
    Ok(out)
}
