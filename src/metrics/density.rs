//! Count, Biomass and Trophic-Group Density Calculators
//!
//! Fish and invertebrate indicators: total and commercial counts and
//! densities, biomass densities (gram sums converted to kilograms), and the
//! per-trophic-group densities. All are thin parametrizations of
//! `apply_metric`; the shared shape lives in `metrics::mod`.

use crate::aggregate::DiveCounts;
use crate::data::TrophicGroup;
use crate::metrics::{apply_metric, AggregateBy, MetricSpec, Selector};
use anyhow::Result;
use polars::prelude::*;
use rustc_hash::FxHashSet;

/// Biomass sums are recorded in grams; reports carry kilograms
const GRAMS_PER_KILOGRAM: f64 = 1000.0;

/// `Total Count` and `Total Density` over every observation
pub fn add_total_count_and_density(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
) -> Result<()> {
    apply_metric(
        bucketed,
        results,
        dives,
        &MetricSpec {
            selector: Selector::All,
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: Some("Total Count"),
            density_column: "Total Density",
        },
    )
}

/// `Commercial Count` and `Commercial Density` over the commercial list
pub fn add_commercial_count_and_density(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
    commercial: &FxHashSet<String>,
) -> Result<()> {
    apply_metric(
        bucketed,
        results,
        dives,
        &MetricSpec {
            selector: Selector::SpeciesIn(commercial),
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: Some("Commercial Count"),
            density_column: "Commercial Density",
        },
    )
}

/// `Total Biomass` (kg) and `Total Biomass Density`
pub fn add_total_biomass_density(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
) -> Result<()> {
    apply_metric(
        bucketed,
        results,
        dives,
        &MetricSpec {
            selector: Selector::All,
            aggregate_by: AggregateBy::Biomass,
            scale: 1.0 / GRAMS_PER_KILOGRAM,
            sum_column: Some("Total Biomass"),
            density_column: "Total Biomass Density",
        },
    )
}

/// `Commercial Biomass` (kg) and `Commercial Biomass Density`
pub fn add_commercial_biomass_density(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
    commercial: &FxHashSet<String>,
) -> Result<()> {
    apply_metric(
        bucketed,
        results,
        dives,
        &MetricSpec {
            selector: Selector::SpeciesIn(commercial),
            aggregate_by: AggregateBy::Biomass,
            scale: 1.0 / GRAMS_PER_KILOGRAM,
            sum_column: Some("Commercial Biomass"),
            density_column: "Commercial Biomass Density",
        },
    )
}

/// Density for one trophic group's member species
pub fn add_trophic_density(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
    group: TrophicGroup,
    species: &FxHashSet<String>,
) -> Result<()> {
    apply_metric(
        bucketed,
        results,
        dives,
        &MetricSpec {
            selector: Selector::SpeciesIn(species),
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: None,
            density_column: group.column_name(),
        },
    )
}
