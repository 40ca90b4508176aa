//! Metric Calculators
//!
//! Every indicator follows one shape: filter bucketed rows by a membership
//! predicate, sum a value field by (Period, Site), divide by the matching
//! dive count, and append the result as a zero-filled column aligned to the
//! results table. The shape lives here once, parametrized by `MetricSpec`;
//! the per-metric modules only supply predicates and column names.

pub mod bleaching;
pub mod cover;
pub mod density;

pub use bleaching::add_bleaching;
pub use cover::{
    add_fresh_algae_cover, add_hard_coral_cover, add_rubble_cover, add_soft_coral_cover,
    FRESH_ALGAE_GROUPS,
};
pub use density::{
    add_commercial_biomass_density, add_commercial_count_and_density, add_total_biomass_density,
    add_total_count_and_density, add_trophic_density,
};

use crate::aggregate::DiveCounts;
use crate::biomass::TOTAL_BIOMASS;
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// Value field a metric aggregates
#[derive(Debug, Clone, Copy)]
pub enum AggregateBy {
    /// Sum of the `Total` observation counts
    Count,
    /// Sum of the annotated `Total Biomass` values
    Biomass,
}

impl AggregateBy {
    fn column(&self) -> &'static str {
        match self {
            AggregateBy::Count => "Total",
            AggregateBy::Biomass => TOTAL_BIOMASS,
        }
    }
}

/// Row-membership predicate selecting which observations feed a metric
#[derive(Debug, Clone, Copy)]
pub enum Selector<'a> {
    /// Every row
    All,
    /// Species column is a member of the given list
    SpeciesIn(&'a FxHashSet<String>),
    /// Substrate group contains the given fragment
    GroupContains(&'a str),
    /// Substrate group is one of the given categories
    GroupIn(&'a [&'a str]),
    /// Substrate status equals the given literal
    StatusEq(&'a str),
}

impl Selector<'_> {
    /// Build the row mask for this predicate
    pub(crate) fn mask(&self, df: &DataFrame) -> Result<BooleanChunked> {
        let mask = match self {
            Selector::All => BooleanChunked::full("mask".into(), true, df.height()),
            Selector::SpeciesIn(species) => df
                .column("Species")?
                .str()?
                .into_iter()
                .map(|v| v.map_or(false, |name| species.contains(name)))
                .collect(),
            Selector::GroupContains(fragment) => df
                .column("Group")?
                .str()?
                .into_iter()
                .map(|v| v.map_or(false, |group| group.contains(fragment)))
                .collect(),
            Selector::GroupIn(categories) => df
                .column("Group")?
                .str()?
                .into_iter()
                .map(|v| v.map_or(false, |group| categories.contains(&group)))
                .collect(),
            Selector::StatusEq(status) => df
                .column("Status")?
                .str()?
                .into_iter()
                .map(|v| v == Some(*status))
                .collect(),
        };
        Ok(mask)
    }
}

/// One parametrized metric: predicate, value field, unit scale, output columns
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec<'a> {
    pub selector: Selector<'a>,
    pub aggregate_by: AggregateBy,
    /// Unit conversion applied to the summed value before dive division
    /// (1.0, or 1e-3 for gram → kilogram biomass columns)
    pub scale: f64,
    /// Optional column carrying the scaled sum itself
    pub sum_column: Option<&'a str>,
    /// Column carrying the sum divided by the dive count
    pub density_column: &'a str,
}

/// Sum a value column by (Period, Site) over the rows a mask selects
pub(crate) fn sum_by_key(
    df: &DataFrame,
    mask: &BooleanChunked,
    value_column: &str,
) -> Result<FxHashMap<(String, String), f64>> {
    let filtered = df.filter(mask)?;
    let periods = filtered.column("Period")?.str()?;
    let sites = filtered.column("Site")?.str()?;
    let values = filtered
        .column(value_column)?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", value_column))?;
    let values = values.f64()?;

    let mut sums: FxHashMap<(String, String), f64> = FxHashMap::default();
    for idx in 0..filtered.height() {
        let period = periods.get(idx).context("Null period")?;
        let site = sites.get(idx).context("Null site")?;
        let value = values.get(idx).unwrap_or(0.0);
        *sums
            .entry((period.to_string(), site.to_string()))
            .or_insert(0.0) += value;
    }
    Ok(sums)
}

/// Run one metric and append its column(s) to the results table
///
/// Every (Period, Site) row of the results table gets a value; combinations
/// with no matching observations or no matching dive count get 0.0. Rows are
/// never dropped and full precision is kept — rounding happens once, at the
/// reporting boundary.
pub fn apply_metric(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
    spec: &MetricSpec,
) -> Result<()> {
    let mask = spec.selector.mask(bucketed)?;
    let sums = sum_by_key(bucketed, &mask, spec.aggregate_by.column())?;

    let (raw_values, density_values) = {
        let periods = results.column("Period")?.str()?;
        let sites = results.column("Site")?.str()?;

        let mut raw_values: Vec<f64> = Vec::with_capacity(results.height());
        let mut density_values: Vec<f64> = Vec::with_capacity(results.height());
        for idx in 0..results.height() {
            let period = periods.get(idx).context("Null period in results")?;
            let site = sites.get(idx).context("Null site in results")?;

            let raw = sums
                .get(&(period.to_string(), site.to_string()))
                .copied()
                .unwrap_or(0.0)
                * spec.scale;
            let density = match dives.get(period, site) {
                Some(n) if n > 0 => raw / n as f64,
                _ => 0.0,
            };
            raw_values.push(raw);
            density_values.push(density);
        }
        (raw_values, density_values)
    };

    if let Some(sum_column) = spec.sum_column {
        results.with_column(Series::new(sum_column.into(), raw_values))?;
    }
    results.with_column(Series::new(spec.density_column.into(), density_values))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::count_dives;
    use crate::config::PeriodMode;
    use approx::assert_relative_eq;

    fn bucketed() -> DataFrame {
        df!(
            "Period" => &["Winter 24/25", "Winter 24/25", "Spring 2025"],
            "Site" => &["House Reef", "House Reef", "House Reef"],
            "Species" => &["Grouper - Peacock", "Parrotfish - Bullethead", "Grouper - Peacock"],
            "Total" => &[6i64, 4, 2],
        )
        .unwrap()
    }

    fn dives() -> DiveCounts {
        let cleaned = df!(
            "Date" => &["2024-12-15", "2024-12-16", "2025-03-05"],
            "Site" => &["House Reef", "House Reef", "House Reef"],
            "Survey_ID" => &["S1", "S2", "S3"],
        )
        .unwrap();
        count_dives(&cleaned, PeriodMode::Seasonal).unwrap()
    }

    #[test]
    fn test_apply_metric_all_rows() {
        let mut results = df!(
            "Period" => &["Winter 24/25", "Spring 2025"],
            "Site" => &["House Reef", "House Reef"],
        )
        .unwrap();

        let spec = MetricSpec {
            selector: Selector::All,
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: Some("Total Count"),
            density_column: "Total Density",
        };
        apply_metric(&bucketed(), &mut results, &dives(), &spec).unwrap();

        let counts = results.column("Total Count").unwrap();
        let counts = counts.f64().unwrap();
        assert_relative_eq!(counts.get(0).unwrap(), 10.0);
        let density = results.column("Total Density").unwrap();
        let density = density.f64().unwrap();
        // 10 observations over 2 winter dives
        assert_relative_eq!(density.get(0).unwrap(), 5.0);
        assert_relative_eq!(density.get(1).unwrap(), 2.0);
    }

    #[test]
    fn test_zero_fill_for_unmatched_combinations() {
        let mut results = df!(
            "Period" => &["Winter 24/25", "Spring 2025"],
            "Site" => &["House Reef", "House Reef"],
        )
        .unwrap();

        let mut herbivores = FxHashSet::default();
        herbivores.insert("Parrotfish - Bullethead".to_string());
        let spec = MetricSpec {
            selector: Selector::SpeciesIn(&herbivores),
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: None,
            density_column: "Herbivore Density",
        };
        apply_metric(&bucketed(), &mut results, &dives(), &spec).unwrap();

        let density = results.column("Herbivore Density").unwrap();
        let density = density.f64().unwrap();
        assert_relative_eq!(density.get(0).unwrap(), 2.0);
        // No parrotfish in spring: present with 0, not dropped
        assert_relative_eq!(density.get(1).unwrap(), 0.0);
        assert_eq!(results.height(), 2);
    }

    #[test]
    fn test_missing_dive_count_zero_fills() {
        let mut results = df!(
            "Period" => &["Winter 24/25", "Winter 25/26"],
            "Site" => &["House Reef", "House Reef"],
        )
        .unwrap();

        let spec = MetricSpec {
            selector: Selector::All,
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: None,
            density_column: "Total Density",
        };
        apply_metric(&bucketed(), &mut results, &dives(), &spec).unwrap();

        let density = results.column("Total Density").unwrap();
        let density = density.f64().unwrap();
        assert_relative_eq!(density.get(0).unwrap(), 5.0);
        assert_relative_eq!(density.get(1).unwrap(), 0.0);
    }
}
