//! Bleaching Index
//!
//! Weighted bleaching indicator over substrate records: fully bleached
//! colonies count at full weight, partially bleached at half weight, and the
//! weighted sum is normalized by the dive count like every other density.

use crate::aggregate::DiveCounts;
use crate::metrics::{sum_by_key, Selector};
use anyhow::{Context, Result};
use polars::prelude::*;

pub const FULLY_BLEACHING: &str = "Fully Bleaching";
pub const PARTIALLY_BLEACHING: &str = "Partially Bleaching";

/// Weight applied to partially bleached records
const PARTIAL_WEIGHT: f64 = 0.5;

/// Append the `Bleaching` column to the results table
///
/// Computed as `(fully + 0.5 * partially) / dives` per (Period, Site),
/// zero-filled where no bleaching records or no dive count exist.
pub fn add_bleaching(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
) -> Result<()> {
    let fully_mask = Selector::StatusEq(FULLY_BLEACHING).mask(bucketed)?;
    let fully = sum_by_key(bucketed, &fully_mask, "Total")?;
    let partial_mask = Selector::StatusEq(PARTIALLY_BLEACHING).mask(bucketed)?;
    let partial = sum_by_key(bucketed, &partial_mask, "Total")?;

    let values = {
        let periods = results.column("Period")?.str()?;
        let sites = results.column("Site")?.str()?;

        let mut values: Vec<f64> = Vec::with_capacity(results.height());
        for idx in 0..results.height() {
            let period = periods.get(idx).context("Null period in results")?;
            let site = sites.get(idx).context("Null site in results")?;
            let key = (period.to_string(), site.to_string());

            let weighted = fully.get(&key).copied().unwrap_or(0.0)
                + PARTIAL_WEIGHT * partial.get(&key).copied().unwrap_or(0.0);
            let value = match dives.get(period, site) {
                Some(n) if n > 0 => weighted / n as f64,
                _ => 0.0,
            };
            values.push(value);
        }
        values
    };

    results.with_column(Series::new("Bleaching".into(), values))?;
    Ok(())
}
