//! Daily and Dive-Count Aggregation
//!
//! Collapses cleaned observation rows into one row per day/site/category,
//! assigns reporting periods, counts distinct dives per (Period, Site) for
//! density normalization, and prepares the results-table skeleton that the
//! metric calculators append onto.

use crate::config::{PeriodMode, SurveyDomain};
use crate::period::{parse_day, period_label};
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

/// Distinct dives per (Period, Site)
///
/// Read-only after construction; consumed only as the denominator of every
/// density-style metric. A missing key means no dive was matched for that
/// combination, which callers treat as a zero-fill, never a failure.
pub struct DiveCounts {
    counts: FxHashMap<(String, String), u32>,
}

impl DiveCounts {
    pub fn get(&self, period: &str, site: &str) -> Option<u32> {
        self.counts
            .get(&(period.to_string(), site.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Collapse observations to one row per (day, site, category) group
///
/// Fish and invertebrate rows group by (Date, Site, Species, Size);
/// substrate rows by (Date, Site, Group, Status). `Total` is summed; no row
/// is filtered, so every observation lands in exactly one output group.
pub fn daily_aggregate(df: &DataFrame, domain: SurveyDomain) -> Result<DataFrame> {
    let keys: Vec<Expr> = domain.grouping_keys().iter().map(|k| col(*k)).collect();
    let out = df
        .clone()
        .lazy()
        .group_by(keys)
        .agg([col("Total").sum()])
        .sort(domain.grouping_keys().to_vec(), SortMultipleOptions::default())
        .collect()
        .context("Daily aggregation failed")?;
    Ok(out)
}

/// Replace the Date column with the period label for the given mode
pub fn add_periods(df: &DataFrame, mode: PeriodMode) -> Result<DataFrame> {
    let dates = df.column("Date")?.str()?;

    let mut labels: Vec<String> = Vec::with_capacity(df.height());
    for raw in dates.into_iter() {
        let raw = raw.context("Null date in aggregated data")?;
        labels.push(period_label(parse_day(raw)?, mode));
    }

    let mut out = df.clone();
    out.with_column(Series::new("Period".into(), labels))?;
    Ok(out.drop("Date")?)
}

/// Count distinct dive identifiers per (Period, Site)
///
/// Runs on the cleaned, pre-aggregation rows: the daily aggregator collapses
/// away `Survey_ID`, so dive counting has to happen first. Distinct dives,
/// not row counts — one dive contributes many observation rows.
pub fn count_dives(cleaned: &DataFrame, mode: PeriodMode) -> Result<DiveCounts> {
    let dates = cleaned.column("Date")?.str()?;
    let sites = cleaned.column("Site")?.str()?;
    let surveys = cleaned.column("Survey_ID")?;

    let mut distinct: FxHashMap<(String, String), FxHashSet<String>> = FxHashMap::default();
    for idx in 0..cleaned.height() {
        let date = dates.get(idx).context("Null date in survey data")?;
        let site = sites.get(idx).context("Null site in survey data")?;
        // Survey_ID may be numeric or text depending on the export
        let survey_id = format!("{}", surveys.get(idx)?);

        let period = period_label(parse_day(date)?, mode);
        distinct
            .entry((period, site.to_string()))
            .or_default()
            .insert(survey_id);
    }

    let counts = distinct
        .into_iter()
        .map(|(key, ids)| (key, ids.len() as u32))
        .collect();
    Ok(DiveCounts { counts })
}

/// One row per unique (Period, Site) present in the bucketed data
///
/// First-seen order is kept; the reporter re-sorts chronologically at the
/// end. Calculators only ever append columns to this frame, never drop rows.
pub fn results_skeleton(df: &DataFrame) -> Result<DataFrame> {
    let periods = df.column("Period")?.str()?;
    let sites = df.column("Site")?.str()?;

    let mut seen = FxHashSet::default();
    let mut out_periods: Vec<String> = Vec::new();
    let mut out_sites: Vec<String> = Vec::new();
    for idx in 0..df.height() {
        let period = periods.get(idx).context("Null period")?;
        let site = sites.get(idx).context("Null site")?;
        if seen.insert((period, site)) {
            out_periods.push(period.to_string());
            out_sites.push(site.to_string());
        }
    }

    Ok(df!(
        "Period" => out_periods,
        "Site" => out_sites,
    )?)
}
