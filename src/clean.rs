//! Survey Cleaning Pass
//!
//! One-off preparation of a raw survey export before aggregation:
//! observer columns dropped, dates floored to the day, invalid surveys
//! removed, oversized records excluded, and textual size ranges averaged
//! to a numeric midpoint. Every failure here is a data problem in the
//! export, so errors carry the offending value.

use crate::config::SurveyDomain;
use crate::period::parse_day;
use anyhow::{bail, Context, Result};
use polars::prelude::*;
use smallvec::SmallVec;

/// Columns removed when present; they never feed any metric
const DROPPED_COLS: &[&str] = &[
    "Observer_name_1",
    "Observer_name_2",
    "Diver_1_count",
    "Diver_2_count",
];

/// Records above this size are turtles and excluded from all metrics
const OVERSIZE_SENTINEL: &str = ">120";

/// Clean a raw survey export for the given domain
pub fn clean_survey(df: DataFrame, domain: SurveyDomain) -> Result<DataFrame> {
    let mut df = drop_ignored_columns(df)?;
    df = filter_valid_surveys(df)?;

    for required in required_columns(domain) {
        df.column(required)
            .with_context(|| format!("Survey export is missing column '{}'", required))?;
    }

    df = floor_dates(df)?;

    if domain.has_species() {
        df = filter_oversize(df)?;
        df = average_size_ranges(df)?;
    }

    Ok(df)
}

/// Input columns every metric run needs for this domain
pub fn required_columns(domain: SurveyDomain) -> &'static [&'static str] {
    match domain {
        SurveyDomain::Fish | SurveyDomain::Inverts => {
            &["Date", "Site", "Species", "Size", "Total", "Survey_ID"]
        }
        SurveyDomain::Substrate => {
            &["Date", "Site", "Group", "Status", "Total", "Survey_ID"]
        }
    }
}

fn drop_ignored_columns(mut df: DataFrame) -> Result<DataFrame> {
    for name in DROPPED_COLS {
        if df.column(name).is_ok() {
            df = df.drop(name)?;
        }
    }
    Ok(df)
}

/// Keep only surveys marked valid, then drop the status column
fn filter_valid_surveys(df: DataFrame) -> Result<DataFrame> {
    let Ok(status) = df.column("Survey_Status") else {
        return Ok(df);
    };

    let mask: BooleanChunked = if let Ok(ints) = status.i64() {
        ints.into_iter().map(|v| v == Some(1)).collect()
    } else if let Ok(ints) = status.i32() {
        ints.into_iter().map(|v| v == Some(1)).collect()
    } else if let Ok(strs) = status.str() {
        strs.into_iter().map(|v| v == Some("1")).collect()
    } else {
        bail!("Survey_Status column has unsupported type: {}", status.dtype());
    };

    let filtered = df.filter(&mask)?;
    Ok(filtered.drop("Survey_Status")?)
}

/// Replace the Date column with plain `YYYY-MM-DD` day strings
fn floor_dates(mut df: DataFrame) -> Result<DataFrame> {
    let dates = df.column("Date")?.str().context("Date column must be text")?;

    let mut floored: Vec<String> = Vec::with_capacity(df.height());
    for raw in dates.into_iter() {
        let raw = raw.context("Null survey date")?;
        floored.push(parse_day(raw)?.format("%Y-%m-%d").to_string());
    }

    df.with_column(Series::new("Date".into(), floored))?;
    Ok(df)
}

fn filter_oversize(df: DataFrame) -> Result<DataFrame> {
    // Size may already be numeric in pre-cleaned exports
    if df.column("Size")?.dtype() != &DataType::String {
        return Ok(df);
    }

    let sizes = df.column("Size")?.str()?;
    let mask: BooleanChunked = sizes
        .into_iter()
        .map(|v| v.map_or(false, |s| s.trim() != OVERSIZE_SENTINEL))
        .collect();
    Ok(df.filter(&mask)?)
}

/// Average textual `lo-hi` size ranges to a single numeric midpoint
fn average_size_ranges(mut df: DataFrame) -> Result<DataFrame> {
    if df.column("Size")?.dtype() != &DataType::String {
        let midpoints = df
            .column("Size")?
            .cast(&DataType::Float64)
            .context("Size column is neither text nor numeric")?;
        df.with_column(midpoints)?;
        return Ok(df);
    }

    let sizes = df.column("Size")?.str()?;

    let mut midpoints: Vec<f64> = Vec::with_capacity(df.height());
    for raw in sizes.into_iter() {
        let raw = raw.context("Null size value")?;
        let parts: SmallVec<[f64; 2]> = raw
            .split('-')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("Unparsable size value: '{}'", raw))?;
        if parts.is_empty() {
            bail!("Empty size value");
        }
        midpoints.push(parts.iter().sum::<f64>() / parts.len() as f64);
    }

    df.with_column(Series::new("Size".into(), midpoints))?;
    Ok(df)
}
