//! Report Writing
//!
//! Turns a finished metrics table into per-site CSV reports: rows sorted
//! chronologically, values rounded to two decimals exactly once, one file
//! per site under `<output_dir>/<domain>/<period>/`. Site files are written
//! in parallel; they share no state beyond the read-only results table.

use crate::config::RunConfig;
use crate::period::{parse_period, PeriodKey};
use anyhow::{Context, Result};
use polars::prelude::*;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fs;
use std::path::PathBuf;

/// Sort results chronologically by period, then by site
///
/// Labels that parse to no known period shape sort after every dated row,
/// keeping their relative order.
pub fn sort_chronologically(results: &DataFrame) -> Result<DataFrame> {
    let periods = results.column("Period")?.str()?;
    let sites = results.column("Site")?.str()?;

    let mut order: Vec<(Option<PeriodKey>, &str, u32)> = Vec::with_capacity(results.height());
    for idx in 0..results.height() {
        let period = periods.get(idx).context("Null period in results")?;
        let site = sites.get(idx).context("Null site in results")?;
        order.push((parse_period(period), site, idx as u32));
    }
    order.sort_by(|a, b| {
        // None (unparsable) after Some, then stable by original index
        match (a.0, b.0) {
            (Some(ka), Some(kb)) => ka.cmp(&kb).then(a.1.cmp(b.1)).then(a.2.cmp(&b.2)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.2.cmp(&b.2),
        }
    });

    let indices: Vec<u32> = order.iter().map(|entry| entry.2).collect();
    let indices = IdxCa::from_vec("idx".into(), indices);
    Ok(results.take(&indices)?)
}

/// Round every float column to two decimals
///
/// Applied once, at the reporting boundary; everything upstream keeps full
/// precision so rounding error never compounds.
pub fn round_metrics(results: &DataFrame) -> Result<DataFrame> {
    let mut out = results.clone();
    for column in results.get_columns() {
        if column.dtype() != &DataType::Float64 {
            continue;
        }
        let rounded: Float64Chunked = column
            .f64()?
            .into_iter()
            .map(|v| v.map(|x| (x * 100.0).round() / 100.0))
            .collect();
        out.with_column(rounded.into_series().with_name(column.name().clone()))?;
    }
    Ok(out)
}

/// Write one CSV per site, returning the paths written
///
/// The results table is expected to be sorted and rounded already; this
/// function only partitions and serializes.
pub fn write_site_reports(results: &DataFrame, config: &RunConfig) -> Result<Vec<PathBuf>> {
    let report_dir = config
        .output_dir
        .join(config.domain.dir_name())
        .join(config.period.dir_name());
    fs::create_dir_all(&report_dir)
        .with_context(|| format!("Failed to create report directory: {:?}", report_dir))?;

    let sites_column = results.column("Site")?.str()?;
    let mut seen = FxHashSet::default();
    let mut sites: Vec<String> = Vec::new();
    for site in sites_column.into_iter().flatten() {
        if seen.insert(site) {
            sites.push(site.to_string());
        }
    }

    let paths = sites
        .par_iter()
        .map(|site| {
            let mask: BooleanChunked = results
                .column("Site")?
                .str()?
                .into_iter()
                .map(|v| v == Some(site.as_str()))
                .collect();
            let mut site_df = results.filter(&mask)?;

            let path = report_dir.join(format!("{}.csv", sanitize_filename(site)));
            let file = fs::File::create(&path)
                .with_context(|| format!("Failed to create report file: {:?}", path))?;
            CsvWriter::new(file)
                .finish(&mut site_df)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            Ok(path)
        })
        .collect::<Result<Vec<_>>>()?;

    println!("Wrote {} site reports to {:?}", paths.len(), report_dir);
    Ok(paths)
}

/// Site names appear verbatim in filenames apart from path separators
fn sanitize_filename(site: &str) -> String {
    site.replace(['/', '\\'], "-")
}
