//! Metrics Run Entry Point
//!
//! Usage: `run_metrics <config.json>`
//!
//! Loads the run configuration, computes the metrics table for the
//! configured survey export, and writes sorted, rounded per-site CSVs.

use anyhow::{bail, Result};
use reef_metrics::{
    round_metrics, sort_chronologically, write_site_reports, RunConfig, SurveyMetrics,
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        bail!("Usage: {} <config.json>", args[0]);
    }

    let config = RunConfig::load(Path::new(&args[1]))?;
    println!(
        "Running {} metrics ({} periods) on {:?}",
        config.domain.dir_name(),
        config.period.dir_name(),
        config.input
    );

    let pipeline = SurveyMetrics::new(config)?;
    let results = pipeline.run_input()?;

    let sorted = sort_chronologically(&results)?;
    let rounded = round_metrics(&sorted)?;
    let paths = write_site_reports(&rounded, pipeline.config())?;

    println!("Done: {} site reports.", paths.len());
    Ok(())
}
