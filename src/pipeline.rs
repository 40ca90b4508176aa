//! Metrics Pipeline
//!
//! Orchestrates one metrics run end to end: clean the raw export, validate
//! classification coverage, count dives, aggregate to daily rows, annotate
//! biomass, assign periods, and run the domain's calculator sequence over
//! the results skeleton. Lookups and configuration are injected once at
//! construction; `run` itself is pure data-in, data-out.

use crate::aggregate::{add_periods, count_dives, daily_aggregate, results_skeleton};
use crate::biomass::annotate_biomass;
use crate::clean::clean_survey;
use crate::config::{RunConfig, SurveyDomain};
use crate::data::{load_survey_csv, SurveyLookups, TrophicGroup};
use crate::metrics::{
    add_bleaching, add_commercial_biomass_density, add_commercial_count_and_density,
    add_fresh_algae_cover, add_hard_coral_cover, add_rubble_cover, add_soft_coral_cover,
    add_total_biomass_density, add_total_count_and_density, add_trophic_density,
};
use crate::validate::check_classification;
use anyhow::{Context, Result};
use polars::prelude::*;

pub struct SurveyMetrics {
    lookups: SurveyLookups,
    config: RunConfig,
}

impl SurveyMetrics {
    /// Build a pipeline from a run configuration, loading all lookups
    pub fn new(config: RunConfig) -> Result<Self> {
        let lookups = SurveyLookups::load(
            &config.constants_dir,
            config.domain,
            config.include_biomass,
        )?;
        Ok(SurveyMetrics { lookups, config })
    }

    /// Build a pipeline from pre-loaded lookups
    pub fn from_parts(lookups: SurveyLookups, config: RunConfig) -> Self {
        SurveyMetrics { lookups, config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Load the configured survey export and compute its metrics table
    pub fn run_input(&self) -> Result<DataFrame> {
        let raw = load_survey_csv(&self.config.input)?;
        println!(
            "Loaded {} survey rows from {:?}",
            raw.height(),
            self.config.input
        );
        self.run(raw)
    }

    /// Compute the full metrics table for one raw survey frame
    ///
    /// The output has one row per (Period, Site) and one column per metric
    /// the domain defines, zero-filled and unrounded.
    pub fn run(&self, raw: DataFrame) -> Result<DataFrame> {
        let domain = self.config.domain;

        let cleaned =
            clean_survey(raw, domain).context("Survey cleaning failed")?;
        check_classification(
            &cleaned,
            &self.lookups,
            domain,
            self.config.include_biomass,
            self.config.unmatched_species,
        )?;

        // Dive counting needs Survey_ID, which daily aggregation collapses
        let dives = count_dives(&cleaned, self.config.period)?;
        println!("Counted dives for {} period/site combinations", dives.len());

        let mut daily = daily_aggregate(&cleaned, domain)?;
        let with_biomass = domain.has_species() && self.config.include_biomass;
        if with_biomass {
            daily = annotate_biomass(
                &daily,
                &self.lookups.biomass_coeffs,
                self.config.unmatched_species,
            )?;
        }

        let bucketed = add_periods(&daily, self.config.period)?;
        let mut results = results_skeleton(&bucketed)?;

        match domain {
            SurveyDomain::Fish => {
                add_total_count_and_density(&bucketed, &mut results, &dives)?;
                add_commercial_count_and_density(
                    &bucketed,
                    &mut results,
                    &dives,
                    &self.lookups.commercial,
                )?;
                if with_biomass {
                    add_total_biomass_density(&bucketed, &mut results, &dives)?;
                    add_commercial_biomass_density(
                        &bucketed,
                        &mut results,
                        &dives,
                        &self.lookups.commercial,
                    )?;
                }
                self.add_trophic_densities(&bucketed, &mut results, &dives)?;
            }
            SurveyDomain::Inverts => {
                add_total_count_and_density(&bucketed, &mut results, &dives)?;
                if with_biomass {
                    add_total_biomass_density(&bucketed, &mut results, &dives)?;
                }
                self.add_trophic_densities(&bucketed, &mut results, &dives)?;
            }
            SurveyDomain::Substrate => {
                add_hard_coral_cover(&bucketed, &mut results, &dives)?;
                add_soft_coral_cover(&bucketed, &mut results, &dives)?;
                add_fresh_algae_cover(&bucketed, &mut results, &dives)?;
                add_rubble_cover(&bucketed, &mut results, &dives)?;
                add_bleaching(&bucketed, &mut results, &dives)?;
            }
        }

        println!(
            "Computed {} metric columns over {} result rows",
            results.width() - 2,
            results.height()
        );
        Ok(results)
    }

    fn add_trophic_densities(
        &self,
        bucketed: &DataFrame,
        results: &mut DataFrame,
        dives: &crate::aggregate::DiveCounts,
    ) -> Result<()> {
        for group in TrophicGroup::ALL {
            add_trophic_density(
                bucketed,
                results,
                dives,
                group,
                self.lookups.trophic_species(group),
            )?;
        }
        Ok(())
    }
}
