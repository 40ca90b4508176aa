//! Reef Survey Metrics
//!
//! Computes per-site ecological indicator tables from raw reef survey
//! exports: fish and invertebrate densities and biomass, trophic-group
//! densities, substrate cover and bleaching, all bucketed by day, month or
//! season and normalized by dive effort.
//!
//! - `config`: run configuration (domain, period mode, policies)
//! - `data`: survey loading and classification lookups
//! - `clean` / `validate`: export preparation and completeness checks
//! - `period` / `aggregate` / `biomass`: bucketing and aggregation passes
//! - `metrics/`: the parametrized indicator calculators
//! - `pipeline` / `report`: orchestration and per-site CSV output

pub mod aggregate;
pub mod biomass;
pub mod clean;
pub mod config;
pub mod data;
pub mod metrics;
pub mod period;
pub mod pipeline;
pub mod report;
pub mod validate;

// Re-export commonly used types
pub use config::{PeriodMode, RunConfig, SurveyDomain, UnmatchedSpeciesPolicy};
pub use data::{load_survey_csv, SurveyLookups, TrophicGroup};
pub use pipeline::SurveyMetrics;
pub use report::{round_metrics, sort_chronologically, write_site_reports};
pub use validate::DataGapError;
