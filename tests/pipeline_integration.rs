// End-to-end pipeline tests over in-memory survey frames
//
// Run with: cargo test --test pipeline_integration

use approx::assert_relative_eq;
use polars::prelude::*;
use reef_metrics::data::BiomassCoeffs;
use reef_metrics::{
    round_metrics, sort_chronologically, PeriodMode, RunConfig, SurveyDomain, SurveyLookups,
    SurveyMetrics, TrophicGroup, UnmatchedSpeciesPolicy,
};
use rustc_hash::FxHashSet;
use std::path::PathBuf;

fn config(domain: SurveyDomain, period: PeriodMode) -> RunConfig {
    RunConfig {
        input: PathBuf::from("unused.csv"),
        constants_dir: PathBuf::from("unused"),
        output_dir: PathBuf::from("unused"),
        domain,
        period,
        include_biomass: domain != SurveyDomain::Substrate,
        unmatched_species: UnmatchedSpeciesPolicy::Fail,
    }
}

fn fish_lookups() -> SurveyLookups {
    let mut lookups = SurveyLookups::empty();
    let mut carnivores = FxHashSet::default();
    carnivores.insert("Grouper - Peacock".to_string());
    carnivores.insert("Snapper - Bluestripe".to_string());
    let mut herbivores = FxHashSet::default();
    herbivores.insert("Parrotfish - Bullethead".to_string());
    lookups.trophic.insert(TrophicGroup::Carnivore, carnivores);
    lookups.trophic.insert(TrophicGroup::Herbivore, herbivores);
    lookups.commercial.insert("Grouper - Peacock".to_string());
    lookups.commercial.insert("Snapper - Bluestripe".to_string());
    for (name, a, b) in [
        ("Grouper - Peacock", 0.02, 2.9),
        ("Snapper - Bluestripe", 0.025, 2.95),
        ("Parrotfish - Bullethead", 0.015, 3.1),
    ] {
        lookups
            .biomass_coeffs
            .insert(name.to_string(), BiomassCoeffs { a, b });
    }
    lookups
}

fn raw_fish_survey() -> DataFrame {
    // Two winter dives and one spring dive at House Reef, one winter dive
    // at Turtle Point. Two rows share a (date, species, size) group.
    df!(
        "Date" => &[
            "2024-12-15 08:30:00",
            "2024-12-15 09:10:00",
            "2024-12-15 09:15:00",
            "2025-01-20",
            "2025-04-02",
        ],
        "Site" => &[
            "House Reef",
            "House Reef",
            "House Reef",
            "Turtle Point",
            "House Reef",
        ],
        "Species" => &[
            "Grouper - Peacock",
            "Grouper - Peacock",
            "Parrotfish - Bullethead",
            "Snapper - Bluestripe",
            "Parrotfish - Bullethead",
        ],
        "Size" => &["10-15", "10-15", "5-10", "20-25", "5-10"],
        "Total" => &[3i64, 2, 4, 6, 5],
        "Survey_ID" => &["S1", "S2", "S1", "S4", "S5"],
        "Survey_Status" => &[1i64, 1, 1, 1, 1],
        "Observer_name_1" => &["A", "B", "A", "C", "A"],
    )
    .unwrap()
}

#[test]
fn fish_seasonal_end_to_end() {
    let pipeline = SurveyMetrics::from_parts(
        fish_lookups(),
        config(SurveyDomain::Fish, PeriodMode::Seasonal),
    );
    let results = pipeline.run(raw_fish_survey()).unwrap();

    // Three (Period, Site) combinations, each exactly once
    assert_eq!(results.height(), 3);
    let periods = results.column("Period").unwrap();
    let periods = periods.str().unwrap();
    let sites = results.column("Site").unwrap();
    let sites = sites.str().unwrap();
    let mut keys = FxHashSet::default();
    for idx in 0..results.height() {
        keys.insert((
            periods.get(idx).unwrap().to_string(),
            sites.get(idx).unwrap().to_string(),
        ));
    }
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&("Winter 24/25".to_string(), "House Reef".to_string())));
    assert!(keys.contains(&("Winter 24/25".to_string(), "Turtle Point".to_string())));
    assert!(keys.contains(&("Spring 2025".to_string(), "House Reef".to_string())));

    let density = results.column("Total Density").unwrap();
    let density = density.f64().unwrap();
    let commercial = results.column("Commercial Density").unwrap();
    let commercial = commercial.f64().unwrap();
    for idx in 0..results.height() {
        let key = (periods.get(idx).unwrap(), sites.get(idx).unwrap());
        match key {
            // 9 fish over dives S1 and S2
            ("Winter 24/25", "House Reef") => {
                assert_relative_eq!(density.get(idx).unwrap(), 4.5);
                // Only the 5 groupers are commercial
                assert_relative_eq!(commercial.get(idx).unwrap(), 2.5);
            }
            ("Winter 24/25", "Turtle Point") => {
                assert_relative_eq!(density.get(idx).unwrap(), 6.0);
                assert_relative_eq!(commercial.get(idx).unwrap(), 6.0);
            }
            ("Spring 2025", "House Reef") => {
                assert_relative_eq!(density.get(idx).unwrap(), 5.0);
                // No commercial fish in spring: zero-filled, not dropped
                assert_relative_eq!(commercial.get(idx).unwrap(), 0.0);
            }
            other => panic!("unexpected combination {:?}", other),
        }
    }
}

#[test]
fn fish_biomass_uses_midpoint_size() {
    let pipeline = SurveyMetrics::from_parts(
        fish_lookups(),
        config(SurveyDomain::Fish, PeriodMode::Seasonal),
    );
    let results = pipeline.run(raw_fish_survey()).unwrap();

    let periods = results.column("Period").unwrap();
    let periods = periods.str().unwrap();
    let sites = results.column("Site").unwrap();
    let sites = sites.str().unwrap();
    let biomass = results.column("Total Biomass").unwrap();
    let biomass = biomass.f64().unwrap();

    for idx in 0..results.height() {
        if (periods.get(idx).unwrap(), sites.get(idx).unwrap())
            == ("Winter 24/25", "Turtle Point")
        {
            // 6 snappers at the 22.5 cm midpoint, grams to kilograms
            let expected = 6.0 * 0.025 * 22.5_f64.powf(2.95) / 1000.0;
            assert_relative_eq!(biomass.get(idx).unwrap(), expected, epsilon = 1e-9);
        }
    }
}

#[test]
fn substrate_monthly_end_to_end() {
    let raw = df!(
        "Date" => &[
            "2024-06-01",
            "2024-06-01",
            "2024-06-02",
            "2024-06-02",
            "2024-06-02",
        ],
        "Site" => &["House Reef"; 5],
        "Group" => &[
            "Hard Coral - Branching",
            "Hard Coral - Massive",
            "Soft Coral - Leather",
            "Algae Turf",
            "Hard Coral - Massive",
        ],
        "Status" => &[
            "Fully Bleaching",
            "Healthy",
            "Healthy",
            "Healthy",
            "Partially Bleaching",
        ],
        "Total" => &[4i64, 3, 6, 8, 2],
        "Survey_ID" => &["S1", "S1", "S2", "S2", "S2"],
    )
    .unwrap();

    let pipeline = SurveyMetrics::from_parts(
        SurveyLookups::empty(),
        config(SurveyDomain::Substrate, PeriodMode::Monthly),
    );
    let results = pipeline.run(raw).unwrap();
    assert_eq!(results.height(), 1);

    let value = |name: &str| {
        let column = results.column(name).unwrap().clone();
        column.f64().unwrap().get(0).unwrap()
    };
    // 9 hard coral records over 2 dives
    assert_relative_eq!(value("Hard Coral Cover"), 4.5);
    assert_relative_eq!(value("Soft Coral Cover"), 3.0);
    assert_relative_eq!(value("Fresh Algae Cover"), 4.0);
    assert_relative_eq!(value("Rubble Cover"), 0.0);
    // (4 + 0.5 * 2) / 2 dives
    assert_relative_eq!(value("Bleaching"), 2.5);
}

#[test]
fn report_ordering_and_rounding_boundary() {
    let pipeline = SurveyMetrics::from_parts(
        fish_lookups(),
        config(SurveyDomain::Fish, PeriodMode::Seasonal),
    );
    let results = pipeline.run(raw_fish_survey()).unwrap();

    let sorted = sort_chronologically(&results).unwrap();
    let periods = sorted.column("Period").unwrap();
    let periods = periods.str().unwrap();
    assert_eq!(periods.get(0), Some("Winter 24/25"));
    assert_eq!(periods.get(1), Some("Winter 24/25"));
    assert_eq!(periods.get(2), Some("Spring 2025"));

    let rounded = round_metrics(&sorted).unwrap();
    let biomass = rounded.column("Total Biomass Density").unwrap();
    let biomass = biomass.f64().unwrap();
    for idx in 0..rounded.height() {
        let value = biomass.get(idx).unwrap();
        // Two-decimal grid after the single rounding pass
        assert_relative_eq!((value * 100.0).round() / 100.0, value, epsilon = 1e-12);
    }
}

#[test]
fn missing_coefficients_fail_with_names() {
    let mut lookups = fish_lookups();
    lookups.biomass_coeffs.remove("Snapper - Bluestripe");

    let pipeline = SurveyMetrics::from_parts(
        lookups,
        config(SurveyDomain::Fish, PeriodMode::Monthly),
    );
    let err = pipeline.run(raw_fish_survey()).unwrap_err();
    assert!(err.to_string().contains("Snapper - Bluestripe"));
}

#[test]
fn invert_run_without_biomass() {
    let mut lookups = SurveyLookups::empty();
    let mut detritivores = FxHashSet::default();
    detritivores.insert("Sea Cucumber - Black".to_string());
    lookups
        .trophic
        .insert(TrophicGroup::Detritivore, detritivores);

    let raw = df!(
        "Date" => &["2024-07-10", "2024-07-11"],
        "Site" => &["House Reef", "House Reef"],
        "Species" => &["Sea Cucumber - Black", "Sea Cucumber - Black"],
        "Size" => &["10-15", "15-20"],
        "Total" => &[2i64, 3],
        "Survey_ID" => &["S1", "S2"],
    )
    .unwrap();

    let mut run_config = config(SurveyDomain::Inverts, PeriodMode::Monthly);
    run_config.include_biomass = false;
    let pipeline = SurveyMetrics::from_parts(lookups, run_config);
    let results = pipeline.run(raw).unwrap();

    assert!(results.column("Total Biomass Density").is_err());
    let detritivore = results.column("Detritivore Density").unwrap();
    let detritivore = detritivore.f64().unwrap();
    assert_relative_eq!(detritivore.get(0).unwrap(), 2.5);
}
