//! Substrate Cover Calculators
//!
//! Percent-composition-style indicators over substrate records: hard and
//! soft coral, fresh algae, and rubble, each normalized by the dive count.

use crate::aggregate::DiveCounts;
use crate::metrics::{apply_metric, AggregateBy, MetricSpec, Selector};
use anyhow::Result;
use polars::prelude::*;

/// Fresh algae categories. Fixed by survey methodology, so defined in code
/// rather than as an input file.
pub const FRESH_ALGAE_GROUPS: &[&str] = &[
    "Algae Turf",
    "Algae Macro",
    "Algae Filamentous",
    "Algae Seagrass",
];

pub fn add_hard_coral_cover(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
) -> Result<()> {
    apply_metric(
        bucketed,
        results,
        dives,
        &MetricSpec {
            selector: Selector::GroupContains("Hard Coral"),
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: None,
            density_column: "Hard Coral Cover",
        },
    )
}

pub fn add_soft_coral_cover(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
) -> Result<()> {
    apply_metric(
        bucketed,
        results,
        dives,
        &MetricSpec {
            selector: Selector::GroupContains("Soft Coral"),
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: None,
            density_column: "Soft Coral Cover",
        },
    )
}

pub fn add_fresh_algae_cover(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
) -> Result<()> {
    apply_metric(
        bucketed,
        results,
        dives,
        &MetricSpec {
            selector: Selector::GroupIn(FRESH_ALGAE_GROUPS),
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: None,
            density_column: "Fresh Algae Cover",
        },
    )
}

pub fn add_rubble_cover(
    bucketed: &DataFrame,
    results: &mut DataFrame,
    dives: &DiveCounts,
) -> Result<()> {
    apply_metric(
        bucketed,
        results,
        dives,
        &MetricSpec {
            selector: Selector::GroupContains("Rubble"),
            aggregate_by: AggregateBy::Count,
            scale: 1.0,
            sum_column: None,
            density_column: "Rubble Cover",
        },
    )
}
