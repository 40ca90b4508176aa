//! Period Assignment and Chronological Ordering
//!
//! Maps observation dates to reporting buckets (daily, monthly, seasonal)
//! and parses the resulting labels back into sortable keys. Season labels
//! are display-only strings, so winter needs the year-rollover rule:
//! December belongs to the winter that spans into the following January.

use crate::config::PeriodMode;
use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};

/// Season ordering within a calendar year
const SPRING: u32 = 1;
const SUMMER: u32 = 2;
const AUTUMN: u32 = 3;
const WINTER: u32 = 4;

/// Parse a date string to a calendar day, dropping any time component
///
/// Accepts `YYYY-MM-DD` with an optional trailing ` HH:MM[:SS]` or
/// `T`-separated time, plus `DD/MM/YYYY` as seen in older exports.
pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    let day_part = raw
        .split(|c| c == ' ' || c == 'T')
        .next()
        .unwrap_or(raw)
        .trim();

    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day_part, "%d/%m/%Y"))
        .map_err(|_| anyhow!("Unparsable survey date: '{}'", raw))
}

/// Derive the period label for a date under the given mode
pub fn period_label(date: NaiveDate, mode: PeriodMode) -> String {
    match mode {
        PeriodMode::Daily => date.format("%Y-%m-%d").to_string(),
        PeriodMode::Monthly => date.format("%Y-%m").to_string(),
        PeriodMode::Seasonal => season_label(date),
    }
}

/// Season label with winter year-rollover
///
/// December opens the winter that runs into January/February of the next
/// year, so Dec 2024, Jan 2025 and Feb 2025 all map to "Winter 24/25".
pub fn season_label(date: NaiveDate) -> String {
    let year = date.year();
    match date.month() {
        12 => format!("Winter {:02}/{:02}", year % 100, (year + 1) % 100),
        1 | 2 => format!("Winter {:02}/{:02}", (year - 1) % 100, year % 100),
        3..=5 => format!("Spring {}", year),
        6..=8 => format!("Summer {}", year),
        _ => format!("Autumn {}", year),
    }
}

/// Sort key recovered from a period label
///
/// Winter labels key on the year of their December, so within one calendar
/// year Spring < Summer < Autumn < Winter, and Winter YY/YY+1 sorts before
/// Spring of YY+1. Daily and monthly labels key on their own components;
/// the three modes never mix within one results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PeriodKey {
    pub year: i32,
    pub ord: u32,
}

/// Parse a period label back into its chronological key
///
/// Returns `None` for labels that match no known shape; the reporter sorts
/// those last.
pub fn parse_period(label: &str) -> Option<PeriodKey> {
    // Daily: YYYY-MM-DD, monthly: YYYY-MM
    if let Some((year_part, rest)) = label.split_once('-') {
        let year: i32 = year_part.parse().ok()?;
        return match rest.split_once('-') {
            Some((month_part, day_part)) => {
                let month: u32 = month_part.parse().ok()?;
                let day: u32 = day_part.parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, day)?;
                Some(PeriodKey {
                    year,
                    ord: month * 31 + day,
                })
            }
            None => {
                let month: u32 = rest.parse().ok()?;
                (1..=12).contains(&month).then_some(PeriodKey { year, ord: month })
            }
        };
    }

    let (season, year_part) = label.split_once(' ')?;
    match season {
        "Winter" => {
            // "Winter YY/YY+1" keys on the December year
            let (start, _) = year_part.split_once('/')?;
            let start_year: i32 = start.parse().ok()?;
            Some(PeriodKey {
                year: 2000 + start_year,
                ord: WINTER,
            })
        }
        "Spring" | "Summer" | "Autumn" => {
            let year: i32 = year_part.parse().ok()?;
            let ord = match season {
                "Spring" => SPRING,
                "Summer" => SUMMER,
                _ => AUTUMN,
            };
            Some(PeriodKey { year, ord })
        }
        _ => None,
    }
}
