//! Season extraction from match dates.
//!
//! Dates are stored as day-month-year text. A strict pass reads only
//! `%d-%m-%Y`; when that pass recognizes nothing at all, a permissive
//! day-first pass is tried once before giving up.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};

/// Format of the date column
pub const STRICT_FORMAT: &str = "%d-%m-%Y";

/// Day-first formats accepted by the fallback pass, tried in order.
/// Two-digit years come first: `%Y` would also accept "18" as year 18.
pub const PERMISSIVE_FORMATS: [&str; 12] = [
    "%d-%m-%y", "%d-%m-%Y", "%d/%m/%y", "%d/%m/%Y", "%d.%m.%y", "%d.%m.%Y", "%Y-%m-%d",
    "%Y/%m/%d", "%d %b %Y", "%d-%b-%Y", "%d %B %Y", "%d-%B-%Y",
];

/// Parse a date with the strict format; `None` for unknown values.
///
/// The year must be written with four digits, so "18-04-08" is unknown here
/// and left to the permissive pass.
pub fn parse_strict(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let year = raw.rsplit('-').next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, STRICT_FORMAT).ok()
}

/// Parse a date with the first matching permissive format.
pub fn parse_permissive(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    PERMISSIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Years parsed from a column, one entry per input value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedYears {
    pub years: Vec<Option<i32>>,
    /// Whether the permissive pass produced these years
    pub used_fallback: bool,
}

impl ParsedYears {
    pub fn parsed_count(&self) -> usize {
        self.years.iter().filter(|y| y.is_some()).count()
    }
}

fn parse_pass(
    values: &[Option<&str>],
    parser: fn(&str) -> Option<NaiveDate>,
) -> Result<Vec<Option<i32>>> {
    let years: Vec<Option<i32>> = values
        .iter()
        .map(|v| v.and_then(parser).map(|d| d.year()))
        .collect();

    let non_empty = values.iter().flatten().filter(|v| !v.trim().is_empty()).count();
    if non_empty > 0 && years.iter().all(Option::is_none) {
        return Err(DashboardError::DateParse {
            reason: format!("none of {} date values matched", non_empty),
            sample: Vec::new(),
        });
    }
    Ok(years)
}

/// Derive a year per value. Values neither pass understands become `None`.
///
/// Fails with `DateParse` only when both passes recognize no value at all; the
/// error carries up to `sample_size` of the leading raw values.
pub fn parse_years(values: &[Option<&str>], sample_size: usize) -> Result<ParsedYears> {
    match parse_pass(values, parse_strict) {
        Ok(years) => Ok(ParsedYears {
            years,
            used_fallback: false,
        }),
        Err(strict_err) => {
            warn!("Strict date parsing failed ({}), retrying day-first", strict_err);
            match parse_pass(values, parse_permissive) {
                Ok(years) => Ok(ParsedYears {
                    years,
                    used_fallback: true,
                }),
                Err(DashboardError::DateParse { reason, .. }) => {
                    let sample = values
                        .iter()
                        .take(sample_size)
                        .map(|v| v.unwrap_or("").to_string())
                        .collect();
                    Err(DashboardError::DateParse { reason, sample })
                }
                Err(other) => Err(other),
            }
        }
    }
}

/// Matches per season plus summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSummary {
    pub matches_per_season: BTreeMap<i32, usize>,
    /// (year, count) with the most matches; earliest year on ties
    pub peak: Option<(i32, usize)>,
    /// (year, count) with the fewest matches; earliest year on ties
    pub trough: Option<(i32, usize)>,
    /// Mean matches per season, one decimal place
    pub mean: Option<f64>,
    pub used_fallback: bool,
}

impl SeasonSummary {
    pub fn from_years(parsed: &ParsedYears) -> Self {
        let mut matches_per_season = BTreeMap::new();
        for year in parsed.years.iter().flatten() {
            *matches_per_season.entry(*year).or_insert(0usize) += 1;
        }

        // BTreeMap iterates in ascending year order, so strict comparisons keep the earliest year.
        let mut peak: Option<(i32, usize)> = None;
        let mut trough: Option<(i32, usize)> = None;
        for (&year, &count) in &matches_per_season {
            if peak.map_or(true, |(_, best)| count > best) {
                peak = Some((year, count));
            }
            if trough.map_or(true, |(_, worst)| count < worst) {
                trough = Some((year, count));
            }
        }

        let mean = if matches_per_season.is_empty() {
            None
        } else {
            let total: usize = matches_per_season.values().sum();
            Some(round1(total as f64 / matches_per_season.len() as f64))
        };

        debug!("{} seasons derived from dates", matches_per_season.len());

        Self {
            matches_per_season,
            peak,
            trough,
            mean,
            used_fallback: parsed.used_fallback,
        }
    }

    /// First and last season, if any date parsed.
    pub fn range(&self) -> Option<(i32, i32)> {
        let first = self.matches_per_season.keys().next()?;
        let last = self.matches_per_season.keys().next_back()?;
        Some((*first, *last))
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
