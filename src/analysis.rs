//! Aggregations over the loaded tables.
//!
//! Every function here is a pure read of a `Table`; derived values are built
//! in fresh collections and the source rows are never touched.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::seasons::round1;
use crate::types::{Capability, MatchRecord, PlayerStat, Table};

/// A category and how many rows fall into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// A category count with its share of all matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub label: String,
    pub count: usize,
    /// Percentage of total matches, one decimal place
    pub percentage: f64,
}

/// Count occurrences per category, sorted by count descending.
///
/// Ties keep the order in which categories were first seen.
pub fn count_by<I, S>(values: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();

    for value in values {
        let label = value.as_ref();
        match index.get(label) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(label.to_string(), counts.len());
                counts.push(CategoryCount {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Attach percentages relative to `total` rows.
pub fn with_shares(counts: Vec<CategoryCount>, total: usize) -> Vec<CategoryShare> {
    counts
        .into_iter()
        .map(|c| {
            let percentage = if total > 0 {
                round1(c.count as f64 / total as f64 * 100.0)
            } else {
                0.0
            };
            CategoryShare {
                label: c.label,
                count: c.count,
                percentage,
            }
        })
        .collect()
}

/// Top `n` winners by number of wins. Matches without a winner are skipped.
pub fn win_counts(matches: &Table<MatchRecord>, n: usize) -> Capability<Vec<CategoryCount>> {
    matches
        .column("winner", |m| m.winner.clone())
        .map(|winners| count_by(winners).into_iter().take(n).collect())
}

/// Share of matches per toss decision.
pub fn toss_distribution(matches: &Table<MatchRecord>) -> Capability<Vec<CategoryShare>> {
    matches
        .column("toss_decision", |m| m.toss_decision.as_ref().map(|d| d.label()))
        .map(|decisions| with_shares(count_by(decisions), matches.len()))
}

/// Share of matches per result type.
pub fn result_distribution(matches: &Table<MatchRecord>) -> Capability<Vec<CategoryShare>> {
    matches
        .column("result", |m| m.result.as_ref().map(|r| r.to_string()))
        .map(|results| with_shares(count_by(results), matches.len()))
}

/// Top `n` venues by number of matches hosted.
pub fn venue_frequency(matches: &Table<MatchRecord>, n: usize) -> Capability<Vec<CategoryCount>> {
    matches
        .column("venue", |m| m.venue.clone())
        .map(|venues| count_by(venues).into_iter().take(n).collect())
}

/// Number of distinct teams appearing as `team1`.
pub fn team_count(matches: &Table<MatchRecord>) -> Capability<usize> {
    matches
        .column("team1", |m| m.team1.clone())
        .map(|teams| teams.into_iter().collect::<HashSet<String>>().len())
}

/// Player-table columns that can be ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerMetric {
    TotalRuns,
    StrikeRate,
}

impl PlayerMetric {
    pub fn column(&self) -> &'static str {
        match self {
            PlayerMetric::TotalRuns => "total_runs",
            PlayerMetric::StrikeRate => "strikerate",
        }
    }

    fn value(&self, player: &PlayerStat) -> Option<f64> {
        match self {
            PlayerMetric::TotalRuns => player.total_runs,
            PlayerMetric::StrikeRate => player.strikerate,
        }
    }
}

/// A player and one ranked figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerValue {
    pub batsman: String,
    pub value: f64,
}

/// Top `n` players by `metric`, or `Absent` when either the name or metric column is missing.
///
/// Rows with no value or a NaN value are skipped. Ties keep input order.
pub fn rank_players(
    players: &Table<PlayerStat>,
    metric: PlayerMetric,
    n: usize,
) -> Capability<Vec<PlayerValue>> {
    if let Capability::Absent { column } = players.require("batsman") {
        return Capability::Absent { column };
    }

    players
        .column(metric.column(), |p| {
            let value = metric.value(p).filter(|v| !v.is_nan())?;
            Some(PlayerValue {
                batsman: p.batsman.clone().unwrap_or_default(),
                value,
            })
        })
        .map(|mut ranked| {
            ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
            ranked.truncate(n);
            ranked
        })
}

/// Summary of victory margins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WinMargins {
    /// Mean over matches won by runs; `None` when there are none
    pub by_runs_mean: Option<f64>,
    pub by_runs_max: Option<i64>,
    /// Mean over matches won by wickets; `None` when there are none
    pub by_wickets_mean: Option<f64>,
}

fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
    }
}

/// Win-margin statistics; requires both margin columns.
pub fn win_margins(matches: &Table<MatchRecord>) -> Capability<WinMargins> {
    let runs = matches.column("win_by_runs", |m| m.win_by_runs.filter(|r| *r > 0));
    let wickets = matches.column("win_by_wickets", |m| m.win_by_wickets.filter(|w| *w > 0));

    match (runs, wickets) {
        (Capability::Present(runs), Capability::Present(wickets)) => {
            Capability::Present(WinMargins {
                by_runs_mean: mean(&runs),
                by_runs_max: runs.iter().copied().max(),
                by_wickets_mean: mean(&wickets),
            })
        }
        (Capability::Absent { column }, _) | (_, Capability::Absent { column }) => {
            Capability::Absent { column }
        }
    }
}
