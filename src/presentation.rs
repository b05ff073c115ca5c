//! Views: dispatch from a selected analysis to renderable panels.
//!
//! Each view is a pure function of the dataset. Failures inside a view become
//! error or notice panels of that view, so one broken view never affects the
//! others.

use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::analysis::{
    rank_players, result_distribution, team_count, toss_distribution, venue_frequency,
    win_counts, win_margins, CategoryCount, CategoryShare, PlayerMetric,
};
use crate::config::DisplayConfig;
use crate::error::{DashboardError, Result};
use crate::seasons::{parse_years, SeasonSummary};
use crate::types::{Capability, Dataset, MatchRecord, Table};

/// Analysis types offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Overview,
    TeamPerformance,
    PlayerStatistics,
    SeasonalTrends,
    MatchAnalysis,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Overview,
        View::TeamPerformance,
        View::PlayerStatistics,
        View::SeasonalTrends,
        View::MatchAnalysis,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::TeamPerformance => "team_performance",
            View::PlayerStatistics => "player_statistics",
            View::SeasonalTrends => "seasonal_trends",
            View::MatchAnalysis => "match_analysis",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::TeamPerformance => "Team Performance",
            View::PlayerStatistics => "Player Statistics",
            View::SeasonalTrends => "Seasonal Trends",
            View::MatchAnalysis => "Match Analysis",
        }
    }
}

impl FromStr for View {
    type Err = DashboardError;

    /// Accepts titles and snake/kebab ids, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        View::ALL
            .into_iter()
            .find(|v| v.id().replace('_', "") == key)
            .ok_or_else(|| DashboardError::UnknownView(s.to_string()))
    }
}

/// One category/value pair of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub category: String,
    pub value: f64,
}

/// Ordered data for a bar, line, or horizontal-bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSpec {
    fn from_counts(title: String, x_label: &str, y_label: &str, counts: &[CategoryCount]) -> Self {
        Self {
            title,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points: counts
                .iter()
                .map(|c| ChartPoint {
                    category: c.label.clone(),
                    value: c.count as f64,
                })
                .collect(),
        }
    }
}

/// A labelled figure, optionally with a secondary line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

impl Metric {
    fn new(label: impl Into<String>, value: impl ToString) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
            delta: None,
        }
    }

    fn with_delta(mut self, delta: impl Into<String>) -> Self {
        self.delta = Some(delta.into());
        self
    }
}

/// A renderable unit of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Panel {
    BarChart(ChartSpec),
    LineChart(ChartSpec),
    HorizontalBarChart(ChartSpec),
    Metrics {
        title: String,
        metrics: Vec<Metric>,
    },
    Table {
        title: String,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// A sub-view that was left out, with the reason
    Notice { title: String, message: String },
    /// A view that could not be computed
    Error {
        title: String,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        sample: Vec<String>,
    },
}

impl Panel {
    fn omitted(title: &str, table: &str, column: String) -> Self {
        Panel::Notice {
            title: title.to_string(),
            message: DashboardError::missing_column(table, column).to_string(),
        }
    }

    fn error(title: &str, err: &DashboardError) -> Self {
        Panel::Error {
            title: title.to_string(),
            message: err.to_string(),
            sample: err.sample().to_vec(),
        }
    }
}

/// Rendered output of one view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewReport {
    pub view: View,
    pub title: String,
    pub panels: Vec<Panel>,
}

/// Render a view. Never fails; errors inside the view become panels.
pub fn render_view(view: View, dataset: &Dataset, display: &DisplayConfig) -> ViewReport {
    let panels = match view {
        View::Overview => Ok(overview(dataset, display)),
        View::TeamPerformance => Ok(team_performance(&dataset.matches, display)),
        View::PlayerStatistics => Ok(player_statistics(dataset, display)),
        View::SeasonalTrends => seasonal_trends(&dataset.matches, display),
        View::MatchAnalysis => Ok(match_analysis(&dataset.matches, display)),
    };

    let panels = panels.unwrap_or_else(|err| {
        warn!("View '{}' failed: {}", view.title(), err);
        vec![Panel::error(view.title(), &err)]
    });

    ViewReport {
        view,
        title: view.title().to_string(),
        panels,
    }
}

fn share_metrics(shares: &[CategoryShare]) -> Vec<Metric> {
    shares
        .iter()
        .map(|s| Metric::new(s.label.clone(), format!("{} ({:.1}%)", s.count, s.percentage)))
        .collect()
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Seasons derived from a parsed copy of the date column.
///
/// `Absent` when there is no date column; `DateParse` when no value can be read.
pub fn season_summary(
    matches: &Table<MatchRecord>,
    sample_size: usize,
) -> Result<Capability<SeasonSummary>> {
    if let Capability::Absent { column } = matches.require("date") {
        return Ok(Capability::Absent { column });
    }

    let dates: Vec<Option<&str>> = matches.rows.iter().map(|m| m.date.as_deref()).collect();
    let parsed = parse_years(&dates, sample_size)?;
    debug!("Parsed {} of {} match dates", parsed.parsed_count(), dates.len());
    Ok(Capability::Present(SeasonSummary::from_years(&parsed)))
}

fn overview(dataset: &Dataset, display: &DisplayConfig) -> Vec<Panel> {
    let matches = &dataset.matches;
    let deliveries = &dataset.deliveries;

    let mut metrics = vec![
        Metric::new("Total Matches", matches.len()),
        Metric::new("Total Deliveries", deliveries.len()),
    ];
    if let Capability::Present(teams) = team_count(matches) {
        metrics.push(Metric::new("Teams", teams));
    }

    let shape = |(rows, cols): (usize, usize)| format!("({}, {})", rows, cols);
    let mut info_rows = vec![
        vec![
            "Matches".to_string(),
            shape(matches.shape()),
            matches.columns.join(", "),
        ],
        vec![
            "Deliveries".to_string(),
            shape(deliveries.shape()),
            deliveries.columns.join(", "),
        ],
    ];

    // The season range is informational; a date failure belongs to the Seasonal Trends view.
    if let Ok(Capability::Present(summary)) = season_summary(matches, display.date_sample) {
        if let Some((first, last)) = summary.range() {
            info_rows.push(vec![
                "Date Range".to_string(),
                format!("{}-{}", first, last),
                String::new(),
            ]);
        }
    }

    let preview = |title: &str, columns: &[String], rows: &[Vec<String>]| Panel::Table {
        title: title.to_string(),
        headers: columns.to_vec(),
        rows: rows.iter().take(display.preview_rows).cloned().collect(),
    };

    vec![
        Panel::Metrics {
            title: "Dataset Overview".to_string(),
            metrics,
        },
        Panel::Table {
            title: "Dataset Information".to_string(),
            headers: vec!["Dataset".to_string(), "Shape".to_string(), "Columns".to_string()],
            rows: info_rows,
        },
        preview("Matches Dataset", &matches.columns, &matches.preview),
        preview("Deliveries Dataset", &deliveries.columns, &deliveries.preview),
    ]
}

fn team_performance(matches: &Table<MatchRecord>, display: &DisplayConfig) -> Vec<Panel> {
    let mut panels = Vec::new();

    match win_counts(matches, display.top_n) {
        Capability::Present(wins) => {
            panels.push(Panel::BarChart(ChartSpec::from_counts(
                format!("Top {} Winning Teams", display.top_n),
                "Team",
                "Number of Wins",
                &wins,
            )));
            panels.push(Panel::Table {
                title: format!("Top {} Teams by Wins", display.leaders),
                headers: vec!["Rank".to_string(), "Team".to_string(), "Wins".to_string()],
                rows: wins
                    .iter()
                    .take(display.leaders)
                    .enumerate()
                    .map(|(i, w)| vec![(i + 1).to_string(), w.label.clone(), w.count.to_string()])
                    .collect(),
            });
        }
        Capability::Absent { column } => {
            panels.push(Panel::omitted("Top Winning Teams", matches.name, column))
        }
    }

    match toss_distribution(matches) {
        Capability::Present(toss) => panels.push(Panel::Metrics {
            title: "Toss Decision Preference".to_string(),
            metrics: share_metrics(&toss),
        }),
        Capability::Absent { column } => {
            panels.push(Panel::omitted("Toss Decision Preference", matches.name, column))
        }
    }

    panels
}

fn player_statistics(dataset: &Dataset, display: &DisplayConfig) -> Vec<Panel> {
    let players = &dataset.player_stats;
    if players.is_empty() {
        return vec![Panel::Notice {
            title: "Top Performers".to_string(),
            message: "No player statistics available".to_string(),
        }];
    }

    [
        ("Top Run Scorers", PlayerMetric::TotalRuns),
        ("Best Strike Rates", PlayerMetric::StrikeRate),
    ]
    .into_iter()
    .map(|(title, metric)| match rank_players(players, metric, display.top_n) {
        Capability::Present(ranked) => Panel::Table {
            title: title.to_string(),
            headers: vec!["batsman".to_string(), metric.column().to_string()],
            rows: ranked
                .iter()
                .map(|p| vec![p.batsman.clone(), format_number(p.value)])
                .collect(),
        },
        Capability::Absent { column } => Panel::omitted(title, players.name, column),
    })
    .collect()
}

fn seasonal_trends(matches: &Table<MatchRecord>, display: &DisplayConfig) -> Result<Vec<Panel>> {
    let summary = match season_summary(matches, display.date_sample)? {
        Capability::Present(summary) => summary,
        Capability::Absent { column } => {
            return Ok(vec![Panel::omitted(
                "Matches Played Per Season",
                matches.name,
                column,
            )]);
        }
    };

    let chart = ChartSpec {
        title: "Matches Played Per Season".to_string(),
        x_label: "Year".to_string(),
        y_label: "Number of Matches".to_string(),
        points: summary
            .matches_per_season
            .iter()
            .map(|(year, count)| ChartPoint {
                category: year.to_string(),
                value: *count as f64,
            })
            .collect(),
    };

    let mut metrics = Vec::new();
    if let Some((year, count)) = summary.peak {
        metrics.push(Metric::new("Peak Season", year).with_delta(format!("{} matches", count)));
    }
    if let Some((year, count)) = summary.trough {
        metrics.push(Metric::new("Lowest Season", year).with_delta(format!("{} matches", count)));
    }
    if let Some(mean) = summary.mean {
        metrics.push(Metric::new("Average per Season", "").with_delta(format!("{:.1} matches", mean)));
    }

    Ok(vec![
        Panel::LineChart(chart),
        Panel::Metrics {
            title: "Season Statistics".to_string(),
            metrics,
        },
    ])
}

fn match_analysis(matches: &Table<MatchRecord>, display: &DisplayConfig) -> Vec<Panel> {
    let mut panels = Vec::new();

    match venue_frequency(matches, display.top_n) {
        Capability::Present(venues) => panels.push(Panel::HorizontalBarChart(ChartSpec::from_counts(
            format!("Top {} Venues by Number of Matches", display.top_n),
            "Venue",
            "Number of Matches",
            &venues,
        ))),
        Capability::Absent { column } => {
            panels.push(Panel::omitted("Top Venues", matches.name, column))
        }
    }

    match result_distribution(matches) {
        Capability::Present(results) => panels.push(Panel::Metrics {
            title: "Match Results Distribution".to_string(),
            metrics: share_metrics(&results),
        }),
        Capability::Absent { column } => {
            panels.push(Panel::omitted("Match Results Distribution", matches.name, column))
        }
    }

    match win_margins(matches) {
        Capability::Present(margins) => {
            let mut metrics = Vec::new();
            if let Some(mean) = margins.by_runs_mean {
                metrics.push(Metric::new("Average win by runs", format!("{:.1}", mean)));
            }
            if let Some(max) = margins.by_runs_max {
                metrics.push(Metric::new("Highest win by runs", max));
            }
            if let Some(mean) = margins.by_wickets_mean {
                metrics.push(Metric::new("Average win by wickets", format!("{:.1}", mean)));
            }
            panels.push(Panel::Metrics {
                title: "Win Margins".to_string(),
                metrics,
            });
        }
        Capability::Absent { column } => {
            panels.push(Panel::omitted("Win Margins", matches.name, column))
        }
    }

    panels
}

/// Widest bar drawn in text output
const BAR_WIDTH: usize = 40;

fn write_chart(out: &mut String, chart: &ChartSpec) {
    let _ = writeln!(out, "=== {} ===", chart.title);
    let _ = writeln!(out, "  ({} / {})", chart.x_label, chart.y_label);
    let max = chart.points.iter().map(|p| p.value).fold(0.0, f64::max);
    let label_width = chart.points.iter().map(|p| p.category.len()).max().unwrap_or(0);
    for point in &chart.points {
        let bar = if max > 0.0 {
            (point.value / max * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "  {:<width$}  {:>6}  {}",
            point.category,
            format_number(point.value),
            "#".repeat(bar),
            width = label_width
        );
    }
}

/// Plain-text rendering of a report, for the CLI.
pub fn render_text(report: &ViewReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "##### {} #####", report.title);
    let _ = writeln!(out);

    for panel in &report.panels {
        match panel {
            Panel::BarChart(chart) | Panel::LineChart(chart) | Panel::HorizontalBarChart(chart) => {
                write_chart(&mut out, chart)
            }
            Panel::Metrics { title, metrics } => {
                let _ = writeln!(out, "=== {} ===", title);
                for m in metrics {
                    match &m.delta {
                        Some(delta) if m.value.is_empty() => {
                            let _ = writeln!(out, "  {}: {}", m.label, delta);
                        }
                        Some(delta) => {
                            let _ = writeln!(out, "  {}: {} ({})", m.label, m.value, delta);
                        }
                        None => {
                            let _ = writeln!(out, "  {}: {}", m.label, m.value);
                        }
                    }
                }
            }
            Panel::Table { title, headers, rows } => {
                let _ = writeln!(out, "=== {} ===", title);
                let _ = writeln!(out, "  {}", headers.join(" | "));
                let _ = writeln!(out, "  {}", "-".repeat(headers.join(" | ").len()));
                for row in rows {
                    let _ = writeln!(out, "  {}", row.join(" | "));
                }
            }
            Panel::Notice { title, message } => {
                let _ = writeln!(out, "=== {} ===", title);
                let _ = writeln!(out, "  {}", message);
            }
            Panel::Error { title, message, sample } => {
                let _ = writeln!(out, "=== {} (error) ===", title);
                let _ = writeln!(out, "  {}", message);
                if !sample.is_empty() {
                    let _ = writeln!(out, "  Sample values: {:?}", sample);
                }
            }
        }
        let _ = writeln!(out);
    }

    out
}
