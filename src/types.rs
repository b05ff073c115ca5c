//! Dataset records, tables, and API response types.

use serde::Serialize;
use std::fmt;

/// Toss decision made by the toss-winning team
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TossDecision {
    Bat,
    Field,
    Other(String),
}

impl TossDecision {
    /// Case-insensitive: "Bat" and "bat" are the same decision.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "bat" => TossDecision::Bat,
            "field" => TossDecision::Field,
            _ => TossDecision::Other(s.trim().to_string()),
        }
    }

    /// Title-cased label ("Bat", "Field").
    pub fn label(&self) -> String {
        match self {
            TossDecision::Bat => "Bat".to_string(),
            TossDecision::Field => "Field".to_string(),
            TossDecision::Other(raw) => title_case(raw),
        }
    }
}

/// Result type of a match
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    Normal,
    Tie,
    NoResult,
    Other(String),
}

impl MatchOutcome {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "normal" => MatchOutcome::Normal,
            "tie" => MatchOutcome::Tie,
            "no result" => MatchOutcome::NoResult,
            _ => MatchOutcome::Other(s.trim().to_string()),
        }
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Normal => write!(f, "normal"),
            MatchOutcome::Tie => write!(f, "tie"),
            MatchOutcome::NoResult => write!(f, "no result"),
            MatchOutcome::Other(raw) => write!(f, "{}", raw),
        }
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// One played match
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct MatchRecord {
    pub id: Option<i64>,
    pub city: Option<String>,
    pub date: Option<String>,
    pub team1: Option<String>,
    pub team2: Option<String>,
    pub toss_winner: Option<String>,
    pub toss_decision: Option<TossDecision>,
    pub result: Option<MatchOutcome>,
    pub winner: Option<String>,
    pub win_by_runs: Option<i64>,
    pub win_by_wickets: Option<i64>,
    pub venue: Option<String>,
}

impl MatchRecord {
    /// Both margins positive, which a well-formed record never has.
    pub fn has_conflicting_margins(&self) -> bool {
        self.win_by_runs.unwrap_or(0) > 0 && self.win_by_wickets.unwrap_or(0) > 0
    }
}

/// One ball bowled. Deliveries are only counted, so few columns are kept.
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct DeliveryRecord {
    pub match_id: Option<i64>,
    pub inning: Option<i64>,
    pub batting_team: Option<String>,
    pub player_dismissed: Option<String>,
}

/// Precomputed per-player batting figures
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct PlayerStat {
    pub batsman: Option<String>,
    pub total_runs: Option<f64>,
    pub out: Option<f64>,
    pub balls: Option<f64>,
    pub average: Option<f64>,
    pub strikerate: Option<f64>,
}

/// Outcome of a column-presence check.
#[derive(Debug, Clone, PartialEq)]
pub enum Capability<T> {
    Present(T),
    Absent { column: String },
}

impl<T> Capability<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Capability<U> {
        match self {
            Capability::Present(value) => Capability::Present(f(value)),
            Capability::Absent { column } => Capability::Absent { column },
        }
    }
}

#[cfg(test)]
impl<T> Capability<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Capability::Present(_))
    }

    /// Convert to a `MissingColumn` error on absence.
    pub fn into_result(self, table: &str) -> crate::error::Result<T> {
        match self {
            Capability::Present(value) => Ok(value),
            Capability::Absent { column } => {
                Err(crate::error::DashboardError::missing_column(table, column))
            }
        }
    }

    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        match self {
            Capability::Present(value) => value,
            Capability::Absent { .. } => T::default(),
        }
    }
}

/// Loaded, immutable tabular input.
#[derive(Debug, Clone)]
pub struct Table<R> {
    pub name: &'static str,
    pub columns: Vec<String>,
    pub rows: Vec<R>,
    /// Leading rows rendered as text, for the raw data preview
    pub preview: Vec<Vec<String>>,
}

impl<R> Table<R> {
    pub fn new(name: &'static str, columns: Vec<String>, rows: Vec<R>) -> Self {
        Self {
            name,
            columns,
            rows,
            preview: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn require(&self, name: &str) -> Capability<()> {
        if self.has_column(name) {
            Capability::Present(())
        } else {
            Capability::Absent {
                column: name.to_string(),
            }
        }
    }

    /// Non-null values of a column, or `Absent` when the column is not in the file.
    pub fn column<T, F>(&self, name: &str, extract: F) -> Capability<Vec<T>>
    where
        F: Fn(&R) -> Option<T>,
    {
        self.require(name)
            .map(|_| self.rows.iter().filter_map(extract).collect())
    }
}

/// The three input tables of one session.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub matches: Table<MatchRecord>,
    pub deliveries: Table<DeliveryRecord>,
    pub player_stats: Table<PlayerStat>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Entry in the view listing
#[derive(Debug, Serialize)]
pub struct ViewSummary {
    pub id: String,
    pub title: String,
}

/// Shape and columns of one loaded table
#[derive(Debug, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

impl<R> From<&Table<R>> for TableInfo {
    fn from(table: &Table<R>) -> Self {
        Self {
            name: table.name.to_string(),
            rows: table.len(),
            columns: table.columns.clone(),
        }
    }
}

/// Dataset info response
#[derive(Debug, Serialize)]
pub struct DatasetInfoResponse {
    pub tables: Vec<TableInfo>,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;

    #[test]
    fn test_toss_decision_parsing() {
        assert_eq!(TossDecision::parse("bat"), TossDecision::Bat);
        assert_eq!(TossDecision::parse(" Field "), TossDecision::Field);
        assert_eq!(
            TossDecision::parse("bowl first"),
            TossDecision::Other("bowl first".to_string())
        );
        assert_eq!(TossDecision::Field.label(), "Field");
        assert_eq!(TossDecision::parse("bowl first").label(), "Bowl First");
    }

    #[test]
    fn test_match_outcome_round_trips_label() {
        assert_eq!(MatchOutcome::parse("no result"), MatchOutcome::NoResult);
        assert_eq!(MatchOutcome::NoResult.to_string(), "no result");
        assert_eq!(MatchOutcome::parse("Tie"), MatchOutcome::Tie);
    }

    #[test]
    fn test_conflicting_margins() {
        let record = MatchRecord {
            win_by_runs: Some(10),
            win_by_wickets: Some(0),
            ..Default::default()
        };
        assert!(!record.has_conflicting_margins());

        let record = MatchRecord {
            win_by_runs: Some(10),
            win_by_wickets: Some(3),
            ..Default::default()
        };
        assert!(record.has_conflicting_margins());
    }

    #[test]
    fn test_column_capability() {
        let table = Table::new(
            "player statistics",
            vec!["batsman".to_string(), "total_runs".to_string()],
            vec![
                PlayerStat {
                    batsman: Some("A".to_string()),
                    total_runs: Some(100.0),
                    ..Default::default()
                },
                PlayerStat {
                    batsman: Some("B".to_string()),
                    total_runs: None,
                    ..Default::default()
                },
            ],
        );

        let runs = table.column("total_runs", |p| p.total_runs);
        assert_eq!(runs, Capability::Present(vec![100.0]));

        let sr = table.column("strikerate", |p| p.strikerate);
        assert!(!sr.is_present());
        assert!(matches!(
            sr.into_result(table.name),
            Err(DashboardError::MissingColumn { .. })
        ));
        assert_eq!(table.shape(), (2, 2));
    }
}
