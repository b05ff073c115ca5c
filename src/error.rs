//! Error types for the dashboard pipeline.

use thiserror::Error;

/// Result type for dataset loading and aggregation
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Error type for dataset loading and aggregation
#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    /// A required input file is missing or unreadable
    #[error("Data file unavailable: {path}: {reason}")]
    DataUnavailable { path: String, reason: String },

    /// The date column could not be read under the strict or permissive formats
    #[error("Error parsing dates: {reason}")]
    DateParse { reason: String, sample: Vec<String> },

    /// An optional column is absent from a table
    #[error("Column '{column}' not found in {table} table")]
    MissingColumn { table: String, column: String },

    /// The requested view is not recognized
    #[error("Unknown view: {0}")]
    UnknownView(String),
}

impl DashboardError {
    pub fn data_unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Sample of offending raw values, if the error carries one.
    pub fn sample(&self) -> &[String] {
        match self {
            DashboardError::DateParse { sample, .. } => sample,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DashboardError::data_unavailable("matches.csv", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "Data file unavailable: matches.csv: No such file or directory"
        );

        let err = DashboardError::missing_column("player statistics", "strikerate");
        assert_eq!(
            err.to_string(),
            "Column 'strikerate' not found in player statistics table"
        );
    }

    #[test]
    fn test_sample_only_for_date_errors() {
        let err = DashboardError::DateParse {
            reason: "no value matched".to_string(),
            sample: vec!["not-a-date".to_string()],
        };
        assert_eq!(err.sample(), &["not-a-date".to_string()]);
        assert!(DashboardError::UnknownView("x".to_string()).sample().is_empty());
    }
}
