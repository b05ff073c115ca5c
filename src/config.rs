//! Configuration for the IPL dashboard.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Input file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: String,
    #[serde(default = "default_matches_file")]
    pub matches_file: String,
    #[serde(default = "default_deliveries_file")]
    pub deliveries_file: String,
    #[serde(default = "default_player_stats_file")]
    pub player_stats_file: String,
}

fn default_data_dir() -> String {
    ".".to_string()
}

fn default_matches_file() -> String {
    "matches.csv".to_string()
}

fn default_deliveries_file() -> String {
    "deliveries.csv".to_string()
}

fn default_player_stats_file() -> String {
    "most_runs_average_strikerate.csv".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            matches_file: default_matches_file(),
            deliveries_file: default_deliveries_file(),
            player_stats_file: default_player_stats_file(),
        }
    }
}

impl DataConfig {
    pub fn matches_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.matches_file)
    }

    pub fn deliveries_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.deliveries_file)
    }

    pub fn player_stats_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.player_stats_file)
    }
}

/// How much of each aggregation the views show
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Length of top-N rankings (teams, venues, players)
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Length of the short leaderboard under the wins chart
    #[serde(default = "default_leaders")]
    pub leaders: usize,
    /// Rows shown in the raw data preview
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    /// Raw values reported when the date column cannot be parsed
    #[serde(default = "default_date_sample")]
    pub date_sample: usize,
}

fn default_top_n() -> usize {
    10
}

fn default_leaders() -> usize {
    5
}

fn default_preview_rows() -> usize {
    5
}

fn default_date_sample() -> usize {
    5
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            leaders: default_leaders(),
            preview_rows: default_preview_rows(),
            date_sample: default_date_sample(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (IPL_SERVER__PORT, IPL_DATA__MATCHES_FILE, etc.)
            // Double underscore separates sections since field names contain underscores.
            .add_source(
                config::Environment::with_prefix("IPL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let data = DataConfig::default();
        assert_eq!(data.matches_path(), PathBuf::from("./matches.csv"));
        assert_eq!(data.deliveries_path(), PathBuf::from("./deliveries.csv"));
        assert_eq!(
            data.player_stats_path(),
            PathBuf::from("./most_runs_average_strikerate.csv")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "server": { "port": 9000 }, "display": { "top_n": 3 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.display.top_n, 3);
        assert_eq!(config.display.leaders, 5);
        assert_eq!(config.data.matches_file, "matches.csv");
    }
}
