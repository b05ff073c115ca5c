//! CLI commands for ipl-dashboard.
//!
//! Supports both API server mode and one-shot view rendering.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::loader::{DataPaths, DatasetCache};
use crate::presentation::{render_text, render_view, View};

#[derive(Parser)]
#[command(name = "ipl-dashboard")]
#[command(version, about = "IPL match data dashboard: API server and CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding the CSV files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Render one view to stdout
    Show {
        /// View name (overview, team_performance, player_statistics, seasonal_trends, match_analysis)
        #[arg(value_name = "VIEW")]
        view: String,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Directory holding the CSV files
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// List available views
    Views,
}

/// Load configuration and apply a data directory override.
pub fn load_config(data_dir: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = data_dir {
        config.data.dir = dir.to_string_lossy().to_string();
    }
    Ok(config)
}

/// Render a single view from the CSV files.
pub fn run_show(view: String, format: String, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(data_dir)?;
    let view: View = view.parse()?;

    let cache = DatasetCache::new(DataPaths::from(&config.data), config.display.preview_rows);
    info!("Loading dataset from: {}", config.data.dir);
    let dataset = cache.get()?;

    let report = render_view(view, &dataset, &config.display);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "table" => {
            print!("{}", render_text(&report));
        }
        _ => {
            warn!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Print the recognized view names.
pub fn run_views() {
    for view in View::ALL {
        println!("{:20} {}", view.id(), view.title());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::parse_from(["ipl-dashboard", "show", "seasonal_trends", "-f", "json"]);
        match cli.command {
            Commands::Show { view, format, data_dir } => {
                assert_eq!(view, "seasonal_trends");
                assert_eq!(format, "json");
                assert_eq!(data_dir, None);
            }
            _ => panic!("expected show command"),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["ipl-dashboard", "serve", "-p", "9000", "-d", "data"]);
        match cli.command {
            Commands::Serve { host, port, data_dir } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
                assert_eq!(data_dir, Some(PathBuf::from("data")));
            }
            _ => panic!("expected serve command"),
        }
    }
}
