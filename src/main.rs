//! IPL Dashboard
//!
//! REST API and CLI over the IPL match, delivery, and player statistics datasets.

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod presentation;
mod routes;
mod seasons;
mod types;

use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::loader::{DataPaths, DatasetCache};
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for view output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ipl_dashboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_dir,
        } => run_server(host, port, data_dir).await,
        Commands::Show {
            view,
            format,
            data_dir,
        } => cli::run_show(view, format, data_dir),
        Commands::Views => {
            cli::run_views();
            Ok(())
        }
    }
}

/// Run the API server.
async fn run_server(
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    // Load configuration
    let mut config = cli::load_config(data_dir)?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("Data directory: {}", config.data.dir);

    // Missing data halts startup
    let cache = DatasetCache::new(DataPaths::from(&config.data), config.display.preview_rows);
    let dataset = cache.get()?;
    tracing::info!(
        "Dataset loaded: {} matches, {} deliveries, {} players",
        dataset.matches.len(),
        dataset.deliveries.len(),
        dataset.player_stats.len()
    );

    // Create application state
    let state = Arc::new(AppState {
        cache,
        config: config.clone(),
    });

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/views", get(routes::list_views))
        .route("/views/{view}", get(routes::view))
        .route("/dataset", get(routes::dataset_info))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
