//! API route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::DashboardError;
use crate::loader::DatasetCache;
use crate::presentation::{render_view, View, ViewReport};
use crate::types::{
    Dataset, DatasetInfoResponse, ErrorResponse, HealthResponse, TableInfo, ViewSummary,
};

/// Application state shared across handlers.
pub struct AppState {
    pub cache: DatasetCache,
    pub config: AppConfig,
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        let status = match err {
            DashboardError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            DashboardError::UnknownView(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Fetch the memoized dataset on a blocking worker.
async fn dataset(state: &Arc<AppState>) -> Result<Arc<Dataset>, ApiError> {
    let state = Arc::clone(state);
    let loaded = tokio::task::spawn_blocking(move || state.cache.get())
        .await
        .map_err(|e| ApiError::internal(format!("Dataset load task failed: {}", e)))?;
    Ok(loaded?)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Available views.
pub async fn list_views() -> Json<Vec<ViewSummary>> {
    Json(
        View::ALL
            .iter()
            .map(|v| ViewSummary {
                id: v.id().to_string(),
                title: v.title().to_string(),
            })
            .collect(),
    )
}

/// Render one view.
pub async fn view(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ViewReport>, ApiError> {
    let view: View = name.parse()?;
    let dataset = dataset(&state).await?;

    tracing::debug!("Rendering view: {}", view.title());
    Ok(Json(render_view(view, &dataset, &state.config.display)))
}

/// Shapes and columns of the loaded tables.
pub async fn dataset_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DatasetInfoResponse>, ApiError> {
    let dataset = dataset(&state).await?;

    Ok(Json(DatasetInfoResponse {
        tables: vec![
            TableInfo::from(&dataset.matches),
            TableInfo::from(&dataset.deliveries),
            TableInfo::from(&dataset.player_stats),
        ],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::{write_dataset, PLAYERS_CSV};
    use crate::loader::DataPaths;
    use crate::presentation::Panel;

    fn state(paths: DataPaths) -> Arc<AppState> {
        Arc::new(AppState {
            cache: DatasetCache::new(paths, 5),
            config: AppConfig::default(),
        })
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_list_views() {
        let Json(views) = list_views().await;
        assert_eq!(views.len(), 5);
        assert_eq!(views[3].id, "seasonal_trends");
        assert_eq!(views[3].title, "Seasonal Trends");
    }

    #[tokio::test]
    async fn test_view_renders_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(write_dataset(dir.path(), PLAYERS_CSV));

        let Json(report) = view(State(state), Path("Team Performance".to_string()))
            .await
            .unwrap();
        assert_eq!(report.view, View::TeamPerformance);
        assert!(matches!(&report.panels[0], Panel::BarChart(c) if c.points[0].category == "A"));
    }

    #[tokio::test]
    async fn test_unknown_view_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(write_dataset(dir.path(), PLAYERS_CSV));

        let err = view(State(state), Path("betting".to_string())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_data_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path(), PLAYERS_CSV);
        std::fs::remove_file(&paths.matches).unwrap();

        let err = dataset_info(State(state(paths))).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.message.contains("matches.csv"));
    }

    #[tokio::test]
    async fn test_dataset_info() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(write_dataset(dir.path(), PLAYERS_CSV));

        let Json(info) = dataset_info(State(state)).await.unwrap();
        assert_eq!(info.tables.len(), 3);
        assert_eq!(info.tables[0].rows, 3);
        assert_eq!(info.tables[1].rows, 4);
        assert!(info.tables[2].columns.contains(&"strikerate".to_string()));
    }
}
