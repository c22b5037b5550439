use std::sync::Arc;

use axum::{
    extract::{Path, State},
    middleware,
    routing::get,
    Json, Router,
};

use coinpulse_core::refresh::{DatasetKind, RefreshResult, RefreshSummary};

use crate::{
    auth::require_cron_secret,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

// Refreshes run on their own task so a dropped connection cannot cancel one
// between persisting and invalidating.

/// Check every dataset and refresh the stale ones.
async fn refresh_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<RefreshSummary>> {
    let coordinator = state.coordinator.clone();
    let summary = tokio::spawn(async move { coordinator.refresh_all().await })
        .await
        .map_err(|e| ApiError::Internal(format!("Refresh task failed: {}", e)))?;
    if summary.any_error() {
        tracing::warn!("Cron refresh finished with errors");
    }
    Ok(Json(summary))
}

async fn refresh_dataset(
    Path(dataset): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RefreshResult>> {
    let kind: DatasetKind = dataset
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown dataset '{}'", dataset)))?;
    let coordinator = state.coordinator.clone();
    let result = tokio::spawn(async move { coordinator.check_and_refresh(kind).await })
        .await
        .map_err(|e| ApiError::Internal(format!("Refresh task failed: {}", e)))?;
    Ok(Json(result))
}

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/cron/refresh", get(refresh_all).post(refresh_all))
        .route(
            "/cron/refresh/{dataset}",
            get(refresh_dataset).post(refresh_dataset),
        )
        .route_layer(middleware::from_fn_with_state(state, require_cron_secret))
}
