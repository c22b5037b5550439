use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use coinpulse_core::{refresh::DatasetKind, utils::time_utils::is_stale};

use crate::{error::ApiResult, main_lib::AppState};

pub async fn healthz() -> &'static str {
    "ok"
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatasetStatus {
    dataset: DatasetKind,
    last_updated: Option<DateTime<Utc>>,
    interval_minutes: i64,
    stale: bool,
}

/// Last write time of each dataset against its staleness interval.
async fn refresh_status(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<DatasetStatus>>> {
    let now = Utc::now();
    let settings = state.coordinator.settings();
    let mut statuses = Vec::with_capacity(DatasetKind::ALL.len());
    for dataset in DatasetKind::ALL {
        let last_updated = state.coordinator.last_updated(dataset)?;
        let interval = settings.interval_for(dataset);
        statuses.push(DatasetStatus {
            dataset,
            last_updated,
            interval_minutes: interval.num_minutes(),
            stale: is_stale(last_updated, now, interval),
        });
    }
    Ok(Json(statuses))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(refresh_status))
}
