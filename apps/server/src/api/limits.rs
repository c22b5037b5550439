use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use coinpulse_core::limits::RateLimitStatus;

use crate::{
    config::LIMITED_PROVIDERS,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

async fn provider_limit(
    Path(provider): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RateLimitStatus>> {
    let provider = provider.to_ascii_lowercase();
    if !LIMITED_PROVIDERS.contains(&provider.as_str()) {
        return Err(ApiError::NotFound(format!("Unknown provider '{}'", provider)));
    }
    Ok(Json(state.rate_limiter.status(&provider)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/limits/{provider}", get(provider_limit))
}
