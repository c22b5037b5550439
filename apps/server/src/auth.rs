use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::main_lib::AppState;

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingSecret,
    MissingToken,
    InvalidToken,
}

#[derive(Serialize)]
struct AuthErrorBody {
    code: u16,
    error: &'static str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingSecret => "Cron secret is not configured on this server",
            AuthError::MissingToken => "Missing bearer token",
            AuthError::InvalidToken => "Invalid bearer token",
        };
        let status = StatusCode::UNAUTHORIZED;
        let body = Json(AuthErrorBody {
            code: status.as_u16(),
            error: "AuthorizationError",
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return None;
    };
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Equality whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn check_cron_secret(secret: Option<&str>, header: Option<&str>) -> Result<(), AuthError> {
    let secret = secret.ok_or(AuthError::MissingSecret)?;
    let token = header
        .and_then(bearer_token)
        .ok_or(AuthError::MissingToken)?;
    if constant_time_eq(token.as_bytes(), secret.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}

pub async fn require_cron_secret(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if let Err(err) = check_cron_secret(state.cron_secret.as_deref(), header) {
        tracing::warn!("Rejected cron request: {:?}", err);
        return Err(err);
    }
    Ok(next.run(request).await)
}
