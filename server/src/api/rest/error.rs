//! Error handling for REST API
//!
//! Provides the `AppError` type used across all REST endpoints and helper functions.

use crate::api::AppState;
use crate::auth;
use crate::drive::ImportError;
use crate::drive::RemoteError;
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                // Log full details server-side, return generic message to client
                tracing::error!(details = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal error: {}", err);
        AppError::Internal("An internal error occurred".to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Generic message to the client so schema details never leak
        tracing::error!("Database error: {}", err);
        AppError::Internal("An internal error occurred".to_string())
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::InvalidRequest(msg) => AppError::BadRequest(msg),
            ImportError::Remote(RemoteError::Auth(msg)) => {
                tracing::warn!("Import rejected: {}", msg);
                AppError::Unauthorized(
                    "Google Drive authorization expired; relink the account".to_string(),
                )
            }
            ImportError::Remote(other) => AppError::Internal(other.to_string()),
        }
    }
}

/// Extract user ID from Authorization header
pub fn extract_user_id(state: &AppState, headers: &axum::http::HeaderMap) -> Result<Uuid, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".into()))?;

    let user_id = auth::verify_token(&state.config.jwt_secret, token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;
    Ok(user_id)
}

/// Validate a user-supplied folder or document name.
pub fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("Name cannot be empty".into()));
    }
    if name.len() > 255 {
        return Err(AppError::BadRequest("Name too long (max 255 characters)".into()));
    }
    if name.contains('\0') || name.chars().any(|c| c.is_control()) {
        return Err(AppError::BadRequest("Name contains invalid characters".into()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(AppError::BadRequest("Name cannot contain path separators".into()));
    }
    Ok(())
}
