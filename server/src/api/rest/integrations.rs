//! Google Drive integration routes
//!
//! Linking (OAuth), connection status, Drive browsing and the import
//! endpoint itself.

use crate::api::AppState;
use crate::db::{folders, integrations};
use crate::drive::{
    self,
    client::DriveClient,
    oauth::GoogleOAuth,
    types::{ConnectionStatus, RemoteItem},
    ImportRequest, LocalStore, QuotaLimits, RemoteError, RemoteProvider,
};
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use base64::Engine;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{extract_user_id, AppError};

pub fn integration_routes() -> Router<AppState> {
    Router::new()
        .route("/integrations/google/link", post(link))
        .route("/integrations/google/callback", get(callback))
        .route("/integrations/google/status", get(status))
        .route("/integrations/google/disconnect", delete(disconnect))
        .route("/integrations/google/files", get(list_files))
        .route("/integrations/google/import", post(import))
}

const STATE_B64: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// OAuth `state` payload: round-trips the initiating user through Google.
#[derive(Serialize, Deserialize)]
struct LinkState {
    user_id: Uuid,
    nonce: String,
}

fn encode_state(user_id: Uuid) -> Result<String, AppError> {
    let nonce_bytes: [u8; 16] = rand::random();
    let nonce: String = nonce_bytes.iter().map(|b| format!("{:02x}", b)).collect();
    let json = serde_json::to_vec(&LinkState { user_id, nonce })
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(STATE_B64.encode(json))
}

fn decode_state(state: &str) -> Result<LinkState, AppError> {
    let bytes = STATE_B64
        .decode(state)
        .map_err(|_| AppError::BadRequest("Invalid state parameter".into()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| AppError::BadRequest("Invalid state parameter".into()))
}

/// Build the production provider for a linked account, or fail with 401
/// when no integration row exists.
async fn drive_client(state: &AppState, user_id: Uuid) -> Result<DriveClient, AppError> {
    let integration =
        integrations::get_by_user_and_provider(&state.db, user_id, drive::PROVIDER_NAME)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("Google Drive account is not linked".into())
            })?;

    let oauth = GoogleOAuth::new(state.http.clone(), &state.config);
    Ok(DriveClient::new(
        state.http.clone(),
        state.db.clone(),
        oauth,
        integration,
    ))
}

fn map_remote_error(err: RemoteError) -> AppError {
    match err {
        RemoteError::Auth(msg) => {
            tracing::warn!("Drive request rejected: {}", msg);
            AppError::Unauthorized("Google Drive authorization expired; relink the account".into())
        }
        other => AppError::Internal(other.to_string()),
    }
}

#[derive(Serialize)]
struct LinkResponse {
    authorization_url: String,
}

async fn link(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LinkResponse>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let oauth = GoogleOAuth::new(state.http.clone(), &state.config);
    let authorization_url = oauth.authorization_url(&encode_state(user_id)?)?;

    Ok(Json(LinkResponse { authorization_url }))
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: String,
    state: String,
}

#[derive(Serialize)]
struct CallbackResponse {
    connected: bool,
    provider_email: Option<String>,
}

/// OAuth callback: Google redirects here after consent. Unauthenticated;
/// the user is identified by the state parameter minted in `link`.
async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<CallbackResponse>, AppError> {
    let link_state = decode_state(&query.state)?;

    let oauth = GoogleOAuth::new(state.http.clone(), &state.config);
    let tokens = oauth
        .exchange_code(&query.code)
        .await
        .map_err(|e| AppError::BadRequest(format!("Code exchange failed: {e}")))?;

    let user_info = oauth.get_user_info(&tokens.access_token).await?;
    let token_expiry = Utc::now() + Duration::seconds(tokens.expires_in.unwrap_or(3600));

    let integration = integrations::upsert(
        &state.db,
        link_state.user_id,
        drive::PROVIDER_NAME,
        &tokens.access_token,
        tokens.refresh_token.as_deref(),
        Some(token_expiry),
        None,
        user_info.email.as_deref(),
    )
    .await?;

    tracing::info!(user = %link_state.user_id, "Google Drive account linked");

    Ok(Json(CallbackResponse {
        connected: true,
        provider_email: integration.provider_email,
    }))
}

async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ConnectionStatus>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let integration =
        integrations::get_by_user_and_provider(&state.db, user_id, drive::PROVIDER_NAME).await?;

    Ok(Json(match integration {
        Some(integration) => ConnectionStatus {
            connected: true,
            user_email: integration.provider_email,
        },
        None => ConnectionStatus {
            connected: false,
            user_email: None,
        },
    }))
}

async fn disconnect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    integrations::delete_by_user_and_provider(&state.db, user_id, drive::PROVIDER_NAME).await?;
    tracing::info!(user = %user_id, "Google Drive account disconnected");

    Ok(Json(serde_json::json!({ "disconnected": true })))
}

#[derive(Deserialize)]
struct ListFilesQuery {
    folder_id: Option<String>,
    page_token: Option<String>,
}

#[derive(Serialize)]
struct ListFilesResponse {
    files: Vec<RemoteItem>,
    next_page_token: Option<String>,
}

/// Paged Drive listing for the file picker.
async fn list_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<ListFilesResponse>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;
    let client = drive_client(&state, user_id).await?;

    let page = client
        .list_children(query.folder_id.as_deref(), query.page_token.as_deref())
        .await
        .map_err(map_remote_error)?;

    Ok(Json(ListFilesResponse {
        files: page.items,
        next_page_token: page.next_cursor,
    }))
}

async fn import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ImportRequest>,
) -> Result<Json<drive::ImportReport>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    // The destination folder must exist and belong to the caller.
    if let Some(parent_id) = request.parent_folder_id {
        folders::get_folder(&state.db, parent_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Destination folder not found".into()))?;
    }

    let client = drive_client(&state, user_id).await?;
    let store = LocalStore::new(state.db.clone(), state.blob_store.clone());
    let limits = QuotaLimits {
        max_documents: state.config.max_documents_per_user,
        max_storage_bytes: state.config.max_storage_bytes_per_user,
    };

    let report = drive::run_import(&client, &store, user_id, &request, limits).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        let user_id = Uuid::new_v4();
        let encoded = encode_state(user_id).unwrap();
        let decoded = decode_state(&encoded).unwrap();
        assert_eq!(decoded.user_id, user_id);
    }

    #[test]
    fn test_state_rejects_garbage() {
        assert!(decode_state("not base64 !!!").is_err());
        let valid_b64 = STATE_B64.encode(b"{\"wrong\": \"shape\"}");
        assert!(decode_state(&valid_b64).is_err());
    }
}
