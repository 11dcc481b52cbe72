//! Document routes
//!
//! Upload, list, fetch, download and soft-delete. Content bytes live in the
//! blob store; upload bodies carry them base64-encoded.

use crate::api::AppState;
use crate::db::{documents, folders, shares, models::Document, models::NewDocument};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use base64::Engine;
use serde::Deserialize;
use uuid::Uuid;

use super::error::{extract_user_id, validate_name, AppError};

pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/documents", post(upload_document))
        .route("/documents", get(list_documents))
        .route("/documents/:id", get(get_document))
        .route("/documents/:id/download", get(download_document))
        .route("/documents/:id", delete(delete_document))
}

#[derive(Deserialize)]
struct UploadRequest {
    name: String,
    folder_id: Option<Uuid>,
    /// Base64-encoded file content
    content: String,
    mime_type: Option<String>,
}

#[derive(Deserialize)]
struct ListDocumentsQuery {
    folder_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    100
}

async fn upload_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UploadRequest>,
) -> Result<Json<Document>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;
    validate_name(&req.name)?;

    if let Some(folder_id) = req.folder_id {
        folders::get_folder(&state.db, folder_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Folder not found".into()))?;
    }

    let content = base64::engine::general_purpose::STANDARD
        .decode(&req.content)
        .map_err(|_| AppError::BadRequest("Invalid base64 content".into()))?;

    // Quota check mirrors the import path: count before, size with the
    // decoded length.
    let count = documents::count_documents(&state.db, user_id).await?;
    if count >= state.config.max_documents_per_user {
        return Err(AppError::BadRequest("Document quota exceeded".into()));
    }
    let stored = documents::total_size(&state.db, user_id).await?;
    if stored + content.len() as i64 > state.config.max_storage_bytes_per_user {
        return Err(AppError::BadRequest("Storage quota exceeded".into()));
    }

    let mime_type = req.mime_type.unwrap_or_else(|| {
        mime_guess::from_path(&req.name)
            .first_or_octet_stream()
            .to_string()
    });

    let content_hash = blake3::hash(&content).to_hex().to_string();
    state
        .blob_store
        .write(&content_hash, &content)
        .map_err(|e| AppError::Internal(format!("Blob write failed: {e}")))?;

    let document = documents::create_document(
        &state.db,
        &NewDocument {
            name: req.name,
            folder_id: req.folder_id,
            owner_id: user_id,
            mime_type,
            size_bytes: content.len() as i64,
            content_hash,
            source: None,
            source_id: None,
        },
    )
    .await?;

    Ok(Json(document))
}

async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;
    let limit = query.limit.clamp(1, 1000);
    let offset = query.offset.max(0);

    let documents =
        documents::list_documents(&state.db, user_id, query.folder_id, limit, offset).await?;
    Ok(Json(documents))
}

/// Fetch a document the caller owns or has a sharing grant on.
async fn readable_document(
    state: &AppState,
    id: Uuid,
    user_id: Uuid,
) -> Result<Document, AppError> {
    if let Some(document) = documents::get_document(&state.db, id, user_id).await? {
        return Ok(document);
    }
    if shares::find_document_share(&state.db, id, user_id)
        .await?
        .is_some()
    {
        if let Some(document) = documents::get_document_any(&state.db, id).await? {
            return Ok(document);
        }
    }
    Err(AppError::NotFound("Document not found".into()))
}

async fn get_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let document = readable_document(&state, id, user_id).await?;
    Ok(Json(document))
}

async fn download_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let document = readable_document(&state, id, user_id).await?;

    let content = state
        .blob_store
        .read(&document.content_hash)
        .map_err(|e| AppError::Internal(format!("Blob read failed: {e}")))?;

    let disposition = format!("attachment; filename=\"{}\"", document.name.replace('"', ""));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.mime_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    ))
}

async fn delete_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let deleted = documents::delete_document(&state.db, id, user_id).await?;
    if deleted {
        return Ok(Json(serde_json::json!({ "deleted": true })));
    }

    // Not the owner: a grant with can_delete also allows removal
    let grant = shares::find_document_share(&state.db, id, user_id).await?;
    if grant.map(|g| g.can_delete).unwrap_or(false)
        && documents::delete_document_any(&state.db, id).await?
    {
        return Ok(Json(serde_json::json!({ "deleted": true })));
    }

    Err(AppError::NotFound("Document not found".into()))
}
