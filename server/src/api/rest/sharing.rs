//! Sharing routes
//!
//! Per-user grants on documents and folders. Only the owner can manage a
//! target's grants; grantees get read access through the document/folder
//! routes, plus delete when the grant carries `can_delete`.

use crate::api::AppState;
use crate::db::{
    documents, folders, shares,
    models::{DocumentShare, FolderShare},
    users,
};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::error::{extract_user_id, AppError};

pub fn sharing_routes() -> Router<AppState> {
    Router::new()
        .route("/sharing/documents", post(share_document))
        .route("/sharing/documents", get(list_document_shares))
        .route("/sharing/documents/:share_id", put(update_document_share))
        .route("/sharing/documents/:share_id", delete(delete_document_share))
        .route("/sharing/folders", post(share_folder))
        .route("/sharing/folders", get(list_folder_shares))
        .route("/sharing/folders/:share_id", put(update_folder_share))
        .route("/sharing/folders/:share_id", delete(delete_folder_share))
}

#[derive(Deserialize)]
struct ShareDocumentRequest {
    document_id: Uuid,
    user_id: Uuid,
    #[serde(default)]
    can_edit: bool,
    #[serde(default)]
    can_delete: bool,
}

#[derive(Deserialize)]
struct ShareFolderRequest {
    folder_id: Uuid,
    user_id: Uuid,
    #[serde(default)]
    can_edit: bool,
    #[serde(default)]
    can_delete: bool,
}

#[derive(Deserialize)]
struct ShareUpdateRequest {
    can_edit: Option<bool>,
    can_delete: Option<bool>,
}

#[derive(Deserialize)]
struct DocumentSharesQuery {
    document_id: Uuid,
}

#[derive(Deserialize)]
struct FolderSharesQuery {
    folder_id: Uuid,
}

/// Resolve a document the caller owns, or fail
async fn owned_document(
    state: &AppState,
    document_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    documents::get_document(&state.db, document_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))?;
    Ok(())
}

/// Resolve a folder the caller owns, or fail
async fn owned_folder(state: &AppState, folder_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    folders::get_folder(&state.db, folder_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Folder not found".into()))?;
    Ok(())
}

async fn share_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ShareDocumentRequest>,
) -> Result<Json<DocumentShare>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;
    owned_document(&state, req.document_id, user_id).await?;

    if req.user_id == user_id {
        return Err(AppError::BadRequest("Cannot share with yourself".into()));
    }
    users::get_user_by_id(&state.db, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if shares::find_document_share(&state.db, req.document_id, req.user_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Document is already shared with this user".into(),
        ));
    }

    let share = shares::create_document_share(
        &state.db,
        req.document_id,
        req.user_id,
        req.can_edit,
        req.can_delete,
    )
    .await?;
    Ok(Json(share))
}

async fn list_document_shares(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DocumentSharesQuery>,
) -> Result<Json<Vec<DocumentShare>>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;
    owned_document(&state, query.document_id, user_id).await?;

    let shares = shares::list_document_shares(&state.db, query.document_id).await?;
    Ok(Json(shares))
}

async fn update_document_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(share_id): Path<Uuid>,
    Json(req): Json<ShareUpdateRequest>,
) -> Result<Json<DocumentShare>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let share = shares::get_document_share(&state.db, share_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Share not found".into()))?;
    owned_document(&state, share.document_id, user_id).await?;

    let updated = shares::update_document_share(&state.db, share_id, req.can_edit, req.can_delete)
        .await?
        .ok_or_else(|| AppError::NotFound("Share not found".into()))?;
    Ok(Json(updated))
}

async fn delete_document_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(share_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let share = shares::get_document_share(&state.db, share_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Share not found".into()))?;
    owned_document(&state, share.document_id, user_id).await?;

    shares::delete_document_share(&state.db, share_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn share_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ShareFolderRequest>,
) -> Result<Json<FolderShare>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;
    owned_folder(&state, req.folder_id, user_id).await?;

    if req.user_id == user_id {
        return Err(AppError::BadRequest("Cannot share with yourself".into()));
    }
    users::get_user_by_id(&state.db, req.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if shares::find_folder_share(&state.db, req.folder_id, req.user_id)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Folder is already shared with this user".into(),
        ));
    }

    let share = shares::create_folder_share(
        &state.db,
        req.folder_id,
        req.user_id,
        req.can_edit,
        req.can_delete,
    )
    .await?;
    Ok(Json(share))
}

async fn list_folder_shares(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FolderSharesQuery>,
) -> Result<Json<Vec<FolderShare>>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;
    owned_folder(&state, query.folder_id, user_id).await?;

    let shares = shares::list_folder_shares(&state.db, query.folder_id).await?;
    Ok(Json(shares))
}

async fn update_folder_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(share_id): Path<Uuid>,
    Json(req): Json<ShareUpdateRequest>,
) -> Result<Json<FolderShare>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let share = shares::get_folder_share(&state.db, share_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Share not found".into()))?;
    owned_folder(&state, share.folder_id, user_id).await?;

    let updated = shares::update_folder_share(&state.db, share_id, req.can_edit, req.can_delete)
        .await?
        .ok_or_else(|| AppError::NotFound("Share not found".into()))?;
    Ok(Json(updated))
}

async fn delete_folder_share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(share_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let share = shares::get_folder_share(&state.db, share_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Share not found".into()))?;
    owned_folder(&state, share.folder_id, user_id).await?;

    shares::delete_folder_share(&state.db, share_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_request_permissions_default_off() {
        let req: ShareDocumentRequest = serde_json::from_str(
            r#"{"document_id": "7f8a1f9e-26f1-4f3a-9d35-1f9f2b9a0c11",
                "user_id": "f2a0c0de-0c8c-4e55-a1f0-3d3f9a1b2c33"}"#,
        )
        .unwrap();
        assert!(!req.can_edit);
        assert!(!req.can_delete);
    }

    #[test]
    fn test_share_update_absent_fields_stay_none() {
        let req: ShareUpdateRequest = serde_json::from_str(r#"{"can_edit": true}"#).unwrap();
        assert_eq!(req.can_edit, Some(true));
        assert_eq!(req.can_delete, None);
    }
}
