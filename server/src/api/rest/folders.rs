//! Folder routes
//!
//! CRUD over the folder hierarchy. Deletes are soft.

use crate::api::AppState;
use crate::db::{folders, shares, models::Folder};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::error::{extract_user_id, validate_name, AppError};

pub fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/folders", post(create_folder))
        .route("/folders", get(list_folders))
        .route("/folders/:id", get(get_folder))
        .route("/folders/:id", delete(delete_folder))
}

#[derive(Deserialize)]
struct CreateFolderRequest {
    name: String,
    parent_id: Option<Uuid>,
}

#[derive(Deserialize)]
struct ListFoldersQuery {
    parent_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    100
}

async fn create_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<Folder>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;
    validate_name(&req.name)?;

    if let Some(parent_id) = req.parent_id {
        // The parent must exist and belong to the caller
        folders::get_folder(&state.db, parent_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Parent folder not found".into()))?;
    }

    let folder = folders::create_folder(&state.db, &req.name, req.parent_id, user_id).await?;
    Ok(Json(folder))
}

async fn list_folders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListFoldersQuery>,
) -> Result<Json<Vec<Folder>>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;
    let limit = query.limit.clamp(1, 1000);
    let offset = query.offset.max(0);

    let folders =
        folders::list_folders(&state.db, user_id, query.parent_id, limit, offset).await?;
    Ok(Json(folders))
}

async fn get_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Folder>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    if let Some(folder) = folders::get_folder(&state.db, id, user_id).await? {
        return Ok(Json(folder));
    }

    // Not the owner: a sharing grant still allows reads
    if shares::find_folder_share(&state.db, id, user_id)
        .await?
        .is_some()
    {
        if let Some(folder) = folders::get_folder_any(&state.db, id).await? {
            return Ok(Json(folder));
        }
    }

    Err(AppError::NotFound("Folder not found".into()))
}

async fn delete_folder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_id = extract_user_id(&state, &headers)?;

    let deleted = folders::delete_folder(&state.db, id, user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Folder not found".into()));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}
