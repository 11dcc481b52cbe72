//! Database operations for sharing grants
//!
//! One row per (target, user) pair; the unique constraint rejects double
//! shares. Rows cascade away with the target or the grantee.

use super::models::{DocumentShare, FolderShare};
use super::DbPool;
use uuid::Uuid;

const DOCUMENT_SHARE_COLUMNS: &str =
    "id, document_id, user_id, can_edit, can_delete, created_at, updated_at";

const FOLDER_SHARE_COLUMNS: &str =
    "id, folder_id, user_id, can_edit, can_delete, created_at, updated_at";

// =============================================================================
// Document shares
// =============================================================================

/// Create a sharing grant on a document
pub async fn create_document_share(
    pool: &DbPool,
    document_id: Uuid,
    user_id: Uuid,
    can_edit: bool,
    can_delete: bool,
) -> anyhow::Result<DocumentShare> {
    let share = sqlx::query_as::<_, DocumentShare>(&format!(
        r#"
        INSERT INTO document_shares (document_id, user_id, can_edit, can_delete)
        VALUES ($1, $2, $3, $4)
        RETURNING {DOCUMENT_SHARE_COLUMNS}
        "#,
    ))
    .bind(document_id)
    .bind(user_id)
    .bind(can_edit)
    .bind(can_delete)
    .fetch_one(pool)
    .await?;

    Ok(share)
}

/// Get a document share by ID
pub async fn get_document_share(pool: &DbPool, id: Uuid) -> anyhow::Result<Option<DocumentShare>> {
    let share = sqlx::query_as::<_, DocumentShare>(&format!(
        r#"
        SELECT {DOCUMENT_SHARE_COLUMNS}
        FROM document_shares
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(share)
}

/// Find the grant a user holds on a document, if any
pub async fn find_document_share(
    pool: &DbPool,
    document_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<DocumentShare>> {
    let share = sqlx::query_as::<_, DocumentShare>(&format!(
        r#"
        SELECT {DOCUMENT_SHARE_COLUMNS}
        FROM document_shares
        WHERE document_id = $1 AND user_id = $2
        "#,
    ))
    .bind(document_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(share)
}

/// List all grants on a document
pub async fn list_document_shares(
    pool: &DbPool,
    document_id: Uuid,
) -> anyhow::Result<Vec<DocumentShare>> {
    let shares = sqlx::query_as::<_, DocumentShare>(&format!(
        r#"
        SELECT {DOCUMENT_SHARE_COLUMNS}
        FROM document_shares
        WHERE document_id = $1
        ORDER BY created_at
        "#,
    ))
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    Ok(shares)
}

/// Update a grant's permissions; `None` keeps the stored value
pub async fn update_document_share(
    pool: &DbPool,
    id: Uuid,
    can_edit: Option<bool>,
    can_delete: Option<bool>,
) -> anyhow::Result<Option<DocumentShare>> {
    let share = sqlx::query_as::<_, DocumentShare>(&format!(
        r#"
        UPDATE document_shares
        SET can_edit = COALESCE($2, can_edit),
            can_delete = COALESCE($3, can_delete),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {DOCUMENT_SHARE_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(can_edit)
    .bind(can_delete)
    .fetch_optional(pool)
    .await?;

    Ok(share)
}

/// Delete a document share
pub async fn delete_document_share(pool: &DbPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM document_shares WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Folder shares
// =============================================================================

/// Create a sharing grant on a folder
pub async fn create_folder_share(
    pool: &DbPool,
    folder_id: Uuid,
    user_id: Uuid,
    can_edit: bool,
    can_delete: bool,
) -> anyhow::Result<FolderShare> {
    let share = sqlx::query_as::<_, FolderShare>(&format!(
        r#"
        INSERT INTO folder_shares (folder_id, user_id, can_edit, can_delete)
        VALUES ($1, $2, $3, $4)
        RETURNING {FOLDER_SHARE_COLUMNS}
        "#,
    ))
    .bind(folder_id)
    .bind(user_id)
    .bind(can_edit)
    .bind(can_delete)
    .fetch_one(pool)
    .await?;

    Ok(share)
}

/// Get a folder share by ID
pub async fn get_folder_share(pool: &DbPool, id: Uuid) -> anyhow::Result<Option<FolderShare>> {
    let share = sqlx::query_as::<_, FolderShare>(&format!(
        r#"
        SELECT {FOLDER_SHARE_COLUMNS}
        FROM folder_shares
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(share)
}

/// Find the grant a user holds on a folder, if any
pub async fn find_folder_share(
    pool: &DbPool,
    folder_id: Uuid,
    user_id: Uuid,
) -> anyhow::Result<Option<FolderShare>> {
    let share = sqlx::query_as::<_, FolderShare>(&format!(
        r#"
        SELECT {FOLDER_SHARE_COLUMNS}
        FROM folder_shares
        WHERE folder_id = $1 AND user_id = $2
        "#,
    ))
    .bind(folder_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(share)
}

/// List all grants on a folder
pub async fn list_folder_shares(pool: &DbPool, folder_id: Uuid) -> anyhow::Result<Vec<FolderShare>> {
    let shares = sqlx::query_as::<_, FolderShare>(&format!(
        r#"
        SELECT {FOLDER_SHARE_COLUMNS}
        FROM folder_shares
        WHERE folder_id = $1
        ORDER BY created_at
        "#,
    ))
    .bind(folder_id)
    .fetch_all(pool)
    .await?;

    Ok(shares)
}

/// Update a grant's permissions; `None` keeps the stored value
pub async fn update_folder_share(
    pool: &DbPool,
    id: Uuid,
    can_edit: Option<bool>,
    can_delete: Option<bool>,
) -> anyhow::Result<Option<FolderShare>> {
    let share = sqlx::query_as::<_, FolderShare>(&format!(
        r#"
        UPDATE folder_shares
        SET can_edit = COALESCE($2, can_edit),
            can_delete = COALESCE($3, can_delete),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {FOLDER_SHARE_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(can_edit)
    .bind(can_delete)
    .fetch_optional(pool)
    .await?;

    Ok(share)
}

/// Delete a folder share
pub async fn delete_folder_share(pool: &DbPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM folder_shares WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
