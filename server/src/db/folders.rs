//! Database operations for folders

use super::models::Folder;
use super::DbPool;
use uuid::Uuid;

const FOLDER_COLUMNS: &str = "id, name, parent_id, owner_id, is_deleted, created_at, updated_at";

/// Create a new folder
pub async fn create_folder(
    pool: &DbPool,
    name: &str,
    parent_id: Option<Uuid>,
    owner_id: Uuid,
) -> anyhow::Result<Folder> {
    let folder = sqlx::query_as::<_, Folder>(&format!(
        r#"
        INSERT INTO folders (name, parent_id, owner_id)
        VALUES ($1, $2, $3)
        RETURNING {FOLDER_COLUMNS}
        "#,
    ))
    .bind(name)
    .bind(parent_id)
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    Ok(folder)
}

/// Get a folder by ID (only if owned by the given user)
pub async fn get_folder(pool: &DbPool, id: Uuid, owner_id: Uuid) -> anyhow::Result<Option<Folder>> {
    let folder = sqlx::query_as::<_, Folder>(&format!(
        r#"
        SELECT {FOLDER_COLUMNS}
        FROM folders
        WHERE id = $1 AND owner_id = $2 AND is_deleted = FALSE
        "#,
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    Ok(folder)
}

/// Get a folder by ID regardless of owner. Callers must check a sharing
/// grant before returning it to a non-owner.
pub async fn get_folder_any(pool: &DbPool, id: Uuid) -> anyhow::Result<Option<Folder>> {
    let folder = sqlx::query_as::<_, Folder>(&format!(
        r#"
        SELECT {FOLDER_COLUMNS}
        FROM folders
        WHERE id = $1 AND is_deleted = FALSE
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(folder)
}

/// Find a non-deleted folder by (parent, name) under one owner.
/// Used by the import executor to reuse folders instead of duplicating them.
pub async fn find_by_parent_and_name(
    pool: &DbPool,
    parent_id: Option<Uuid>,
    name: &str,
    owner_id: Uuid,
) -> anyhow::Result<Option<Folder>> {
    let folder = sqlx::query_as::<_, Folder>(&format!(
        r#"
        SELECT {FOLDER_COLUMNS}
        FROM folders
        WHERE parent_id IS NOT DISTINCT FROM $1
          AND name = $2
          AND owner_id = $3
          AND is_deleted = FALSE
        LIMIT 1
        "#,
    ))
    .bind(parent_id)
    .bind(name)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    Ok(folder)
}

/// List folders for an owner, optionally filtered by parent
pub async fn list_folders(
    pool: &DbPool,
    owner_id: Uuid,
    parent_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Folder>> {
    let folders = match parent_id {
        Some(parent) => {
            sqlx::query_as::<_, Folder>(&format!(
                r#"
                SELECT {FOLDER_COLUMNS}
                FROM folders
                WHERE owner_id = $1 AND parent_id = $2 AND is_deleted = FALSE
                ORDER BY name
                LIMIT $3 OFFSET $4
                "#,
            ))
            .bind(owner_id)
            .bind(parent)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Folder>(&format!(
                r#"
                SELECT {FOLDER_COLUMNS}
                FROM folders
                WHERE owner_id = $1 AND parent_id IS NULL AND is_deleted = FALSE
                ORDER BY name
                LIMIT $2 OFFSET $3
                "#,
            ))
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(folders)
}

/// Soft-delete a folder
pub async fn delete_folder(pool: &DbPool, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE folders
        SET is_deleted = TRUE, updated_at = NOW()
        WHERE id = $1 AND owner_id = $2 AND is_deleted = FALSE
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
