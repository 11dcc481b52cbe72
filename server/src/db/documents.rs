//! Database operations for documents
//!
//! Documents are metadata rows; content bytes live in the blob store under
//! `content_hash`. `count_documents` and `total_size` back the per-account
//! import quota checks.

use super::models::{Document, NewDocument};
use super::DbPool;
use uuid::Uuid;

const DOCUMENT_COLUMNS: &str = "id, name, folder_id, owner_id, mime_type, size_bytes, \
     content_hash, source, source_id, is_deleted, created_at, updated_at";

/// Create a new document record
pub async fn create_document(pool: &DbPool, new: &NewDocument) -> anyhow::Result<Document> {
    let document = sqlx::query_as::<_, Document>(&format!(
        r#"
        INSERT INTO documents (name, folder_id, owner_id, mime_type, size_bytes, content_hash, source, source_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {DOCUMENT_COLUMNS}
        "#,
    ))
    .bind(&new.name)
    .bind(new.folder_id)
    .bind(new.owner_id)
    .bind(&new.mime_type)
    .bind(new.size_bytes)
    .bind(&new.content_hash)
    .bind(&new.source)
    .bind(&new.source_id)
    .fetch_one(pool)
    .await?;

    Ok(document)
}

/// Get a document by ID (only if owned by the given user)
pub async fn get_document(
    pool: &DbPool,
    id: Uuid,
    owner_id: Uuid,
) -> anyhow::Result<Option<Document>> {
    let document = sqlx::query_as::<_, Document>(&format!(
        r#"
        SELECT {DOCUMENT_COLUMNS}
        FROM documents
        WHERE id = $1 AND owner_id = $2 AND is_deleted = FALSE
        "#,
    ))
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    Ok(document)
}

/// Get a document by ID regardless of owner. Callers must check a sharing
/// grant before returning it to a non-owner.
pub async fn get_document_any(pool: &DbPool, id: Uuid) -> anyhow::Result<Option<Document>> {
    let document = sqlx::query_as::<_, Document>(&format!(
        r#"
        SELECT {DOCUMENT_COLUMNS}
        FROM documents
        WHERE id = $1 AND is_deleted = FALSE
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(document)
}

/// Soft-delete a document regardless of owner. Callers must check a
/// `can_delete` grant first.
pub async fn delete_document_any(pool: &DbPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET is_deleted = TRUE, updated_at = NOW()
        WHERE id = $1 AND is_deleted = FALSE
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List documents for an owner, optionally filtered by folder
pub async fn list_documents(
    pool: &DbPool,
    owner_id: Uuid,
    folder_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Document>> {
    let documents = match folder_id {
        Some(folder) => {
            sqlx::query_as::<_, Document>(&format!(
                r#"
                SELECT {DOCUMENT_COLUMNS}
                FROM documents
                WHERE owner_id = $1 AND folder_id = $2 AND is_deleted = FALSE
                ORDER BY name
                LIMIT $3 OFFSET $4
                "#,
            ))
            .bind(owner_id)
            .bind(folder)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Document>(&format!(
                r#"
                SELECT {DOCUMENT_COLUMNS}
                FROM documents
                WHERE owner_id = $1 AND is_deleted = FALSE
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

    Ok(documents)
}

/// Soft-delete a document
pub async fn delete_document(pool: &DbPool, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE documents
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

/// Count non-deleted documents owned by a user (quota check)
pub async fn count_documents(pool: &DbPool, owner_id: Uuid) -> anyhow::Result<i64> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM documents WHERE owner_id = $1 AND is_deleted = FALSE",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    Ok(count.0)
}

/// Total stored bytes across a user's non-deleted documents (quota check)
pub async fn total_size(pool: &DbPool, owner_id: Uuid) -> anyhow::Result<i64> {
    // Cast to BIGINT to avoid NUMERIC type mismatch
    let total: (Option<i64>,) = sqlx::query_as(
        "SELECT CAST(COALESCE(SUM(size_bytes), 0) AS BIGINT) FROM documents \
         WHERE owner_id = $1 AND is_deleted = FALSE",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    Ok(total.0.unwrap_or(0))
}
