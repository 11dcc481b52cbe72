pub mod documents;
pub mod folders;
pub mod integrations;
pub mod models;
pub mod shares;
pub mod users;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

pub type DbPool = Pool<Postgres>;

// Re-export commonly used types
pub use models::{
    Document, DocumentShare, ExternalIntegration, Folder, FolderShare, NewDocument, User,
};

/// Create a database connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run database migrations using SQLx's built-in migration tracking.
/// Migrations are tracked in the `_sqlx_migrations` table and only run once.
pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await?;
    Ok(())
}

/// Server statistics
pub struct Stats {
    pub total_users: i64,
    pub total_documents: i64,
    pub total_folders: i64,
    pub total_document_bytes: i64,
}

/// Get server statistics
pub async fn get_stats(pool: &DbPool) -> anyhow::Result<Stats> {
    let total_users: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let total_documents: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM documents WHERE is_deleted = FALSE")
            .fetch_one(pool)
            .await?;

    let total_folders: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM folders WHERE is_deleted = FALSE")
            .fetch_one(pool)
            .await?;

    // Cast to BIGINT to avoid NUMERIC type mismatch
    let total_document_bytes: (Option<i64>,) = sqlx::query_as(
        "SELECT CAST(COALESCE(SUM(size_bytes), 0) AS BIGINT) FROM documents WHERE is_deleted = FALSE",
    )
    .fetch_one(pool)
    .await?;

    Ok(Stats {
        total_users: total_users.0,
        total_documents: total_documents.0,
        total_folders: total_folders.0,
        total_document_bytes: total_document_bytes.0.unwrap_or(0),
    })
}
