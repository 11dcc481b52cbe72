//! Database models for the Dataroom document store.
//!
//! These structs map directly to the database schema. Documents and folders
//! form a per-owner tree; documents created by the Drive import carry a
//! source annotation (provider name + remote identifier).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// User
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Folder
// =============================================================================

/// A folder in the document tree. `parent_id = NULL` means top level.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub owner_id: Uuid,
    /// Soft delete flag
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Document
// =============================================================================

/// A document record. Content bytes live in the blob store, keyed by
/// `content_hash` (BLAKE3 hex).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub folder_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub mime_type: String,
    pub size_bytes: i64,
    /// BLAKE3 hash of the document content (64-char hex)
    pub content_hash: String,
    /// Source annotation for imported documents (e.g. "google_drive")
    pub source: Option<String>,
    /// Remote identifier at the source provider
    pub source_id: Option<String>,
    /// Soft delete flag
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new document
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub folder_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub mime_type: String,
    pub size_bytes: i64,
    pub content_hash: String,
    pub source: Option<String>,
    pub source_id: Option<String>,
}

// =============================================================================
// Shares
// =============================================================================

/// A per-user sharing grant on a document. The owner always has full
/// access; grants only apply to other users.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct DocumentShare {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub can_edit: bool,
    pub can_delete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A per-user sharing grant on a folder.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct FolderShare {
    pub id: Uuid,
    pub folder_id: Uuid,
    pub user_id: Uuid,
    pub can_edit: bool,
    pub can_delete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// External Integration
// =============================================================================

/// A linked external account (one row per user + provider).
/// Holds the OAuth tokens used by the remote file lister.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ExternalIntegration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    pub provider_user_id: Option<String>,
    pub provider_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExternalIntegration {
    /// Whether the stored access token has passed its expiry time.
    /// Missing expiry is treated as expired so a refresh is attempted.
    pub fn token_expired(&self) -> bool {
        match self.token_expiry {
            Some(expiry) => expiry <= Utc::now(),
            None => true,
        }
    }
}
