//! Data contracts for the remote provider seam.
//!
//! `RemoteItem` is a snapshot of one node in the provider's file tree as
//! observed at traversal time; it is never persisted locally.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Provider name recorded in document source annotations.
pub const PROVIDER_NAME: &str = "google_drive";

/// MIME type Google Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Default recursion depth for folder imports.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteItemKind {
    Folder,
    File,
}

/// One node in the remote file tree. Immutable once constructed.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    pub kind: RemoteItemKind,
    pub mime_type: String,
    /// Absent for folders
    pub size_bytes: Option<i64>,
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: Option<DateTime<Utc>>,
    /// Back-reference to the containing folder, if any
    pub parent_id: Option<String>,
}

impl RemoteItem {
    pub fn is_folder(&self) -> bool {
        self.kind == RemoteItemKind::Folder
    }
}

/// One page of a folder listing. Callers keep issuing calls with the
/// returned cursor until it is absent to get the complete child set.
#[derive(Debug, Clone)]
pub struct RemotePage {
    pub items: Vec<RemoteItem>,
    pub next_cursor: Option<String>,
}

/// Fetched (or exported) file content.
#[derive(Debug, Clone)]
pub struct RemoteContent {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

/// Result of the connection status check.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub user_email: Option<String>,
}

/// Remote provider failure taxonomy.
///
/// `Auth` aborts an import call entirely; every other variant is scoped to
/// the item or branch it occurred on and becomes a `Skipped` outcome.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("remote credential invalid or expired: {0}")]
    Auth(String),
    #[error("not found")]
    NotFound(String),
    #[error("remote provider rate limited the request")]
    RateLimited,
    #[error("remote transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Reason string recorded on `Skipped` outcomes.
    pub fn skip_reason(&self) -> String {
        match self {
            RemoteError::NotFound(_) => "not found".to_string(),
            other => other.to_string(),
        }
    }
}

/// The remote file lister and content fetcher consumed by the import
/// pipeline. Production implementation is [`DriveClient`](super::client::DriveClient);
/// tests use an in-memory fake.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    /// Connection status for the owning account.
    async fn status(&self) -> ConnectionStatus;

    /// Single-item metadata lookup.
    async fn get_metadata(&self, id: &str) -> Result<RemoteItem, RemoteError>;

    /// List the immediate children of a folder (`None` = provider root),
    /// one page at a time.
    async fn list_children(
        &self,
        folder_id: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<RemotePage, RemoteError>;

    /// Fetch file content. Provider-native document types are exported to a
    /// portable format as part of the fetch.
    async fn download(&self, id: &str) -> Result<RemoteContent, RemoteError>;
}

/// Caller-supplied import intent (wire shape of `POST /integrations/google/import`).
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    /// Traversal roots; must be non-empty.
    pub file_ids: Vec<String>,
    /// Local destination folder; `None` = top level.
    pub parent_folder_id: Option<Uuid>,
    /// Whether to recurse into folders.
    #[serde(default = "default_include_folders")]
    pub include_folders: bool,
    /// Maximum recursion depth; only meaningful when recursion is enabled.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// When set, a remote id reachable via two requested roots is imported
    /// once and skipped on subsequent encounters. Off by default, which
    /// imports it twice.
    #[serde(default)]
    pub skip_duplicates: bool,
}

fn default_include_folders() -> bool {
    true
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

impl ImportRequest {
    /// Request invariants: non-empty roots, depth >= 1 when recursing.
    pub fn validate(&self) -> Result<(), String> {
        if self.file_ids.is_empty() {
            return Err("file_ids must not be empty".to_string());
        }
        if self.include_folders && self.max_depth < 1 {
            return Err("max_depth must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(file_ids: Vec<&str>, max_depth: u32) -> ImportRequest {
        ImportRequest {
            file_ids: file_ids.into_iter().map(String::from).collect(),
            parent_folder_id: None,
            include_folders: true,
            max_depth,
            skip_duplicates: false,
        }
    }

    #[test]
    fn test_rejects_empty_roots() {
        assert!(request(vec![], 5).validate().is_err());
        assert!(request(vec!["a"], 5).validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_depth_when_recursing() {
        assert!(request(vec!["a"], 0).validate().is_err());

        let mut flat = request(vec!["a"], 0);
        flat.include_folders = false;
        assert!(flat.validate().is_ok());
    }

    #[test]
    fn test_not_found_skip_reason() {
        assert_eq!(RemoteError::NotFound("x".into()).skip_reason(), "not found");
        assert_eq!(
            RemoteError::RateLimited.skip_reason(),
            "remote provider rate limited the request"
        );
    }
}
