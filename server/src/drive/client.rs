//! Google Drive v3 client: the production [`RemoteProvider`].
//!
//! Holds the account's integration row and refreshes the access token in
//! place when it expires; refreshed tokens are written back to the database
//! so concurrent callers pick them up.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use async_trait::async_trait;

use crate::db::{self, models::ExternalIntegration, DbPool};

use super::oauth::GoogleOAuth;
use super::types::{
    ConnectionStatus, RemoteContent, RemoteError, RemoteItem, RemoteItemKind, RemotePage,
    FOLDER_MIME_TYPE,
};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const FILE_FIELDS: &str = "id, name, mimeType, size, createdTime, modifiedTime, parents";
const LIST_PAGE_SIZE: u32 = 100;

pub struct DriveClient {
    http: reqwest::Client,
    pool: DbPool,
    oauth: GoogleOAuth,
    integration: Mutex<ExternalIntegration>,
}

/// Wire shape of a Drive file resource. `size` arrives as a decimal string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
    size: Option<String>,
    created_time: Option<DateTime<Utc>>,
    modified_time: Option<DateTime<Utc>>,
    parents: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

impl From<DriveFile> for RemoteItem {
    fn from(file: DriveFile) -> Self {
        let kind = if file.mime_type == FOLDER_MIME_TYPE {
            RemoteItemKind::Folder
        } else {
            RemoteItemKind::File
        };
        RemoteItem {
            id: file.id,
            name: file.name,
            kind,
            mime_type: file.mime_type,
            size_bytes: file.size.and_then(|s| s.parse().ok()),
            created_time: file.created_time,
            modified_time: file.modified_time,
            parent_id: file.parents.and_then(|mut p| p.pop()),
        }
    }
}

/// Export format for Google-native document types. Binary files (`None`)
/// are fetched verbatim with `alt=media`.
fn export_target(mime_type: &str) -> Option<(&'static str, &'static str)> {
    if !mime_type.starts_with("application/vnd.google-apps") {
        return None;
    }
    Some(match mime_type {
        "application/vnd.google-apps.document" => ("application/pdf", ".pdf"),
        "application/vnd.google-apps.spreadsheet" => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ".xlsx",
        ),
        "application/vnd.google-apps.presentation" => (
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            ".pptx",
        ),
        "application/vnd.google-apps.drawing" => ("image/png", ".png"),
        _ => ("application/pdf", ".pdf"),
    })
}

fn map_status(status: reqwest::StatusCode, id: &str) -> RemoteError {
    match status.as_u16() {
        401 => RemoteError::Auth("access token rejected".to_string()),
        404 => RemoteError::NotFound(id.to_string()),
        429 => RemoteError::RateLimited,
        code => RemoteError::Transport(format!("unexpected status {code}")),
    }
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

impl DriveClient {
    pub fn new(
        http: reqwest::Client,
        pool: DbPool,
        oauth: GoogleOAuth,
        integration: ExternalIntegration,
    ) -> Self {
        Self {
            http,
            pool,
            oauth,
            integration: Mutex::new(integration),
        }
    }

    /// Current access token, refreshing it first if expired. Refreshed
    /// tokens are persisted so later calls start from the new expiry.
    async fn access_token(&self) -> Result<String, RemoteError> {
        let mut integration = self.integration.lock().await;
        if !integration.token_expired() {
            return Ok(integration.access_token.clone());
        }

        let refresh_token = integration
            .refresh_token
            .as_deref()
            .ok_or_else(|| RemoteError::Auth("no refresh token stored; relink the account".to_string()))?;

        let refreshed = self
            .oauth
            .refresh_access_token(refresh_token)
            .await
            .map_err(|err| RemoteError::Auth(format!("token refresh failed: {err}")))?;

        let expiry = Utc::now() + Duration::seconds(refreshed.expires_in.unwrap_or(3600));
        db::integrations::update_access_token(&self.pool, integration.id, &refreshed.access_token, expiry)
            .await
            .map_err(|err| RemoteError::Transport(format!("token persistence failed: {err}")))?;

        integration.access_token = refreshed.access_token.clone();
        integration.token_expiry = Some(expiry);
        tracing::debug!(integration = %integration.id, "access token refreshed");

        Ok(refreshed.access_token)
    }

    async fn fetch_bytes(&self, url: &str, id: &str) -> Result<Vec<u8>, RemoteError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(map_status(response.status(), id));
        }

        let bytes = response.bytes().await.map_err(transport)?.to_vec();

        // An OK status with an HTML body is Google's error page, not content.
        if bytes.is_empty() {
            return Err(RemoteError::Transport("downloaded content is empty".to_string()));
        }
        let head = bytes[..bytes.len().min(100)].to_ascii_lowercase();
        let trimmed = head.strip_prefix(b" ").unwrap_or(&head);
        if trimmed.starts_with(b"<!doctype html") || trimmed.starts_with(b"<html") {
            return Err(RemoteError::Transport(
                "downloaded content is an html error page".to_string(),
            ));
        }

        Ok(bytes)
    }
}

#[async_trait]
impl super::types::RemoteProvider for DriveClient {
    async fn status(&self) -> ConnectionStatus {
        let integration = self.integration.lock().await;
        ConnectionStatus {
            connected: true,
            user_email: integration.provider_email.clone(),
        }
    }

    async fn get_metadata(&self, id: &str) -> Result<RemoteItem, RemoteError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{FILES_URL}/{id}"))
            .query(&[("fields", FILE_FIELDS)])
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(map_status(response.status(), id));
        }

        let file: DriveFile = response.json().await.map_err(transport)?;
        Ok(file.into())
    }

    async fn list_children(
        &self,
        folder_id: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<RemotePage, RemoteError> {
        let token = self.access_token().await?;
        let parent = folder_id.unwrap_or("root");
        let query = format!("'{parent}' in parents and trashed = false");
        let fields = format!("nextPageToken, files({FILE_FIELDS})");

        let mut request = self
            .http
            .get(FILES_URL)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", fields.as_str()),
                ("orderBy", "name"),
            ])
            .query(&[("pageSize", LIST_PAGE_SIZE)])
            .bearer_auth(token);
        if let Some(cursor) = cursor {
            request = request.query(&[("pageToken", cursor)]);
        }

        let response = request.send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(map_status(response.status(), parent));
        }

        let list: DriveFileList = response.json().await.map_err(transport)?;
        Ok(RemotePage {
            items: list.files.into_iter().map(RemoteItem::from).collect(),
            next_cursor: list.next_page_token,
        })
    }

    async fn download(&self, id: &str) -> Result<RemoteContent, RemoteError> {
        let item = self.get_metadata(id).await?;

        match export_target(&item.mime_type) {
            Some((export_mime, extension)) => {
                let url = format!("{FILES_URL}/{id}/export?mimeType={export_mime}");
                let bytes = self.fetch_bytes(&url, id).await?;

                let mut file_name = item.name;
                if !file_name.ends_with(extension) {
                    file_name.push_str(extension);
                }

                Ok(RemoteContent {
                    bytes,
                    mime_type: export_mime.to_string(),
                    file_name,
                })
            }
            None => {
                let url = format!("{FILES_URL}/{id}?alt=media");
                let bytes = self.fetch_bytes(&url, id).await?;
                Ok(RemoteContent {
                    bytes,
                    mime_type: item.mime_type,
                    file_name: item.name,
                })
            }
        }
    }
}
