//! Database + blob store backed [`DocumentSink`].

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{self, models::NewDocument, DbPool};
use crate::storage::BlobStore;

use super::executor::DocumentSink;
use super::types::{RemoteContent, PROVIDER_NAME};

/// Persists imported items: content bytes into the blob store, metadata
/// rows into Postgres with the provider source annotation.
pub struct LocalStore {
    pool: DbPool,
    blobs: Arc<BlobStore>,
}

impl LocalStore {
    pub fn new(pool: DbPool, blobs: Arc<BlobStore>) -> Self {
        Self { pool, blobs }
    }
}

#[async_trait]
impl DocumentSink for LocalStore {
    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
        owner_id: Uuid,
    ) -> anyhow::Result<Uuid> {
        // A folder with the same name under the same parent is reused, so
        // re-importing into the same destination does not duplicate the tree.
        if let Some(existing) =
            db::folders::find_by_parent_and_name(&self.pool, parent_id, name, owner_id).await?
        {
            return Ok(existing.id);
        }

        let folder = db::folders::create_folder(&self.pool, name, parent_id, owner_id).await?;
        Ok(folder.id)
    }

    async fn create_document(
        &self,
        content: &RemoteContent,
        folder_id: Option<Uuid>,
        owner_id: Uuid,
        source_id: &str,
    ) -> anyhow::Result<Uuid> {
        let content_hash = blake3::hash(&content.bytes).to_hex().to_string();
        self.blobs.write(&content_hash, &content.bytes)?;

        let document = db::documents::create_document(
            &self.pool,
            &NewDocument {
                name: content.file_name.clone(),
                folder_id,
                owner_id,
                mime_type: content.mime_type.clone(),
                size_bytes: content.bytes.len() as i64,
                content_hash,
                source: Some(PROVIDER_NAME.to_string()),
                source_id: Some(source_id.to_string()),
            },
        )
        .await?;

        Ok(document.id)
    }

    async fn count_documents(&self, owner_id: Uuid) -> anyhow::Result<i64> {
        db::documents::count_documents(&self.pool, owner_id).await
    }

    async fn total_size(&self, owner_id: Uuid) -> anyhow::Result<i64> {
        db::documents::total_size(&self.pool, owner_id).await
    }
}
