//! Import executor: materializes planned remote items as local folders and
//! documents, tracking a per-item outcome.
//!
//! Items are processed sequentially in plan order, which serializes the
//! quota check-then-create step without extra locking.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use super::planner::{Plan, PlanParent, PlannedItem};
use super::report::{ImportOutcome, ImportedKind};
use super::types::{RemoteContent, RemoteError, RemoteProvider};

/// Per-account import limits, from [`Config`](crate::config::Config).
#[derive(Debug, Clone, Copy)]
pub struct QuotaLimits {
    pub max_documents: i64,
    pub max_storage_bytes: i64,
}

/// Write target for imported items. Production implementation persists via
/// sqlx + the blob store ([`LocalStore`](super::store::LocalStore)); tests
/// use an in-memory sink.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
        owner_id: Uuid,
    ) -> anyhow::Result<Uuid>;

    async fn create_document(
        &self,
        content: &RemoteContent,
        folder_id: Option<Uuid>,
        owner_id: Uuid,
        source_id: &str,
    ) -> anyhow::Result<Uuid>;

    async fn count_documents(&self, owner_id: Uuid) -> anyhow::Result<i64>;

    async fn total_size(&self, owner_id: Uuid) -> anyhow::Result<i64>;
}

pub struct Executor<'a> {
    provider: &'a dyn RemoteProvider,
    sink: &'a dyn DocumentSink,
    owner_id: Uuid,
    /// The request's destination folder (`None` = top level).
    target: Option<Uuid>,
    limits: QuotaLimits,
    /// Remote folder id -> created local folder id, for parenting children.
    folders_by_remote: HashMap<String, Uuid>,
    /// (local parent, name) -> local folder id. Makes folder creation
    /// idempotent within one import call.
    folders_by_name: HashMap<(Option<Uuid>, String), Uuid>,
}

impl<'a> Executor<'a> {
    pub fn new(
        provider: &'a dyn RemoteProvider,
        sink: &'a dyn DocumentSink,
        owner_id: Uuid,
        target: Option<Uuid>,
        limits: QuotaLimits,
    ) -> Self {
        Self {
            provider,
            sink,
            owner_id,
            target,
            limits,
            folders_by_remote: HashMap::new(),
            folders_by_name: HashMap::new(),
        }
    }

    /// Process every planned item in order. Only `RemoteError::Auth`
    /// propagates; all other failures become `Skipped` outcomes.
    pub async fn execute(&mut self, plan: &Plan) -> Result<Vec<ImportOutcome>, RemoteError> {
        let mut outcomes = Vec::with_capacity(plan.items.len());

        for planned in &plan.items {
            let outcome = self.execute_item(planned).await?;
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn execute_item(&mut self, planned: &PlannedItem) -> Result<ImportOutcome, RemoteError> {
        let item = &planned.item;

        let parent = match &planned.parent {
            PlanParent::Target => self.target,
            PlanParent::Remote(remote_id) => match self.folders_by_remote.get(remote_id) {
                Some(local_id) => Some(*local_id),
                None => {
                    // The containing folder never materialized; there is
                    // nowhere to put this item.
                    return Ok(skip(item, format!("parent folder {remote_id} was not imported")));
                }
            },
        };

        if item.is_folder() {
            self.execute_folder(item, parent).await
        } else {
            self.execute_file(item, parent).await
        }
    }

    async fn execute_folder(
        &mut self,
        item: &super::types::RemoteItem,
        parent: Option<Uuid>,
    ) -> Result<ImportOutcome, RemoteError> {
        let key = (parent, item.name.clone());

        let local_id = match self.folders_by_name.get(&key) {
            Some(existing) => *existing,
            None => {
                match self
                    .sink
                    .create_folder(&item.name, parent, self.owner_id)
                    .await
                {
                    Ok(id) => {
                        self.folders_by_name.insert(key, id);
                        id
                    }
                    Err(err) => {
                        tracing::warn!(remote_id = %item.id, "folder creation failed: {err}");
                        return Ok(skip(item, format!("local store error: {err}")));
                    }
                }
            }
        };

        self.folders_by_remote.insert(item.id.clone(), local_id);

        Ok(ImportOutcome::Imported {
            local_id,
            remote_id: item.id.clone(),
            kind: ImportedKind::Folder,
        })
    }

    async fn execute_file(
        &mut self,
        item: &super::types::RemoteItem,
        parent: Option<Uuid>,
    ) -> Result<ImportOutcome, RemoteError> {
        // Count limit is checked before fetching; the size limit is checked
        // against the actual downloaded length (exported documents report no
        // size in metadata). Limits are per item: a later, smaller file may
        // still fit.
        let document_count = match self.sink.count_documents(self.owner_id).await {
            Ok(count) => count,
            Err(err) => return Ok(skip(item, format!("local store error: {err}"))),
        };
        if document_count >= self.limits.max_documents {
            return Ok(skip(item, "quota exceeded".to_string()));
        }

        let content = match self.provider.download(&item.id).await {
            Ok(content) => content,
            Err(RemoteError::Auth(msg)) => return Err(RemoteError::Auth(msg)),
            Err(err) => return Ok(skip(item, err.skip_reason())),
        };

        let stored_bytes = match self.sink.total_size(self.owner_id).await {
            Ok(total) => total,
            Err(err) => return Ok(skip(item, format!("local store error: {err}"))),
        };
        if stored_bytes + content.bytes.len() as i64 > self.limits.max_storage_bytes {
            return Ok(skip(item, "quota exceeded".to_string()));
        }

        match self
            .sink
            .create_document(&content, parent, self.owner_id, &item.id)
            .await
        {
            Ok(local_id) => Ok(ImportOutcome::Imported {
                local_id,
                remote_id: item.id.clone(),
                kind: ImportedKind::Document,
            }),
            Err(err) => {
                tracing::warn!(remote_id = %item.id, "document persistence failed: {err}");
                Ok(skip(item, format!("local store error: {err}")))
            }
        }
    }
}

fn skip(item: &super::types::RemoteItem, reason: String) -> ImportOutcome {
    ImportOutcome::Skipped {
        remote_id: item.id.clone(),
        display_name: item.name.clone(),
        reason,
    }
}
