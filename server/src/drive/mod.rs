//! Google Drive import subsystem.
//!
//! The pipeline is request-scoped and synchronous: the planner expands the
//! requested roots into a flat, depth-bounded item sequence, the executor
//! materializes each item locally, and the aggregator folds the ordered
//! outcome stream into the report returned to the caller. No job state is
//! persisted between calls.

pub mod client;
pub mod executor;
pub mod oauth;
pub mod planner;
pub mod report;
pub mod types;

mod store;

pub use executor::{DocumentSink, QuotaLimits};
pub use report::ImportReport;
pub use store::LocalStore;
pub use types::{ImportRequest, RemoteError, RemoteProvider, PROVIDER_NAME};

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("invalid import request: {0}")]
    InvalidRequest(String),
}

/// Run one import end to end.
///
/// Fails fast when the account is not connected or the request is invalid;
/// every other failure is captured as a per-item `Skipped` entry and the
/// call returns a complete report, even if every item failed.
pub async fn run_import(
    provider: &dyn RemoteProvider,
    sink: &dyn DocumentSink,
    owner_id: Uuid,
    request: &ImportRequest,
    limits: QuotaLimits,
) -> Result<ImportReport, ImportError> {
    request.validate().map_err(ImportError::InvalidRequest)?;

    let status = provider.status().await;
    if !status.connected {
        return Err(RemoteError::Auth("remote account is not connected".to_string()).into());
    }

    let plan = planner::build_plan(provider, request).await?;

    let mut executor = executor::Executor::new(
        provider,
        sink,
        owner_id,
        request.parent_folder_id,
        limits,
    );
    let executed = executor.execute(&plan).await?;

    let mut outcomes = plan.skipped;
    outcomes.extend(executed);

    let report = report::aggregate(outcomes);
    tracing::info!(
        owner = %owner_id,
        documents = report.total_documents_imported,
        folders = report.total_folders_imported,
        skipped = report.total_skipped,
        "import finished"
    );

    Ok(report)
}

#[cfg(test)]
pub(crate) mod testutil {
    //! In-memory provider and sink used by the pipeline tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::executor::DocumentSink;
    use super::types::{
        ConnectionStatus, RemoteContent, RemoteError, RemoteItem, RemoteItemKind, RemotePage,
        RemoteProvider, FOLDER_MIME_TYPE,
    };

    pub fn folder(id: &str, name: &str) -> RemoteItem {
        RemoteItem {
            id: id.to_string(),
            name: name.to_string(),
            kind: RemoteItemKind::Folder,
            mime_type: FOLDER_MIME_TYPE.to_string(),
            size_bytes: None,
            created_time: None,
            modified_time: None,
            parent_id: None,
        }
    }

    pub fn file(id: &str, name: &str, size: i64) -> RemoteItem {
        RemoteItem {
            id: id.to_string(),
            name: name.to_string(),
            kind: RemoteItemKind::File,
            mime_type: "application/octet-stream".to_string(),
            size_bytes: Some(size),
            created_time: None,
            modified_time: None,
            parent_id: None,
        }
    }

    fn clone_error(err: &RemoteError) -> RemoteError {
        match err {
            RemoteError::Auth(msg) => RemoteError::Auth(msg.clone()),
            RemoteError::NotFound(id) => RemoteError::NotFound(id.clone()),
            RemoteError::RateLimited => RemoteError::RateLimited,
            RemoteError::Transport(msg) => RemoteError::Transport(msg.clone()),
        }
    }

    #[derive(Default)]
    pub struct FakeProvider {
        items: HashMap<String, RemoteItem>,
        children: HashMap<String, Vec<String>>,
        content: HashMap<String, Vec<u8>>,
        listing_errors: HashMap<String, RemoteError>,
        page_errors: HashMap<(String, usize), RemoteError>,
        download_errors: HashMap<String, RemoteError>,
        page_size: Option<usize>,
        disconnected: bool,
        auth_error: bool,
    }

    impl FakeProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_item(mut self, item: RemoteItem) -> Self {
            self.items.insert(item.id.clone(), item);
            self
        }

        pub fn with_children(mut self, parent: &str, child_ids: Vec<&str>) -> Self {
            self.children.insert(
                parent.to_string(),
                child_ids.into_iter().map(String::from).collect(),
            );
            self
        }

        pub fn with_content(mut self, id: &str, bytes: Vec<u8>) -> Self {
            self.content.insert(id.to_string(), bytes);
            self
        }

        pub fn with_page_size(mut self, size: usize) -> Self {
            self.page_size = Some(size);
            self
        }

        pub fn with_listing_error(mut self, folder_id: &str, err: RemoteError) -> Self {
            self.listing_errors.insert(folder_id.to_string(), err);
            self
        }

        /// Fail the listing page that starts at the given child offset.
        pub fn with_listing_error_at(mut self, folder_id: &str, offset: usize, err: RemoteError) -> Self {
            self.page_errors.insert((folder_id.to_string(), offset), err);
            self
        }

        pub fn with_download_error(mut self, id: &str, err: RemoteError) -> Self {
            self.download_errors.insert(id.to_string(), err);
            self
        }

        pub fn disconnected(mut self) -> Self {
            self.disconnected = true;
            self
        }

        pub fn with_auth_error(mut self) -> Self {
            self.auth_error = true;
            self
        }
    }

    #[async_trait]
    impl RemoteProvider for FakeProvider {
        async fn status(&self) -> ConnectionStatus {
            ConnectionStatus {
                connected: !self.disconnected,
                user_email: (!self.disconnected).then(|| "user@example.com".to_string()),
            }
        }

        async fn get_metadata(&self, id: &str) -> Result<RemoteItem, RemoteError> {
            if self.auth_error {
                return Err(RemoteError::Auth("token expired".to_string()));
            }
            self.items
                .get(id)
                .cloned()
                .ok_or_else(|| RemoteError::NotFound(id.to_string()))
        }

        async fn list_children(
            &self,
            folder_id: Option<&str>,
            cursor: Option<&str>,
        ) -> Result<RemotePage, RemoteError> {
            let folder_id = folder_id.unwrap_or("root");
            if let Some(err) = self.listing_errors.get(folder_id) {
                return Err(clone_error(err));
            }

            let ids = self.children.get(folder_id).cloned().unwrap_or_default();
            let offset: usize = cursor.map(|c| c.parse().unwrap_or(0)).unwrap_or(0);

            if let Some(err) = self.page_errors.get(&(folder_id.to_string(), offset)) {
                return Err(clone_error(err));
            }
            let page_size = self.page_size.unwrap_or(usize::MAX);

            let items: Vec<RemoteItem> = ids
                .iter()
                .skip(offset)
                .take(page_size)
                .filter_map(|id| self.items.get(id).cloned())
                .collect();

            let consumed = offset + items.len();
            let next_cursor = (consumed < ids.len()).then(|| consumed.to_string());

            Ok(RemotePage { items, next_cursor })
        }

        async fn download(&self, id: &str) -> Result<RemoteContent, RemoteError> {
            if let Some(err) = self.download_errors.get(id) {
                return Err(clone_error(err));
            }
            let item = self
                .items
                .get(id)
                .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
            let bytes = self
                .content
                .get(id)
                .cloned()
                .unwrap_or_else(|| format!("content of {id}").into_bytes());
            Ok(RemoteContent {
                bytes,
                mime_type: item.mime_type.clone(),
                file_name: item.name.clone(),
            })
        }
    }

    #[derive(Debug)]
    pub struct SinkFolder {
        pub id: Uuid,
        pub name: String,
        pub parent_id: Option<Uuid>,
        pub owner_id: Uuid,
    }

    #[derive(Debug)]
    pub struct SinkDocument {
        pub id: Uuid,
        pub name: String,
        pub folder_id: Option<Uuid>,
        pub owner_id: Uuid,
        pub size_bytes: i64,
        pub source_id: String,
    }

    #[derive(Default)]
    pub struct MemorySink {
        pub folders: Mutex<Vec<SinkFolder>>,
        pub documents: Mutex<Vec<SinkDocument>>,
        preexisting_count: i64,
        preexisting_bytes: i64,
        fail_folder_named: Option<String>,
    }

    impl MemorySink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate an account that already holds documents.
        pub fn with_preexisting(mut self, count: i64, bytes: i64) -> Self {
            self.preexisting_count = count;
            self.preexisting_bytes = bytes;
            self
        }

        /// Fail folder creation for folders with the given display name.
        pub fn with_folder_failure(mut self, name: &str) -> Self {
            self.fail_folder_named = Some(name.to_string());
            self
        }
    }

    #[async_trait]
    impl DocumentSink for MemorySink {
        async fn create_folder(
            &self,
            name: &str,
            parent_id: Option<Uuid>,
            owner_id: Uuid,
        ) -> anyhow::Result<Uuid> {
            if self.fail_folder_named.as_deref() == Some(name) {
                anyhow::bail!("constraint violation");
            }
            let mut folders = self.folders.lock().unwrap();
            // Same (parent, name) reuse as the persistent store, so a
            // repeated import lands in the existing folder.
            if let Some(existing) = folders
                .iter()
                .find(|f| f.owner_id == owner_id && f.parent_id == parent_id && f.name == name)
            {
                return Ok(existing.id);
            }
            let id = Uuid::new_v4();
            folders.push(SinkFolder {
                id,
                name: name.to_string(),
                parent_id,
                owner_id,
            });
            Ok(id)
        }

        async fn create_document(
            &self,
            content: &RemoteContent,
            folder_id: Option<Uuid>,
            owner_id: Uuid,
            source_id: &str,
        ) -> anyhow::Result<Uuid> {
            let id = Uuid::new_v4();
            self.documents.lock().unwrap().push(SinkDocument {
                id,
                name: content.file_name.clone(),
                folder_id,
                owner_id,
                size_bytes: content.bytes.len() as i64,
                source_id: source_id.to_string(),
            });
            Ok(id)
        }

        async fn count_documents(&self, _owner_id: Uuid) -> anyhow::Result<i64> {
            Ok(self.preexisting_count + self.documents.lock().unwrap().len() as i64)
        }

        async fn total_size(&self, _owner_id: Uuid) -> anyhow::Result<i64> {
            let stored: i64 = self
                .documents
                .lock()
                .unwrap()
                .iter()
                .map(|d| d.size_bytes)
                .sum();
            Ok(self.preexisting_bytes + stored)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::{file, folder, FakeProvider, MemorySink};
    use super::*;

    fn request(file_ids: Vec<&str>) -> ImportRequest {
        ImportRequest {
            file_ids: file_ids.into_iter().map(String::from).collect(),
            parent_folder_id: None,
            include_folders: true,
            max_depth: 5,
            skip_duplicates: false,
        }
    }

    fn limits() -> QuotaLimits {
        QuotaLimits {
            max_documents: 1000,
            max_storage_bytes: 1 << 30,
        }
    }

    #[tokio::test]
    async fn test_report_counts_are_consistent() {
        let provider = FakeProvider::new()
            .with_item(folder("root", "Docs"))
            .with_item(file("a", "a.txt", 10))
            .with_item(file("b", "b.txt", 10))
            .with_children("root", vec!["a", "b"]);
        let sink = MemorySink::new();

        let report = run_import(&provider, &sink, uuid::Uuid::new_v4(), &request(vec!["root", "gone"]), limits())
            .await
            .unwrap();

        assert_eq!(report.total_documents_imported, report.imported_document_ids.len());
        assert_eq!(report.total_folders_imported, report.imported_folder_ids.len());
        assert_eq!(report.total_skipped, report.skipped_items.len());
        assert_eq!(report.total_documents_imported, 2);
        assert_eq!(report.total_folders_imported, 1);
        assert_eq!(report.total_skipped, 1);
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let provider = FakeProvider::new()
            .with_item(file("ok1", "one.txt", 10))
            .with_item(file("ok2", "two.txt", 10));
        let sink = MemorySink::new();

        let report = run_import(
            &provider,
            &sink,
            uuid::Uuid::new_v4(),
            &request(vec!["ok1", "missing", "ok2"]),
            limits(),
        )
        .await
        .unwrap();

        assert_eq!(report.total_skipped, 1);
        assert_eq!(report.skipped_items[0].id, "missing");
        assert_eq!(report.skipped_items[0].error, "not found");
        assert_eq!(report.total_documents_imported, 2);
    }

    #[tokio::test]
    async fn test_non_recursive_folder_selection() {
        let provider = FakeProvider::new()
            .with_item(folder("top", "Top"))
            .with_item(file("inner", "inner.txt", 10))
            .with_children("top", vec!["inner"]);
        let sink = MemorySink::new();

        let mut req = request(vec!["top"]);
        req.include_folders = false;

        let report = run_import(&provider, &sink, uuid::Uuid::new_v4(), &req, limits())
            .await
            .unwrap();

        // Exactly one folder entry, no documents from its children.
        assert_eq!(report.total_folders_imported, 1);
        assert_eq!(report.total_documents_imported, 0);
        assert_eq!(report.total_skipped, 0);
    }

    #[tokio::test]
    async fn test_depth_bound_respected() {
        // root (1) / lvl2 (2) / lvl3 (3) / deep.txt (4)
        let provider = FakeProvider::new()
            .with_item(folder("root", "root"))
            .with_item(folder("lvl2", "lvl2"))
            .with_item(folder("lvl3", "lvl3"))
            .with_item(file("deep", "deep.txt", 10))
            .with_item(file("shallow", "shallow.txt", 10))
            .with_children("root", vec!["lvl2", "shallow"])
            .with_children("lvl2", vec!["lvl3"])
            .with_children("lvl3", vec!["deep"]);
        let sink = MemorySink::new();

        let mut req = request(vec!["root"]);
        req.max_depth = 3;

        let report = run_import(&provider, &sink, uuid::Uuid::new_v4(), &req, limits())
            .await
            .unwrap();

        // Folders at depth 3 are imported; their contents are not visited.
        assert_eq!(report.total_folders_imported, 3);
        assert_eq!(report.total_documents_imported, 1);
        let documents = sink.documents.lock().unwrap();
        assert_eq!(documents[0].name, "shallow.txt");
    }

    #[tokio::test]
    async fn test_auth_gate_blocks_before_any_outcome() {
        let provider = FakeProvider::new()
            .with_item(file("a", "a.txt", 10))
            .disconnected();
        let sink = MemorySink::new();

        let result = run_import(
            &provider,
            &sink,
            uuid::Uuid::new_v4(),
            &request(vec!["a"]),
            limits(),
        )
        .await;

        assert!(matches!(
            result,
            Err(ImportError::Remote(RemoteError::Auth(_)))
        ));
        assert!(sink.documents.lock().unwrap().is_empty());
        assert!(sink.folders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_rejected() {
        let provider = FakeProvider::new();
        let sink = MemorySink::new();

        let result = run_import(
            &provider,
            &sink,
            uuid::Uuid::new_v4(),
            &request(vec![]),
            limits(),
        )
        .await;

        assert!(matches!(result, Err(ImportError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_repeat_import_reuses_existing_folders() {
        let provider = FakeProvider::new()
            .with_item(folder("root", "Reports"))
            .with_item(file("doc", "q1.pdf", 10))
            .with_children("root", vec!["doc"]);
        let sink = MemorySink::new();
        let owner = uuid::Uuid::new_v4();

        for _ in 0..2 {
            run_import(&provider, &sink, owner, &request(vec!["root"]), limits())
                .await
                .unwrap();
        }

        // The second call lands in the folder the first call created;
        // documents are imported again (default double-import behavior).
        let folders = sink.folders.lock().unwrap();
        let documents = sink.documents.lock().unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(documents.len(), 2);
        assert!(documents.iter().all(|d| d.folder_id == Some(folders[0].id)));
    }

    #[tokio::test]
    async fn test_source_annotation_recorded() {
        let provider = FakeProvider::new().with_item(file("remote-1", "a.txt", 10));
        let sink = MemorySink::new();

        run_import(
            &provider,
            &sink,
            uuid::Uuid::new_v4(),
            &request(vec!["remote-1"]),
            limits(),
        )
        .await
        .unwrap();

        let documents = sink.documents.lock().unwrap();
        assert_eq!(documents[0].source_id, "remote-1");
    }
}
