pub mod rest;

use crate::config::Config;
use crate::db::DbPool;
use crate::storage::BlobStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub blob_store: Arc<BlobStore>,
    pub config: Config,
    /// Shared HTTP client for Google OAuth and Drive calls
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: DbPool, blob_store: BlobStore, config: Config) -> Self {
        Self {
            db,
            blob_store: Arc::new(blob_store),
            config,
            http: reqwest::Client::new(),
        }
    }
}
