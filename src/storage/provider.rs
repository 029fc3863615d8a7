use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::StoreResult;

/// Options applied when writing an object
#[derive(Debug, Clone)]
pub struct PutOptions {
    /// Cache lifetime in seconds, as sent to the store
    pub cache_control: String,
    /// Replace an existing object under the same key
    pub overwrite: bool,
    pub content_type: Option<String>,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            cache_control: "3600".to_string(),
            overwrite: false,
            content_type: None,
        }
    }
}

/// Object store trait
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write bytes under `key`
    async fn put(&self, key: &str, data: Bytes, options: &PutOptions) -> StoreResult<()>;

    /// Read the bytes stored under `key`
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// Remove every listed key
    async fn delete(&self, keys: &[String]) -> StoreResult<()>;

    /// Time-limited URL for reading `key` without a session.
    /// Backends that cannot sign return `None`.
    async fn signed_url(&self, key: &str, ttl: Duration) -> StoreResult<Option<String>>;

    /// Get the storage type name
    fn storage_type(&self) -> &'static str;
}
