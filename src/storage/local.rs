use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{StoreError, StoreResult};
use crate::storage::{ObjectStore, PutOptions};

/// Local file system object store
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Map a key onto a path below the base directory, refusing anything that escapes it
    fn get_full_path(&self, key: &str) -> StoreResult<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if key.is_empty() || !is_plain {
            return Err(StoreError::Rejected {
                status: 400,
                message: format!("Invalid key: {}", key),
            });
        }

        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStorage {
    async fn put(&self, key: &str, data: Bytes, options: &PutOptions) -> StoreResult<()> {
        let full_path = self.get_full_path(key)?;

        // Ensure parent directory exists
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut open = fs::OpenOptions::new();
        open.write(true);
        if options.overwrite {
            open.create(true).truncate(true);
        } else {
            open.create_new(true);
        }

        let mut file = open.open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                StoreError::Conflict(format!("The resource already exists: {}", key))
            } else {
                StoreError::Io(e)
            }
        })?;
        file.write_all(&data).await?;
        file.flush().await?;

        tracing::debug!("Saved object to {:?}", full_path);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let full_path = self.get_full_path(key)?;

        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(format!("Object not found: {}", key))
            } else {
                StoreError::Io(e)
            }
        })?;

        Ok(Bytes::from(data))
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        for key in keys {
            let full_path = self.get_full_path(key)?;

            if fs::try_exists(&full_path).await? {
                fs::remove_file(&full_path).await?;
                tracing::debug!("Deleted object {:?}", full_path);
            }
        }

        Ok(())
    }

    async fn signed_url(&self, _key: &str, _ttl: Duration) -> StoreResult<Option<String>> {
        // Objects on disk are only reachable through the download endpoint
        Ok(None)
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }
}
