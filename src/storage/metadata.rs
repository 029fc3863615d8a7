use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{FileRecord, FolderRecord, NewFileRecord};

/// Tabular store holding file and folder rows
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Files owned by `owner`, newest first
    async fn select_files(&self, owner: &str) -> StoreResult<Vec<FileRecord>>;

    /// Folders owned by `owner`, newest first
    async fn select_folders(&self, owner: &str) -> StoreResult<Vec<FolderRecord>>;

    /// Insert a file row and return it as stored
    async fn insert_file(&self, row: NewFileRecord) -> StoreResult<FileRecord>;

    async fn delete_file(&self, id: &str) -> StoreResult<()>;
}
