use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{FileRecord, FolderRecord, NewFileRecord};
use crate::storage::MetadataStore;

/// Metadata store backed by a local SQLite database
#[derive(Clone)]
pub struct SqliteMetadataStore {
    db: Database,
}

impl SqliteMetadataStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn get_file(&self, id: &str) -> StoreResult<FileRecord> {
        sqlx::query_as("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("File record not found: {}", id)))
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn select_files(&self, owner: &str) -> StoreResult<Vec<FileRecord>> {
        // rowid keeps same-timestamp rows in insertion order
        let files = sqlx::query_as(
            "SELECT * FROM files WHERE user_id = ? ORDER BY created_at DESC, rowid ASC",
        )
        .bind(owner)
        .fetch_all(self.db.pool())
        .await?;

        Ok(files)
    }

    async fn select_folders(&self, owner: &str) -> StoreResult<Vec<FolderRecord>> {
        let folders = sqlx::query_as(
            "SELECT * FROM folders WHERE user_id = ? ORDER BY created_at DESC, rowid ASC",
        )
        .bind(owner)
        .fetch_all(self.db.pool())
        .await?;

        Ok(folders)
    }

    async fn insert_file(&self, row: NewFileRecord) -> StoreResult<FileRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO files (id, user_id, name, original_name, file_type, file_size, storage_path, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&row.user_id)
        .bind(&row.name)
        .bind(&row.original_name)
        .bind(&row.file_type)
        .bind(row.file_size)
        .bind(&row.storage_path)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        self.get_file(&id).await
    }

    async fn delete_file(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("File record not found: {}", id)));
        }
        Ok(())
    }
}
