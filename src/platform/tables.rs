use async_trait::async_trait;
use reqwest::Method;

use crate::error::{StoreError, StoreResult};
use crate::models::{FileRecord, FolderRecord, NewFileRecord};
use crate::platform::PlatformClient;
use crate::storage::MetadataStore;

const FILES_TABLE: &str = "/rest/v1/files";
const FOLDERS_TABLE: &str = "/rest/v1/folders";

/// The platform's `files` and `folders` tables, acting for a signed-in user
pub struct PlatformTables {
    client: PlatformClient,
    access_token: String,
}

impl PlatformTables {
    pub fn new(client: PlatformClient, access_token: impl Into<String>) -> Self {
        Self {
            client,
            access_token: access_token.into(),
        }
    }

    fn owner_filter(owner: &str) -> [(&'static str, String); 3] {
        [
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", owner)),
            ("order", "created_at.desc".to_string()),
        ]
    }
}

#[async_trait]
impl MetadataStore for PlatformTables {
    async fn select_files(&self, owner: &str) -> StoreResult<Vec<FileRecord>> {
        let request = self
            .client
            .request(Method::GET, FILES_TABLE, Some(&self.access_token))
            .query(&Self::owner_filter(owner));
        self.client.send_json(request).await
    }

    async fn select_folders(&self, owner: &str) -> StoreResult<Vec<FolderRecord>> {
        let request = self
            .client
            .request(Method::GET, FOLDERS_TABLE, Some(&self.access_token))
            .query(&Self::owner_filter(owner));
        self.client.send_json(request).await
    }

    async fn insert_file(&self, row: NewFileRecord) -> StoreResult<FileRecord> {
        let request = self
            .client
            .request(Method::POST, FILES_TABLE, Some(&self.access_token))
            .header("Prefer", "return=representation")
            .json(&row);

        let mut rows: Vec<FileRecord> = self.client.send_json(request).await?;
        if rows.is_empty() {
            return Err(StoreError::Decode("insert returned no row".to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    async fn delete_file(&self, id: &str) -> StoreResult<()> {
        let request = self
            .client
            .request(Method::DELETE, FILES_TABLE, Some(&self.access_token))
            .query(&[("id", format!("eq.{}", id))]);

        self.client.send(request).await?;
        Ok(())
    }
}
