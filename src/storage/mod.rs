pub mod local;
pub mod metadata;
pub mod provider;
pub mod sqlite;

pub use local::*;
pub use metadata::*;
pub use provider::*;
pub use sqlite::*;

use std::sync::Arc;

use crate::config::{Config, MetadataBackend, StorageBackend};
use crate::db::Database;
use crate::models::CurrentSession;
use crate::platform::{PlatformClient, PlatformStorage, PlatformTables};

/// Where objects live
pub enum ObjectBackend {
    /// The platform bucket, accessed with each user's own token
    Platform { client: PlatformClient, bucket: String },
    /// One store shared by every session
    Shared(Arc<dyn ObjectStore>),
}

/// Where file and folder rows live
pub enum MetadataBackendKind {
    Platform(PlatformClient),
    Shared(Arc<dyn MetadataStore>),
}

/// Storage manager that hands out the stores serving a session
pub struct StorageManager {
    objects: ObjectBackend,
    metadata: MetadataBackendKind,
}

impl StorageManager {
    pub fn new(objects: ObjectBackend, metadata: MetadataBackendKind) -> Self {
        Self { objects, metadata }
    }

    /// Manager over fixed store instances
    pub fn shared(objects: Arc<dyn ObjectStore>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self::new(ObjectBackend::Shared(objects), MetadataBackendKind::Shared(metadata))
    }

    /// Build the configured backends
    pub async fn from_config(config: &Config, client: &PlatformClient) -> anyhow::Result<Self> {
        let objects = match config.storage.backend {
            StorageBackend::Platform => ObjectBackend::Platform {
                client: client.clone(),
                bucket: config.platform.bucket.clone(),
            },
            StorageBackend::Local => {
                ObjectBackend::Shared(Arc::new(LocalStorage::new(&config.storage.local_path)))
            }
        };

        let metadata = match config.metadata.backend {
            MetadataBackend::Platform => MetadataBackendKind::Platform(client.clone()),
            MetadataBackend::Sqlite => {
                let db = Database::new(&config.metadata.database_path).await?;
                db.run_migrations().await?;
                tracing::info!("Database initialized");
                MetadataBackendKind::Shared(Arc::new(SqliteMetadataStore::new(db)))
            }
        };

        Ok(Self::new(objects, metadata))
    }

    /// Get the object store for the given session
    pub fn object_store(&self, session: &CurrentSession) -> Arc<dyn ObjectStore> {
        match &self.objects {
            ObjectBackend::Platform { client, bucket } => Arc::new(PlatformStorage::new(
                client.clone(),
                bucket.clone(),
                session.access_token.clone(),
            )),
            ObjectBackend::Shared(store) => store.clone(),
        }
    }

    /// Get the metadata store for the given session
    pub fn metadata_store(&self, session: &CurrentSession) -> Arc<dyn MetadataStore> {
        match &self.metadata {
            MetadataBackendKind::Platform(client) => Arc::new(PlatformTables::new(
                client.clone(),
                session.access_token.clone(),
            )),
            MetadataBackendKind::Shared(store) => store.clone(),
        }
    }
}
