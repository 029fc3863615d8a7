use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use filestash::config::Config;
use filestash::models::{FileRecord, FolderRecord, Identity};
use filestash::services::{FileManager, UploadSettings};
use filestash::storage::StorageManager;
use filestash::{create_router, AppState};
use std::sync::Arc;

use super::memory::{MemoryAuth, MemoryMetadataStore, MemoryObjectStore};

#[allow(dead_code)]
pub const OWNER: &str = "user-alice";

#[allow(dead_code)]
pub fn identity() -> Identity {
    Identity {
        id: OWNER.to_string(),
        email: "alice@example.com".to_string(),
    }
}

#[allow(dead_code)]
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[allow(dead_code)]
pub fn file_record(id: &str, owner: &str, name: &str, created_secs: i64) -> FileRecord {
    let key = format!("{}/{}-{}", owner, created_secs, id);
    FileRecord {
        id: id.to_string(),
        user_id: owner.to_string(),
        name: key.clone(),
        original_name: name.to_string(),
        file_type: mime_for(name).to_string(),
        file_size: 10,
        storage_path: key,
        created_at: at(created_secs),
    }
}

#[allow(dead_code)]
pub fn folder_record(id: &str, owner: &str, name: &str, created_secs: i64) -> FolderRecord {
    FolderRecord {
        id: id.to_string(),
        user_id: owner.to_string(),
        name: name.to_string(),
        created_at: at(created_secs),
    }
}

fn mime_for(name: &str) -> &'static str {
    if name.ends_with(".png") {
        "image/png"
    } else {
        "text/plain"
    }
}

/// File manager for `OWNER` over the given fakes
#[allow(dead_code)]
pub fn manager(objects: &Arc<MemoryObjectStore>, metadata: &Arc<MemoryMetadataStore>) -> FileManager {
    FileManager::new(
        identity(),
        objects.clone(),
        metadata.clone(),
        UploadSettings::default(),
    )
}

/// Full router over in-memory backends
#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub auth: Arc<MemoryAuth>,
    pub objects: Arc<MemoryObjectStore>,
    pub metadata: Arc<MemoryMetadataStore>,
}

#[allow(dead_code)]
pub fn test_server() -> TestApp {
    test_server_with(Config::default())
}

#[allow(dead_code)]
pub fn test_server_with(config: Config) -> TestApp {
    let auth = MemoryAuth::new().with_account("alice@example.com", "correct horse");
    let objects = MemoryObjectStore::new();
    let metadata = MemoryMetadataStore::new();

    let storage = StorageManager::shared(objects.clone(), metadata.clone());
    let state = AppState::new(config, auth.clone(), storage);
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    TestApp {
        server,
        auth,
        objects,
        metadata,
    }
}
