use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use filestash::error::{AuthError, StoreError, StoreResult};
use filestash::models::{FileRecord, FolderRecord, Identity, NewFileRecord, Session};
use filestash::services::AuthProvider;
use filestash::storage::{MetadataStore, ObjectStore, PutOptions};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

fn injected(what: &str) -> StoreError {
    StoreError::Rejected {
        status: 500,
        message: format!("injected {} failure", what),
    }
}

/// Holds one store call open until released
#[allow(dead_code)]
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[allow(dead_code)]
impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

/// Object store kept in a hash map, with switchable failures
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Bytes, PutOptions)>>,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_sign: AtomicBool,
    pub put_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    put_gate: Mutex<Option<Arc<Gate>>>,
}

#[allow(dead_code)]
impl MemoryObjectStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn options(&self, key: &str) -> Option<PutOptions> {
        self.objects.lock().unwrap().get(key).map(|(_, o)| o.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Hold the next `put` inside the store until the gate is released
    pub fn hold_next_put(&self, gate: Arc<Gate>) {
        *self.put_gate.lock().unwrap() = Some(gate);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: Bytes, options: &PutOptions) -> StoreResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.put_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(injected("put"));
        }

        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(key) && !options.overwrite {
            return Err(StoreError::Conflict(format!("{} already exists", key)));
        }
        objects.insert(key.to_string(), (data, options.clone()));
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, keys: &[String]) -> StoreResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(injected("delete"));
        }

        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> StoreResult<Option<String>> {
        if self.fail_sign.load(Ordering::SeqCst) {
            return Err(injected("sign"));
        }
        Ok(Some(format!("memory://{}?expires_in={}", key, ttl.as_secs())))
    }

    fn storage_type(&self) -> &'static str {
        "memory"
    }
}

/// Metadata store kept in vectors, returning rows in insertion order
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryMetadataStore {
    files: Mutex<Vec<FileRecord>>,
    folders: Mutex<Vec<FolderRecord>>,
    next_id: AtomicUsize,
    pub fail_select_files: AtomicBool,
    pub fail_select_folders: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_delete: AtomicBool,
    pub select_calls: AtomicUsize,
    select_gate: Mutex<Option<Arc<Gate>>>,
}

#[allow(dead_code)]
impl MemoryMetadataStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_file(&self, record: FileRecord) {
        self.files.lock().unwrap().push(record);
    }

    pub fn seed_folder(&self, record: FolderRecord) {
        self.folders.lock().unwrap().push(record);
    }

    pub fn files(&self) -> Vec<FileRecord> {
        self.files.lock().unwrap().clone()
    }

    /// Hold the next file select inside the store until the gate is released
    pub fn hold_next_select(&self, gate: Arc<Gate>) {
        *self.select_gate.lock().unwrap() = Some(gate);
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn select_files(&self, owner: &str) -> StoreResult<Vec<FileRecord>> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.select_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if self.fail_select_files.load(Ordering::SeqCst) {
            return Err(injected("select"));
        }
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == owner)
            .cloned()
            .collect())
    }

    async fn select_folders(&self, owner: &str) -> StoreResult<Vec<FolderRecord>> {
        if self.fail_select_folders.load(Ordering::SeqCst) {
            return Err(injected("folder select"));
        }
        Ok(self
            .folders
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == owner)
            .cloned()
            .collect())
    }

    async fn insert_file(&self, row: NewFileRecord) -> StoreResult<FileRecord> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(injected("insert"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = FileRecord {
            id: format!("file-{}", id),
            user_id: row.user_id,
            name: row.name,
            original_name: row.original_name,
            file_type: row.file_type,
            file_size: row.file_size,
            storage_path: row.storage_path,
            created_at: Utc::now(),
        };
        self.files.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn delete_file(&self, id: &str) -> StoreResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(injected("row delete"));
        }

        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|f| f.id != id);
        if files.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Auth service holding accounts and issued tokens in memory
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    tokens: Mutex<HashMap<String, Identity>>,
    next_token: AtomicUsize,
    pub fail_sign_out: AtomicBool,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl MemoryAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a confirmed account
    pub fn with_account(self: Arc<Self>, email: &str, password: &str) -> Arc<Self> {
        let identity = Identity {
            id: format!("user-{}", email.split('@').next().unwrap_or(email)),
            email: email.to_string(),
        };
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), identity));
        self
    }

    pub fn revoke(&self, access_token: &str) {
        self.tokens.lock().unwrap().remove(access_token);
    }

    pub fn active_tokens(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let identity = match self.accounts.lock().unwrap().get(email) {
            Some((stored, identity)) if stored == password => identity.clone(),
            _ => return Err(AuthError::Rejected("Invalid login credentials".to_string())),
        };

        let n = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let access_token = format!("token-{}-{}", identity.id, n);
        self.tokens
            .lock()
            .unwrap()
            .insert(access_token.clone(), identity.clone());

        Ok(Session {
            identity,
            access_token,
            refresh_token: None,
            expires_in: Some(3600),
        })
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(AuthError::Rejected("User already registered".to_string()));
        }
        // Unconfirmed: nothing can sign in until the address is confirmed
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("connection reset".to_string()));
        }
        self.tokens.lock().unwrap().remove(access_token);
        Ok(())
    }

    async fn current_identity(&self, access_token: &str) -> Result<Identity, AuthError> {
        self.tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}
