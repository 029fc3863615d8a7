use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::models::CurrentSession;
use crate::services::{FileManager, UploadSettings};
use crate::storage::StorageManager;

/// Default idle time after which an unused workspace is dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct OpenWorkspace {
    access_token: String,
    manager: Arc<FileManager>,
    last_used: Instant,
}

/// File managers of the identities currently signed in, one per identity
pub struct Workspaces {
    storage: Arc<StorageManager>,
    settings: UploadSettings,
    idle_timeout: Duration,
    open: Mutex<HashMap<String, OpenWorkspace>>,
}

impl Workspaces {
    pub fn new(storage: Arc<StorageManager>, settings: UploadSettings) -> Self {
        Self::with_idle_timeout(storage, settings, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(
        storage: Arc<StorageManager>,
        settings: UploadSettings,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            settings,
            idle_timeout,
            open: Mutex::new(HashMap::new()),
        }
    }

    /// File manager for the session's identity. A new access token gets a fresh
    /// manager, since platform stores are bound to the token they were built with.
    /// Workspaces idle for longer than the timeout are dropped on the way.
    pub fn open(&self, session: &CurrentSession) -> Arc<FileManager> {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        let before = open.len();
        open.retain(|id, ws| {
            id == &session.identity.id || now.duration_since(ws.last_used) < self.idle_timeout
        });
        if open.len() < before {
            tracing::debug!(evicted = before - open.len(), "Dropped idle workspaces");
        }

        if let Some(existing) = open.get_mut(&session.identity.id) {
            if existing.access_token == session.access_token {
                existing.last_used = now;
                return existing.manager.clone();
            }
        }

        let manager = Arc::new(FileManager::new(
            session.identity.clone(),
            self.storage.object_store(session),
            self.storage.metadata_store(session),
            self.settings.clone(),
        ));
        open.insert(
            session.identity.id.clone(),
            OpenWorkspace {
                access_token: session.access_token.clone(),
                manager: manager.clone(),
                last_used: now,
            },
        );
        tracing::debug!(identity = %session.identity.id, "Opened workspace");
        manager
    }

    /// Drop the identity's view state
    pub fn close(&self, identity_id: &str) {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if open.remove(identity_id).is_some() {
            tracing::debug!(identity = %identity_id, "Closed workspace");
        }
    }

    /// Drop the workspace opened with an access token that is no longer accepted
    pub fn close_token(&self, access_token: &str) {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        open.retain(|id, ws| {
            let keep = ws.access_token != access_token;
            if !keep {
                tracing::debug!(identity = %id, "Closed workspace of rejected token");
            }
            keep
        });
    }

    pub fn is_open(&self, identity_id: &str) -> bool {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(identity_id)
    }

    pub fn len(&self) -> usize {
        self.open.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
