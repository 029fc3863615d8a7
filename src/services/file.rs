use chrono::Utc;
use rand::Rng;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::Config;
use crate::error::{DeleteError, DownloadError, ListError, StoreError, StoreResult, UploadError};
use crate::models::{
    sort_newest_first, Download, FileRecord, FileResponse, FolderRecord, Identity, NewFileRecord,
    RawUpload, WorkspaceResponse,
};
use crate::storage::{MetadataStore, ObjectStore, PutOptions};

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TOKEN_LEN: usize = 11;

/// Upload and preview settings
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub cache_control: String,
    pub preview_ttl: Duration,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            cache_control: "3600".to_string(),
            preview_ttl: Duration::from_secs(3600),
        }
    }
}

impl From<&Config> for UploadSettings {
    fn from(config: &Config) -> Self {
        Self {
            cache_control: config.uploads.cache_control.clone(),
            preview_ttl: config.preview.signed_url_ttl(),
        }
    }
}

/// What the file browser currently shows. Lists are only ever replaced whole.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub files: Vec<FileRecord>,
    pub folders: Vec<FolderRecord>,
    pub loading: bool,
    pub uploading: bool,
}

impl From<ViewState> for WorkspaceResponse {
    fn from(view: ViewState) -> Self {
        Self {
            files: view.files.into_iter().map(FileResponse::from).collect(),
            folders: view.folders,
            loading: view.loading,
            uploading: view.uploading,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BusyFlag {
    Loading,
    Uploading,
}

impl BusyFlag {
    fn slot(self, view: &mut ViewState) -> &mut bool {
        match self {
            BusyFlag::Loading => &mut view.loading,
            BusyFlag::Uploading => &mut view.uploading,
        }
    }
}

/// Holds a busy flag raised until dropped
struct BusyGuard<'a> {
    view: &'a Mutex<ViewState>,
    flag: BusyFlag,
}

impl<'a> BusyGuard<'a> {
    /// `None` when the flag is already raised
    fn acquire(view: &'a Mutex<ViewState>, flag: BusyFlag) -> Option<Self> {
        let mut state = view.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = flag.slot(&mut state);
        if *slot {
            return None;
        }
        *slot = true;
        Some(Self { view, flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        *self.flag.slot(&mut state) = false;
    }
}

/// Failure of a two-phase write whose first phase already took effect
#[derive(Debug)]
pub enum Compensated {
    /// Second phase failed; the first phase was undone
    RolledBack(StoreError),
    /// Second phase failed and undoing the first failed too
    RollbackFailed {
        error: StoreError,
        rollback_error: StoreError,
    },
}

/// Run the second phase of a two-phase write. If it fails, run `rollback`
/// exactly once to undo the first phase before reporting the failure.
pub async fn commit_or_compensate<T, C, R, RF>(commit: C, rollback: R) -> Result<T, Compensated>
where
    C: Future<Output = StoreResult<T>>,
    R: FnOnce() -> RF,
    RF: Future<Output = StoreResult<()>>,
{
    match commit.await {
        Ok(value) => Ok(value),
        Err(error) => match rollback().await {
            Ok(()) => Err(Compensated::RolledBack(error)),
            Err(rollback_error) => Err(Compensated::RollbackFailed {
                error,
                rollback_error,
            }),
        },
    }
}

/// Storage key unique per identity and per attempt:
/// `{identity}/{unix micros}-{random token}{.ext}`
pub fn storage_key(identity_id: &str, original_name: &str) -> String {
    storage_key_with(
        identity_id,
        original_name,
        Utc::now().timestamp_micros(),
        &random_token(TOKEN_LEN),
    )
}

fn storage_key_with(identity_id: &str, original_name: &str, micros: i64, token: &str) -> String {
    match file_extension(original_name) {
        Some(ext) => format!("{}/{}-{}.{}", identity_id, micros, token, ext),
        None => format!("{}/{}-{}", identity_id, micros, token),
    }
}

/// Text after the last dot, if any
fn file_extension(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && !ext.contains(['/', '\\']))
}

fn random_token(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

fn validate_file_name(name: &str) -> Result<(), UploadError> {
    if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
        return Err(UploadError::InvalidFile(format!("invalid file name {:?}", name)));
    }
    Ok(())
}

/// Prompt the user has to accept before a file is deleted
pub fn delete_prompt(record: &FileRecord) -> String {
    format!("Are you sure you want to delete \"{}\"?", record.original_name)
}

/// File lifecycle orchestrator for one signed-in identity.
///
/// Every mutation is followed by a full re-fetch of the file list, so the
/// view always reflects what the metadata store holds. No call is retried.
pub struct FileManager {
    identity: Identity,
    objects: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    settings: UploadSettings,
    view: Mutex<ViewState>,
}

impl FileManager {
    pub fn new(
        identity: Identity,
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            identity,
            objects,
            metadata,
            settings,
            view: Mutex::new(ViewState::default()),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    fn view(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current view
    pub fn snapshot(&self) -> ViewState {
        self.view().clone()
    }

    /// Initial load of files and folders. While one load is in flight a second
    /// call returns the current view without touching the stores.
    pub async fn load(&self) -> Result<ViewState, ListError> {
        let Some(loading) = BusyGuard::acquire(&self.view, BusyFlag::Loading) else {
            return Ok(self.snapshot());
        };

        let (files, _) = tokio::join!(self.list_files(), self.list_folders());
        drop(loading);

        files.map(|_| self.snapshot())
    }

    /// Fetch the identity's files, newest first, and replace the view's list.
    /// On failure the previous list stays in place.
    pub async fn list_files(&self) -> Result<Vec<FileRecord>, ListError> {
        match self.metadata.select_files(&self.identity.id).await {
            Ok(mut files) => {
                sort_newest_first(&mut files, |f| f.created_at);
                tracing::debug!(identity = %self.identity.id, count = files.len(), "Files loaded");
                self.view().files = files.clone();
                Ok(files)
            }
            Err(e) => {
                tracing::error!(identity = %self.identity.id, "Error loading files: {}", e);
                Err(ListError(e))
            }
        }
    }

    /// Fetch the identity's folders. Failures are logged and leave an empty list.
    pub async fn list_folders(&self) -> Vec<FolderRecord> {
        let folders = match self.metadata.select_folders(&self.identity.id).await {
            Ok(mut folders) => {
                sort_newest_first(&mut folders, |f| f.created_at);
                folders
            }
            Err(e) => {
                tracing::error!(identity = %self.identity.id, "Error loading folders: {}", e);
                Vec::new()
            }
        };

        self.view().folders = folders.clone();
        folders
    }

    /// Store the bytes, then record them. If the record cannot be written the
    /// object is deleted again so neither exists without the other.
    pub async fn upload(&self, upload: RawUpload) -> Result<FileRecord, UploadError> {
        validate_file_name(&upload.file_name)?;
        let _uploading =
            BusyGuard::acquire(&self.view, BusyFlag::Uploading).ok_or(UploadError::Busy)?;

        let key = storage_key(&self.identity.id, &upload.file_name);
        let file_type = upload.mime_type();
        let file_size = upload.size();
        tracing::info!(identity = %self.identity.id, key = %key, size = file_size, "Uploading file");

        let options = PutOptions {
            cache_control: self.settings.cache_control.clone(),
            overwrite: false,
            content_type: Some(file_type.clone()),
        };
        self.objects
            .put(&key, upload.data, &options)
            .await
            .map_err(|e| {
                tracing::error!(identity = %self.identity.id, key = %key, "Upload error: {}", e);
                UploadError::StoreWrite(e)
            })?;

        let row = NewFileRecord {
            user_id: self.identity.id.clone(),
            name: key.clone(),
            original_name: upload.file_name,
            file_type,
            file_size,
            storage_path: key.clone(),
        };
        let keys = [key.clone()];
        let record = commit_or_compensate(self.metadata.insert_file(row), || {
            self.objects.delete(&keys)
        })
        .await
        .map_err(|failure| match failure {
            Compensated::RolledBack(insert) => {
                tracing::error!(
                    identity = %self.identity.id,
                    key = %key,
                    "Database error, stored object removed again: {}",
                    insert
                );
                UploadError::MetadataInsert(insert)
            }
            Compensated::RollbackFailed {
                error,
                rollback_error,
            } => {
                tracing::error!(
                    identity = %self.identity.id,
                    key = %key,
                    "Database error and cleanup failed, object is orphaned: {} / {}",
                    error,
                    rollback_error
                );
                UploadError::Orphaned {
                    key: key.clone(),
                    insert: error,
                    cleanup: rollback_error,
                }
            }
        })?;

        tracing::info!(identity = %self.identity.id, file_id = %record.id, "Upload recorded");
        if let Err(e) = self.list_files().await {
            tracing::warn!(file_id = %record.id, "Upload succeeded but refresh failed: {}", e);
        }

        Ok(record)
    }

    /// Find one of the identity's files, re-fetching the list if the view doesn't have it
    async fn find_file(&self, file_id: &str) -> StoreResult<Option<FileRecord>> {
        let cached = self.view().files.iter().find(|f| f.id == file_id).cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        let files = self.list_files().await.map_err(|e| e.0)?;
        Ok(files.into_iter().find(|f| f.id == file_id))
    }

    /// Fetch a file's bytes for saving under its original name
    pub async fn download(&self, file_id: &str) -> Result<Download, DownloadError> {
        let record = self
            .find_file(file_id)
            .await
            .map_err(DownloadError::Lookup)?
            .ok_or_else(|| DownloadError::NotFound(file_id.to_string()))?;

        let data = self.objects.get(&record.storage_path).await.map_err(|e| {
            tracing::error!(file_id = %record.id, key = %record.storage_path, "Error downloading file: {}", e);
            DownloadError::Fetch(e)
        })?;

        Ok(Download {
            file_name: record.original_name,
            content_type: record.file_type,
            data,
        })
    }

    /// Signed preview URL for image files. Anything else, or a signing failure, gives `None`.
    pub async fn preview_url(&self, file_id: &str) -> Result<Option<String>, DownloadError> {
        let record = self
            .find_file(file_id)
            .await
            .map_err(DownloadError::Lookup)?
            .ok_or_else(|| DownloadError::NotFound(file_id.to_string()))?;

        if !record.is_image() {
            return Ok(None);
        }

        match self
            .objects
            .signed_url(&record.storage_path, self.settings.preview_ttl)
            .await
        {
            Ok(url) => Ok(url),
            Err(e) => {
                tracing::warn!(file_id = %record.id, "Preview URL unavailable: {}", e);
                Ok(None)
            }
        }
    }

    /// Delete a file. Without `confirmed` nothing is sent and the prompt is returned.
    /// The object goes first; the record is only removed once the object is gone.
    pub async fn delete(&self, file_id: &str, confirmed: bool) -> Result<(), DeleteError> {
        let record = self
            .find_file(file_id)
            .await
            .map_err(DeleteError::Lookup)?
            .ok_or_else(|| DeleteError::NotFound(file_id.to_string()))?;

        if !confirmed {
            return Err(DeleteError::ConfirmationRequired {
                prompt: delete_prompt(&record),
            });
        }

        self.objects
            .delete(std::slice::from_ref(&record.storage_path))
            .await
            .map_err(|e| {
                tracing::error!(file_id = %record.id, key = %record.storage_path, "Error deleting stored object: {}", e);
                DeleteError::ObjectDelete(e)
            })?;

        let outcome = match self.metadata.delete_file(&record.id).await {
            Ok(()) => {
                tracing::info!(identity = %self.identity.id, file_id = %record.id, "File deleted");
                Ok(())
            }
            // Removed by another session of the same identity
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(file_id = %record.id, "File record already gone");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    file_id = %record.id,
                    key = %record.storage_path,
                    "Stored object removed but its record remains: {}",
                    e
                );
                Err(DeleteError::MetadataDelete(e))
            }
        };

        if let Err(e) = self.list_files().await {
            tracing::warn!(file_id = %record.id, "Refresh after delete failed: {}", e);
        }

        outcome
    }
}
