use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::FolderRecord;

/// MIME type recorded when the uploader declares none
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// File metadata row
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub user_id: String,
    /// Storage key, kept for compatibility with the hosted `files` table
    pub name: String,
    pub original_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }
}

/// Row written after the object itself has been stored
#[derive(Debug, Clone, Serialize)]
pub struct NewFileRecord {
    pub user_id: String,
    pub name: String,
    pub original_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_path: String,
}

/// File response with display info
#[derive(Debug, Clone, Serialize)]
pub struct FileResponse {
    #[serde(flatten)]
    pub record: FileRecord,
    pub size_label: String,
    pub is_image: bool,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            size_label: format_file_size(record.file_size),
            is_image: record.is_image(),
            record,
        }
    }
}

/// A file as handed over by the uploader, before anything is stored
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl RawUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data: data.into(),
        }
    }

    /// Declared MIME type, falling back to a generic binary type
    pub fn mime_type(&self) -> String {
        match self.content_type.as_deref().map(str::trim) {
            Some(ct) if !ct.is_empty() => ct.to_string(),
            _ => DEFAULT_MIME_TYPE.to_string(),
        }
    }

    pub fn size(&self) -> i64 {
        self.data.len() as i64
    }
}

/// Bytes of a stored file ready to be saved by the client
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Delete query parameters
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// Preview response
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub id: String,
    pub url: Option<String>,
}

/// Everything the file browser shows for one user
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkspaceResponse {
    pub files: Vec<FileResponse>,
    pub folders: Vec<FolderRecord>,
    pub loading: bool,
    pub uploading: bool,
}

/// Human readable size: "0 Bytes", "10 Bytes", "1.5 KB", "2 MB".
/// Anything past gigabytes is still expressed in GB.
pub fn format_file_size(bytes: i64) -> String {
    if bytes <= 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}
