use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure reported by an object store or metadata store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The backend answered with an error; `message` is its own wording
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    /// Raw message from the auth service, shown to the user unmodified
    #[error("{0}")]
    Rejected(String),

    #[error("Missing or invalid session")]
    Unauthenticated,

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected { status: 401, .. } => AuthError::Unauthenticated,
            StoreError::Rejected { message, .. } => AuthError::Rejected(message),
            other => AuthError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to load files: {0}")]
pub struct ListError(#[from] pub StoreError);

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("An upload is already in progress")]
    Busy,

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Upload failed: {0}")]
    StoreWrite(#[source] StoreError),

    /// The object was written, its metadata row was not, and the object was removed again
    #[error("Database error: {0}")]
    MetadataInsert(#[source] StoreError),

    /// Like `MetadataInsert`, but removing the object failed too
    #[error("Database error: {insert}. The stored object {key} could not be removed: {cleanup}")]
    Orphaned {
        key: String,
        insert: StoreError,
        cleanup: StoreError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to load files: {0}")]
    Lookup(#[source] StoreError),

    #[error("Download failed: {0}")]
    Fetch(#[source] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    /// Nothing was sent; the caller must ask the user and retry with confirmation
    #[error("{prompt}")]
    ConfirmationRequired { prompt: String },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to load files: {0}")]
    Lookup(#[source] StoreError),

    #[error("Failed to delete stored object: {0}")]
    ObjectDelete(#[source] StoreError),

    #[error("Failed to delete file record: {0}")]
    MetadataDelete(#[source] StoreError),
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    List(#[from] ListError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Delete(#[from] DeleteError),
}

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn success_message(message: &str) -> ApiResponse<()> {
        ApiResponse {
            code: 0,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn error(code: i32, message: &str) -> ApiResponse<()> {
        ApiResponse {
            code,
            message: message.to_string(),
            data: None,
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Auth(e) => match e {
                AuthError::InvalidInput(_) | AuthError::Rejected(_) => StatusCode::BAD_REQUEST,
                AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
                AuthError::Unavailable(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::List(_) => StatusCode::BAD_GATEWAY,
            AppError::Upload(e) => match e {
                UploadError::Busy => StatusCode::CONFLICT,
                UploadError::InvalidFile(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::Download(e) => match e {
                DownloadError::NotFound(_) => StatusCode::NOT_FOUND,
                DownloadError::Lookup(_) | DownloadError::Fetch(_) => StatusCode::BAD_GATEWAY,
            },
            AppError::Delete(e) => match e {
                DeleteError::ConfirmationRequired { .. } => StatusCode::CONFLICT,
                DeleteError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(ApiResponse::<()>::error(status.as_u16() as i32, &self.to_string()));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
