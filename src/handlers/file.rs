use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Extension, Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{
    format_file_size, CurrentSession, DeleteQuery, FileResponse, FolderRecord, PreviewResponse,
    RawUpload, WorkspaceResponse,
};
use crate::AppState;

/// Open the workspace: files, folders and busy flags in one payload
/// GET /api/v1/workspace
pub async fn workspace(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<ApiResponse<WorkspaceResponse>>> {
    let manager = state.workspaces.open(&session);
    let view = manager.load().await?;
    Ok(Json(ApiResponse::success(view.into())))
}

/// List the caller's files, newest first
/// GET /api/v1/files
pub async fn list_files(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<ApiResponse<Vec<FileResponse>>>> {
    let manager = state.workspaces.open(&session);
    let files = manager.list_files().await?;
    Ok(Json(ApiResponse::success(
        files.into_iter().map(FileResponse::from).collect(),
    )))
}

/// List the caller's folders
/// GET /api/v1/folders
pub async fn list_folders(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<ApiResponse<Vec<FolderRecord>>>> {
    let manager = state.workspaces.open(&session);
    Ok(Json(ApiResponse::success(manager.list_folders().await)))
}

/// Upload a file
/// POST /api/v1/files (multipart/form-data, field `file`)
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<FileResponse>>> {
    let max_bytes = state.config.uploads.max_bytes;
    let mut upload: Option<RawUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;

        upload = Some(RawUpload::new(file_name, content_type, data));
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let manager = state.workspaces.open(&session);
    let record = manager.upload(upload).await?;
    Ok(Json(ApiResponse::success(record.into())))
}

/// Body over the upload limit becomes a 413, anything else a malformed request
fn multipart_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!(
            "File is too large: the upload limit is {}",
            format_file_size(max_bytes as i64)
        ))
    } else {
        AppError::BadRequest(format!("Failed to process multipart: {}", err))
    }
}

/// Download a file
/// GET /api/v1/files/:id/download
pub async fn download_file(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Result<Response> {
    let manager = state.workspaces.open(&session);
    let download = manager.download(&id).await?;

    let fallback_name = download.file_name.replace(['"', '\\'], "_");
    let encoded_name = urlencoding::encode(&download.file_name);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, download.content_type)
        .header(header::CONTENT_LENGTH, download.data.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                fallback_name, encoded_name
            ),
        )
        .body(Body::from(download.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// Time-limited preview link for an image file; `url` is null otherwise
/// GET /api/v1/files/:id/preview
pub async fn preview_file(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PreviewResponse>>> {
    let manager = state.workspaces.open(&session);
    let url = manager.preview_url(&id).await?;
    Ok(Json(ApiResponse::success(PreviewResponse { id, url })))
}

/// Delete a file. Without `confirm=true` nothing is removed and the
/// confirmation prompt comes back as a 409.
/// DELETE /api/v1/files/:id?confirm=true
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<ApiResponse<()>>> {
    let manager = state.workspaces.open(&session);
    manager.delete(&id, query.confirm).await?;
    Ok(Json(ApiResponse::<()>::success_message("File deleted")))
}
