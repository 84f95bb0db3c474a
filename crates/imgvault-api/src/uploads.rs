use axum::{
    Extension, Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::future::join_all;
use tracing::{error, info, warn};
use uuid::Uuid;

use imgvault_db::models::NewImage;
use imgvault_types::api::{BatchUploadResponse, FailedUpload, UploadResponse};
use imgvault_types::models::{Identity, ImageContentType};

use crate::error::ApiError;
use crate::state::{AppState, blocking};

/// 10 MB upload limit per file
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

pub const MAX_BATCH_FILES: usize = 100;

/// Room for multipart boundaries and part headers on top of file bytes.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub const SINGLE_UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE + MULTIPART_OVERHEAD;
pub const BATCH_UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE * MAX_BATCH_FILES + MULTIPART_OVERHEAD;

/// A file part that passed validation and is ready to store.
struct IncomingFile {
    filename: String,
    content_type: ImageContentType,
    data: Vec<u8>,
}

/// POST /upload/single: multipart field `file`.
pub async fn upload_single(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;

    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        if file.is_some() {
            return Err(ApiError::Validation("Only one file may be uploaded.".into()));
        }
        file = Some(read_file(field).await?);
    }

    let file = file.ok_or_else(|| ApiError::Validation("No file uploaded.".into()))?;
    let filename = file.filename.clone();
    let size = file.data.len();

    let id = persist(&state, identity.id, file).await?;

    info!(
        "Image {} ({}, {} bytes) uploaded by {}",
        id, filename, size, identity.username
    );

    Ok(Json(UploadResponse { id, filename }))
}

/// POST /upload/multiple: multipart field `files`, up to 100 parts.
///
/// Every part is validated before anything is written. Writes then run
/// independently, so the response reports per-file failures and the status
/// is 500 if any write failed.
pub async fn upload_multiple(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("files") {
            continue;
        }
        if files.len() == MAX_BATCH_FILES {
            return Err(ApiError::Validation(format!(
                "At most {MAX_BATCH_FILES} files may be uploaded at once."
            )));
        }
        files.push(read_file(field).await?);
    }

    if files.is_empty() {
        return Err(ApiError::Validation("No files uploaded.".into()));
    }

    let owner = identity.id;
    let results = join_all(files.into_iter().map(|file| {
        let state = state.clone();
        let filename = file.filename.clone();
        async move { (filename, persist(&state, owner, file).await) }
    }))
    .await;

    let mut uploaded = 0;
    let mut failed = Vec::new();
    for (filename, result) in results {
        match result {
            Ok(_) => uploaded += 1,
            Err(e) => failed.push(FailedUpload {
                filename,
                reason: e.to_string(),
            }),
        }
    }

    let status = if failed.is_empty() {
        info!("{} images uploaded by {}", uploaded, identity.username);
        StatusCode::OK
    } else {
        error!(
            "Batch upload by {}: {} stored, {} failed",
            identity.username,
            uploaded,
            failed.len()
        );
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, Json(BatchUploadResponse { uploaded, failed })))
}

/// Check a file part against the allow-list and size limit, reading it in
/// chunks so an oversized part is refused without buffering all of it.
async fn read_file(mut field: Field<'_>) -> Result<IncomingFile, ApiError> {
    let filename = field
        .file_name()
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Validation("File name is required.".into()))?;

    let mime = field.content_type().unwrap_or_default();
    let content_type = ImageContentType::from_mime(mime).ok_or_else(|| {
        warn!("Rejected upload {}: content type '{}'", filename, mime);
        ApiError::PayloadRejected("Invalid file type".into())
    })?;

    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if data.len() + chunk.len() > MAX_FILE_SIZE {
            warn!("Rejected upload {}: larger than {} bytes", filename, MAX_FILE_SIZE);
            return Err(ApiError::PayloadRejected("File too large".into()));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(IncomingFile {
        filename,
        content_type,
        data,
    })
}

async fn persist(state: &AppState, owner: Uuid, file: IncomingFile) -> Result<Uuid, ApiError> {
    let id = Uuid::new_v4();
    let image = NewImage {
        id: id.to_string(),
        owner_id: owner.to_string(),
        filename: file.filename,
        content_type: file.content_type,
        data: file.data,
    };

    let db = state.clone();
    blocking(move || Ok(db.db.insert_image(&image)?)).await?;

    Ok(id)
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadRejected("Request body too large".into())
    } else {
        ApiError::Validation(e.body_text())
    }
}
