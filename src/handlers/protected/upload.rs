// handlers/protected/upload.rs - POST /upload (multipart field `document`)

use axum::extract::{multipart::MultipartError, Multipart, State};
use axum::http::StatusCode;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::routes::AppState;
use crate::services::StorageError;

const FIELD: &str = "document";

pub async fn upload_post(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let limit = state.documents.max_bytes();

    while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(e, limit))? {
        if field.name() != Some(FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        let url = state.documents.upload(&file_name, &bytes).await?;
        return Ok(ApiResponse::ok().with("url", url));
    }

    Err(StorageError::MissingFile.into())
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return StorageError::TooLarge { limit }.into();
    }
    ApiError::bad_request(err.body_text())
}
