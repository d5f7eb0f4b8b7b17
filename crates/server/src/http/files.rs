//! Signed URL dereference for locally stored objects.

use super::error::ApiError;
use super::messages::Message;
use super::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use lectern_classroom::material::{file_extension, mime_for_extension};
use lectern_classroom::storage::validate_object_path;
use lectern_classroom::{ObjectStorage, SignatureError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    expires: Option<i64>,
    signature: Option<String>,
}

/// `GET /storage/{bucket}/{*path}?expires=..&signature=..`
pub async fn download(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, ApiError> {
    let locale = state.locale;
    let storage = &state.classroom.storage;

    if bucket != storage.bucket() || validate_object_path(&path).is_err() {
        return Err(ApiError::new(StatusCode::NOT_FOUND, Message::FileMissing, locale));
    }

    let (Some(expires), Some(signature)) = (query.expires, query.signature) else {
        return Err(ApiError::new(StatusCode::FORBIDDEN, Message::LinkInvalid, locale));
    };

    match storage
        .signer()
        .verify(&bucket, &path, expires, &signature, Utc::now())
    {
        Ok(()) => {}
        Err(SignatureError::Invalid) => {
            tracing::warn!("Rejected bad signature for {}/{}", bucket, path);
            return Err(ApiError::new(StatusCode::FORBIDDEN, Message::LinkInvalid, locale));
        }
        Err(SignatureError::Expired) => {
            tracing::debug!("Rejected expired link for {}/{}", bucket, path);
            return Err(ApiError::new(StatusCode::FORBIDDEN, Message::LinkExpired, locale));
        }
    }

    let bytes = storage.read(&path).await.map_err(|e| {
        tracing::error!("Failed to read {}/{}: {}", bucket, path, e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, Message::Internal, locale)
    })?;
    let Some(bytes) = bytes else {
        return Err(ApiError::new(StatusCode::NOT_FOUND, Message::FileMissing, locale));
    };

    let content_type = file_extension(&path)
        .map(|ext| mime_for_extension(&ext))
        .unwrap_or("application/octet-stream");

    tracing::info!("Served {}/{} ({} bytes)", bucket, path, bytes.len());
    Ok(([(CONTENT_TYPE, content_type)], bytes).into_response())
}
