//! Material endpoints: dashboards, upload, detail, deletion and Q&A.

use super::error::ApiError;
use super::messages::Message;
use super::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::Engine;
use lectern_classroom::{Material, MaterialListing, NewMaterial, Question, RequestContext, SignedFileReference};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    subject_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    file_name: String,
    /// File contents, standard base64
    #[serde(default)]
    file_base64: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    deleted: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    reply: String,
}

pub async fn list_all(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<MaterialListing>>, ApiError> {
    ctx.require_session()
        .map_err(|e| ApiError::identity(e, state.locale))?;

    let listings = state
        .classroom
        .catalog
        .list_all()
        .map_err(|e| ApiError::catalog(e, state.locale))?;
    Ok(Json(listings))
}

pub async fn list_mine(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<MaterialListing>>, ApiError> {
    let teacher = ctx
        .require_teacher()
        .map_err(|e| ApiError::identity(e, state.locale))?;

    let listings = state
        .classroom
        .catalog
        .list_for_teacher(&teacher.user_id)
        .map_err(|e| ApiError::catalog(e, state.locale))?;
    Ok(Json(listings))
}

pub async fn upload(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Material>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::body(e, state.locale))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(request.file_base64.trim())
        .map_err(|e| {
            tracing::debug!("Rejected upload with invalid base64: {}", e);
            ApiError::new(StatusCode::BAD_REQUEST, Message::InvalidUpload, state.locale)
        })?;

    let material = state
        .classroom
        .catalog
        .upload(
            &ctx,
            NewMaterial {
                subject_name: request.subject_name,
                description: request.description,
                file_name: request.file_name,
                bytes,
            },
        )
        .await
        .map_err(|e| ApiError::catalog(e, state.locale))?;

    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn detail(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<MaterialListing>, ApiError> {
    ctx.require_session()
        .map_err(|e| ApiError::identity(e, state.locale))?;

    let listing = state
        .classroom
        .catalog
        .get(&id)
        .map_err(|e| ApiError::catalog(e, state.locale))?;
    Ok(Json(listing))
}

pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let outcome = state
        .classroom
        .catalog
        .delete(&ctx, &id)
        .await
        .map_err(|e| ApiError::catalog(e, state.locale))?;

    Ok(Json(DeleteResponse {
        deleted: outcome.material_id,
        warning: outcome
            .storage_warning
            .map(|_| Message::StorageDeleteFailed.text(state.locale)),
    }))
}

pub async fn reference(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<SignedFileReference>, ApiError> {
    ctx.require_session()
        .map_err(|e| ApiError::identity(e, state.locale))?;

    let reference = state
        .classroom
        .resolver
        .resolve(&id)
        .await
        .map_err(|e| ApiError::resolve(e, state.locale))?;
    Ok(Json(reference))
}

/// Resolve the material and ask in one round trip.
pub async fn ask(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::body(e, state.locale))?;
    let session = ctx
        .require_session()
        .map_err(|e| ApiError::identity(e, state.locale))?;

    let reference = state
        .classroom
        .resolver
        .resolve(&id)
        .await
        .map_err(|e| ApiError::resolve(e, state.locale))?;

    let answer = state
        .classroom
        .exchange
        .ask(&Question::new(request.question, &session.user_id, reference.url))
        .await
        .map_err(|e| ApiError::exchange(e, state.locale))?;

    Ok(Json(AskResponse { reply: answer.text }))
}
