//! Answer exchange endpoints.

use super::error::ApiError;
use super::messages::Message;
use super::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use lectern_classroom::{AnalysisKind, Question, RequestContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    file_url: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    reply: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    answer_text: String,
    #[serde(default)]
    operation: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    operation: AnalysisKind,
    result: String,
}

/// `POST /api/chat`: `{question, fileUrl}` to `{reply}`.
pub async fn chat(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::body(e, state.locale))?;

    let answer = state
        .classroom
        .exchange
        .ask(&Question::new(request.question, ctx.actor(), request.file_url))
        .await
        .map_err(|e| ApiError::exchange(e, state.locale))?;

    Ok(Json(ChatResponse { reply: answer.text }))
}

/// `POST /api/analyze`: summarize or explain a previous answer.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::body(e, state.locale))?;

    if request.answer_text.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            Message::InvalidRequest,
            state.locale,
        ));
    }

    let operation = AnalysisKind::parse(&request.operation).ok_or_else(|| {
        ApiError::new(StatusCode::BAD_REQUEST, Message::UnknownOperation, state.locale)
    })?;

    let answer = state
        .classroom
        .exchange
        .analyze(&request.answer_text, operation)
        .await
        .map_err(|e| ApiError::exchange(e, state.locale))?;

    Ok(Json(AnalyzeResponse {
        operation,
        result: answer.text,
    }))
}
