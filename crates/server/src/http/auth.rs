//! Account endpoints.

use super::context::bearer_token;
use super::error::ApiError;
use super::messages::Message;
use super::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use lectern_classroom::{Profile, RequestContext, Role, Session, SignUp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    student_code: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    token: String,
    session: Session,
}

pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::body(e, state.locale))?;

    if let Some(role) = request.role.as_deref().filter(|r| !r.trim().is_empty()) {
        if Role::parse(role) != Some(Role::Student) {
            return Err(ApiError::new(
                StatusCode::FORBIDDEN,
                Message::StudentsOnly,
                state.locale,
            ));
        }
    }

    let profile = state
        .classroom
        .identity
        .sign_up(SignUp {
            email: request.email,
            password: request.password,
            full_name: request.full_name,
            enrollment_code: request.student_code,
        })
        .map_err(|e| ApiError::identity(e, state.locale))?;

    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SignInResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::body(e, state.locale))?;

    let session = state
        .classroom
        .identity
        .sign_in(&request.email, &request.password)
        .map_err(|e| ApiError::identity(e, state.locale))?;

    Ok(Json(SignInResponse {
        token: session.token.clone(),
        session,
    }))
}

pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or_else(|| {
        ApiError::new(StatusCode::UNAUTHORIZED, Message::SignInRequired, state.locale)
    })?;

    state
        .classroom
        .identity
        .sign_out(token)
        .map_err(|e| ApiError::identity(e, state.locale))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn session(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Session>, ApiError> {
    let session = ctx
        .require_session()
        .map_err(|e| ApiError::identity(e, state.locale))?;
    Ok(Json(session.clone()))
}
