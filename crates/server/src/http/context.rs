//! Per-request caller resolution.

use super::error::ApiError;
use super::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use lectern_classroom::RequestContext;

/// Bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Unknown or revoked tokens yield an anonymous context; handlers that need
/// a session reject it themselves.
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(RequestContext::anonymous());
        };

        match state.classroom.identity.session(token) {
            Ok(Some(session)) => Ok(RequestContext::authenticated(session)),
            Ok(None) => {
                tracing::debug!("Ignoring unknown bearer token");
                Ok(RequestContext::anonymous())
            }
            Err(e) => Err(ApiError::identity(e, state.locale)),
        }
    }
}
