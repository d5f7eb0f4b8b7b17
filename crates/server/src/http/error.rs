//! HTTP error responses.
//!
//! Domain errors are turned into a status code and a localized
//! `{ "error": ... }` body here. Internal detail is logged, never returned.

use super::messages::Message;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lectern_classroom::{CatalogError, ExchangeError, IdentityError, MissingField, ResolveError};
use lectern_core::Locale;

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: Message, locale: Locale) -> Self {
        Self {
            status,
            message: message.text(locale),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn resolve(err: ResolveError, locale: Locale) -> Self {
        match err {
            ResolveError::NotFound(id) => {
                tracing::debug!("Material {} not found", id);
                Self::new(StatusCode::NOT_FOUND, Message::MaterialUnavailable, locale)
            }
            ResolveError::ResolutionFailed(detail) => {
                tracing::error!("Material resolution failed: {}", detail);
                Self::new(StatusCode::BAD_GATEWAY, Message::ResolutionFailed, locale)
            }
        }
    }

    pub fn exchange(err: ExchangeError, locale: Locale) -> Self {
        match err {
            ExchangeError::InvalidRequest(missing) => {
                tracing::debug!("Rejected exchange request: {}", missing);
                let message = match missing {
                    MissingField::Question => Message::QuestionRequired,
                    MissingField::FileReference => Message::ReferenceRequired,
                    MissingField::AnswerText => Message::InvalidRequest,
                };
                Self::new(StatusCode::BAD_REQUEST, message, locale)
            }
            ExchangeError::ServiceMisconfigured(detail) => {
                tracing::error!("Answer service misconfigured: {}", detail);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Message::ServiceMisconfigured,
                    locale,
                )
            }
            ExchangeError::GenerationFailed { detail } => {
                tracing::error!("Answer generation failed: {}", detail);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Message::GenerationFailed,
                    locale,
                )
            }
            ExchangeError::ReferenceUnreachable(detail) => {
                tracing::warn!("File reference unreachable: {}", detail);
                Self::new(StatusCode::BAD_REQUEST, Message::ReferenceUnreachable, locale)
            }
        }
    }

    pub fn identity(err: IdentityError, locale: Locale) -> Self {
        let (status, message) = match &err {
            IdentityError::InvalidInput(_) => (StatusCode::BAD_REQUEST, Message::InvalidInput),
            IdentityError::InvalidEnrollmentCode => {
                (StatusCode::BAD_REQUEST, Message::InvalidEnrollmentCode)
            }
            IdentityError::EmailTaken => (StatusCode::CONFLICT, Message::EmailTaken),
            IdentityError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, Message::InvalidCredentials)
            }
            IdentityError::Unauthenticated => (StatusCode::UNAUTHORIZED, Message::SignInRequired),
            IdentityError::Forbidden => (StatusCode::FORBIDDEN, Message::Forbidden),
            IdentityError::Store(e) => {
                tracing::error!("Identity store failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, Message::Internal)
            }
        };
        tracing::debug!("Identity error: {}", err);
        Self::new(status, message, locale)
    }

    pub fn catalog(err: CatalogError, locale: Locale) -> Self {
        match err {
            CatalogError::Identity(e) => Self::identity(e, locale),
            CatalogError::NotOwner(id) => {
                tracing::warn!("Refused deletion of material {} by non-owner", id);
                Self::new(StatusCode::FORBIDDEN, Message::NotOwner, locale)
            }
            CatalogError::InvalidUpload(reason) => {
                tracing::debug!("Rejected upload: {}", reason);
                Self::new(StatusCode::BAD_REQUEST, Message::InvalidUpload, locale)
            }
            CatalogError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, Message::MaterialUnavailable, locale)
            }
            CatalogError::Storage(detail) => {
                tracing::error!("Storage failure: {}", detail);
                Self::new(StatusCode::BAD_GATEWAY, Message::Internal, locale)
            }
            CatalogError::Store(detail) => {
                tracing::error!("Metadata store failure: {}", detail);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, Message::Internal, locale)
            }
        }
    }

    /// Malformed or missing JSON body.
    pub fn body(rejection: JsonRejection, locale: Locale) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, Message::InvalidRequest, locale)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
