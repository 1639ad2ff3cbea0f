//! API error responses.
//!
//! Every failure renders as `{"error": <slug>, "message": <text>}` with a
//! status code matching the error kind.

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use wicket_identity::IdentityError;
use wicket_promotions::PromotionError;
use wicket_sessions::SessionError;
use wicket_types::AccessError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_uuid() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "bad-uuid",
            "given UUID could not be parsed",
        )
    }

    pub fn bad_badge() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "bad-badge",
            "given badge number could not be parsed",
        )
    }

    pub fn unauthenticated() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthenticated-user",
            "user is not logged in",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.code,
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Unauthenticated => Self::unauthenticated(),
            AccessError::Forbidden { .. } => Self::new(
                StatusCode::FORBIDDEN,
                "unauthorized-user",
                e.to_string(),
            ),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "session-not-found", e.to_string())
            }
            SessionError::TtlTooLong { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "session-too-long", e.to_string())
            }
        }
    }
}

impl From<PromotionError> for ApiError {
    fn from(e: PromotionError) -> Self {
        match e {
            PromotionError::NotFound => {
                Self::new(StatusCode::NOT_FOUND, "promotion-not-found", e.to_string())
            }
            PromotionError::TtlTooLong { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "promotion-too-long", e.to_string())
            }
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        use IdentityError::*;

        let (status, code) = match &e {
            NameEmpty => (StatusCode::BAD_REQUEST, "name-empty"),
            EmailInvalid => (StatusCode::BAD_REQUEST, "email-invalid"),
            PasswordTooShort => (StatusCode::BAD_REQUEST, "password-too-short"),
            PasswordTooLong => (StatusCode::BAD_REQUEST, "password-too-long"),
            PasswordEdgeWhitespace => (StatusCode::BAD_REQUEST, "password-edge-whitespace"),
            PasswordIllegalChars => (StatusCode::BAD_REQUEST, "password-illegal-chars"),
            HashFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "hash-failure"),
            IncorrectPassword => (StatusCode::UNAUTHORIZED, "incorrect-password"),
            NotFound => (StatusCode::NOT_FOUND, "user-not-found"),
            BadgeTaken => (StatusCode::CONFLICT, "badge-in-use"),
            NotEnoughChiefs => (StatusCode::CONFLICT, "not-enough-chiefs"),
            AlreadyTopRole => (StatusCode::CONFLICT, "already-top-role"),
            PassNotYours => (StatusCode::FORBIDDEN, "pass-not-yours"),
            DataFile(_) => (StatusCode::INTERNAL_SERVER_ERROR, "data-file"),
            Access(access) => return (*access).into(),
            Session(session) => return (*session).into(),
            Promotion(promotion) => return (*promotion).into(),
        };
        Self::new(status, code, e.to_string())
    }
}

/// Fallback for unknown API paths.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "resource-not-found",
        format!("resource {:?} not found", uri.path()),
    )
}
