//! HTTP error mapping for API handlers.

use crate::{AppError, ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Handler error: a core error or a transport-level rejection.
#[derive(Debug)]
pub enum HttpError {
    App(AppError),
    /// Shared-secret header missing or wrong.
    Unauthorized,
    /// Update/delete requested but no shared secret is configured.
    MutationsDisabled,
    /// Multipart body without a usable `file` field.
    MalformedForm(String),
    /// Body rejected by the transport before reaching the validator.
    BodyTooLarge { limit: usize },
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

fn plain(status: StatusCode, message: impl Into<String>) -> Response {
    let mut body = message.into();
    body.push('\n');
    (status, body).into_response()
}

fn app_error_response(err: AppError) -> Response {
    if err.is_server_fault() {
        tracing::error!("Storage error: {}", err);
        return plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    }
    match err {
        AppError::Validation(ValidationError::Empty) => plain(StatusCode::BAD_REQUEST, "Empty file"),
        AppError::Validation(ValidationError::TooLarge { limit, .. }) => plain(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("File size > {} bytes", limit),
        ),
        AppError::RateLimited => plain(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many pastes, try again later",
        ),
        AppError::NotFound => plain(StatusCode::NOT_FOUND, "Paste not found"),
        AppError::Conflict(msg) => plain(StatusCode::CONFLICT, msg),
        AppError::Immutable => plain(
            StatusCode::CONFLICT,
            "Content-addressed pastes cannot be updated",
        ),
        _ => plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            Self::App(err) => app_error_response(err),
            Self::Unauthorized => plain(StatusCode::UNAUTHORIZED, "Invalid or missing secret"),
            Self::MutationsDisabled => plain(
                StatusCode::FORBIDDEN,
                "Updates and deletes are disabled on this server",
            ),
            Self::MalformedForm(msg) => plain(StatusCode::BAD_REQUEST, msg),
            Self::BodyTooLarge { limit } => plain(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("File size > {} bytes", limit),
            ),
        }
    }
}
