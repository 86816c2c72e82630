use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt::Display;

use crate::normalize::NormalizeError;
use crate::velero::CommandError;
use crate::views;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.status {
            StatusCode::FORBIDDEN => views::forbidden_page(),
            StatusCode::NOT_FOUND => views::not_found_page(),
            status => (status, self.message).into_response(),
        }
    }
}

impl From<CommandError> for AppError {
    fn from(err: CommandError) -> Self {
        let (status, message) = internal_error(err);
        Self::new(status, message)
    }
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        let (status, message) = internal_error(err);
        Self::new(status, message)
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub fn internal_error(err: impl Display) -> (StatusCode, String) {
    tracing::error!(error = %err, "internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}
