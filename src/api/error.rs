use crate::api::flash::{Flash, push_flash};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Carries the login URL to send the visitor to.
    #[error("Unauthorized")]
    Unauthorized(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Database error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    #[error("File I/O error: {0}")]
    FileIo(String),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateUsername(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::SEE_OTHER,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Storage(_) | AppError::FileIo(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the message may be shown to the end user as-is.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            AppError::Storage(_) | AppError::FileIo(_) | AppError::Unexpected(_)
        )
    }

    /// Message safe to put in a flash or response body. Internal failures are
    /// logged with a fresh correlation id and only the id is returned.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DuplicateUsername(_) => "A user with that name already exists.".to_string(),
            AppError::InvalidCredentials => "Invalid username or password.".to_string(),
            AppError::Unauthorized(_) => LOGIN_REQUIRED_MESSAGE.to_string(),
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::UnsupportedMediaType(msg)
            | AppError::PayloadTooLarge(msg) => msg.clone(),
            _ => {
                let error_id = self.log_internal();
                format!("Something went wrong. Error code: {}", error_id)
            }
        }
    }

    fn log_internal(&self) -> Uuid {
        let error_id = Uuid::new_v4();
        match self {
            AppError::Storage(e) => tracing::error!(%error_id, "Database error: {:?}", e),
            AppError::FileIo(msg) => tracing::error!(%error_id, "File I/O error: {}", msg),
            AppError::Unexpected(e) => tracing::error!(%error_id, "Unexpected error: {:?}", e),
            other => tracing::warn!(%error_id, "{}", other),
        }
        error_id
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Unauthorized(login_url) = &self {
            let jar = push_flash(CookieJar::new(), Flash::warning(self.user_message()));
            return (jar, Redirect::to(login_url)).into_response();
        }

        let status = self.status();
        let body = if self.is_user_facing() {
            json!({ "error": self.user_message() })
        } else {
            let error_id = self.log_internal();
            json!({
                "error": "Internal Server Error",
                "error_id": error_id.to_string(),
            })
        };

        (status, Json(body)).into_response()
    }
}
