use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A field-level validation failure; the request is not applied and the
    /// offending field is reported back to the caller.
    #[error("Validation failed on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unknown email")]
    UnknownIdentity,

    #[error("Invalid password")]
    InvalidCredential,

    #[error("User not activated")]
    InactiveAccount,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True when a database error is a rejected write caused by a UNIQUE
    /// constraint, so the caller can surface it as a field error instead of
    /// a 500.
    pub fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
        err.to_string().contains("UNIQUE constraint failed")
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first offending field; the request is rejected anyway.
        for (field, field_errors) in errors.field_errors() {
            if let Some(first) = field_errors.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value for {field}"));
                return AppError::validation(field.to_string(), message);
            }
        }
        AppError::BadRequest("Invalid input".to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, field) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                message.clone(),
                Some(field.clone()),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::UnknownIdentity => {
                (StatusCode::UNAUTHORIZED, "Unknown email".to_string(), None)
            }
            AppError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "Invalid password".to_string(),
                None,
            ),
            AppError::InactiveAccount => (
                StatusCode::FORBIDDEN,
                "User not activated".to_string(),
                None,
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Jwt(e) => (StatusCode::UNAUTHORIZED, format!("JWT error: {}", e), None),
            AppError::Bcrypt(e) => {
                tracing::error!("Bcrypt error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authentication error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                detail: message,
                field,
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
