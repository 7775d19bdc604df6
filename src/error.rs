//! Error taxonomy
//! Mission: One JSON error shape for every failure the API can return

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::error;
use uuid::Uuid;

static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Include the error chain of 500 responses in the body. Off in production.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failures raised by the auth, badge and notification services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredToken,
    #[error("Refresh token has been revoked")]
    RevokedOrUnknownToken,
    #[error("Email is already registered")]
    EmailTaken,
    #[error("User already has this badge")]
    AlreadyAwarded,
    #[error("A badge with this name already exists")]
    BadgeNameTaken,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// HTTP-facing error
#[derive(Debug)]
pub enum ApiError {
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },
    Authentication(String),
    Authorization(String),
    NotFound(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn bad_request(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: "Validation failed".to_string(),
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// Parse an id taken from a path or body field
    pub fn parse_id(field: &'static str, raw: &str) -> Result<Uuid, Self> {
        Uuid::parse_str(raw.trim()).map_err(|_| Self::bad_request(field, "Must be a valid UUID"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::InvalidCredentials
            | ServiceError::InvalidOrExpiredToken
            | ServiceError::RevokedOrUnknownToken => ApiError::Authentication(message),
            ServiceError::EmailTaken
            | ServiceError::AlreadyAwarded
            | ServiceError::BadgeNameTaken => ApiError::Conflict(message),
            ServiceError::NotFound(_) => ApiError::NotFound(message),
            ServiceError::Validation(errors) => ApiError::Validation { message, errors },
            ServiceError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation {
            message: "Invalid request body".to_string(),
            errors: vec![FieldError::new("body", rejection.body_text())],
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation {
            message: "Invalid query string".to_string(),
            errors: vec![FieldError::new("query", rejection.body_text())],
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation { message, errors } => json!({
                "message": message,
                "errors": errors,
            }),
            ApiError::Authentication(message)
            | ApiError::Authorization(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => json!({ "message": message }),
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                if EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed) {
                    json!({
                        "message": "Internal server error",
                        "detail": format!("{:?}", err),
                    })
                } else {
                    json!({ "message": "Internal server error" })
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
