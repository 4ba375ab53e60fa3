use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AdminError, AvatarError, CreditError, GenerationError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ExternalApiError { service: String, message: String },

    ValidationError(String),

    InsufficientCredits,

    Unauthorized(String),

    Forbidden(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ExternalApiError { service, message } => {
                write!(f, "{} error: {}", service, message)
            }
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::InsufficientCredits => write!(f, "Insufficient credits"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ExternalApiError { service, message } => {
                tracing::warn!("{} API error: {}", service, message);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("{} service is unavailable", service),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::InsufficientCredits => (
                StatusCode::PAYMENT_REQUIRED,
                "Insufficient credits".to_string(),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<CreditError> for ApiError {
    fn from(err: CreditError) -> Self {
        match err {
            CreditError::InsufficientCredits => ApiError::InsufficientCredits,
            CreditError::AccountNotFound => ApiError::NotFound("Account not found".to_string()),
            CreditError::Database(message) => ApiError::DatabaseError(message),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Validation(message) => ApiError::ValidationError(message),
            GenerationError::InsufficientCredits => ApiError::InsufficientCredits,
            GenerationError::AccountNotFound => {
                ApiError::NotFound("Account not found".to_string())
            }
            GenerationError::AvatarNotFound => ApiError::NotFound("Avatar not found".to_string()),
            GenerationError::TextGeneration(message) => ApiError::ExternalApiError {
                service: "Text generation".to_string(),
                message,
            },
            GenerationError::ImageGeneration(message) => ApiError::ExternalApiError {
                service: "Image generation".to_string(),
                message,
            },
            GenerationError::Parse(message) => {
                tracing::warn!("Avatar parse failure: {}", message);
                ApiError::InternalError("Failed to generate avatar".to_string())
            }
            GenerationError::ImageUpload(message) => {
                tracing::warn!("Avatar image upload failure: {}", message);
                ApiError::InternalError("Failed to generate avatar".to_string())
            }
            GenerationError::Database(message) => ApiError::DatabaseError(message),
        }
    }
}

impl From<AvatarError> for ApiError {
    fn from(err: AvatarError) -> Self {
        match err {
            AvatarError::NotFound => ApiError::NotFound("Avatar not found".to_string()),
            AvatarError::Database(message) => ApiError::DatabaseError(message),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Unauthorized => {
                ApiError::Forbidden("Administrator rights required".to_string())
            }
            AdminError::NotFound => ApiError::NotFound("Account not found".to_string()),
            AdminError::Validation(message) => ApiError::ValidationError(message),
            AdminError::Database(message) => ApiError::DatabaseError(message),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    pub fn identity_error(msg: impl Into<String>) -> Self {
        ApiError::ExternalApiError {
            service: "Identity provider".to_string(),
            message: msg.into(),
        }
    }
}
