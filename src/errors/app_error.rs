use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::fmt;

use crate::core::pipeline::{PipelineError, ValidationError};
use crate::core::service::ServiceError;

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Logged in full; the client only sees a generic message and `details`.
    InternalServerError {
        message: String,
        details: Option<Value>,
    },
    BadRequest {
        message: String,
        details: Option<Value>,
    },
    NotFound(String),
    PayloadTooLarge(String),
}

impl AppError {
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::InternalServerError {
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_message, details) = match self {
            AppError::InternalServerError { message, details } => {
                tracing::error!("Internal server error: {}", message);
                ("Internal server error".to_string(), details)
            }
            AppError::BadRequest { message, details } => {
                tracing::warn!("Bad request: {}", message);
                (message, details)
            }
            AppError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (msg, None)
            }
            AppError::PayloadTooLarge(msg) => {
                tracing::warn!("Payload too large: {}", msg);
                (msg, None)
            }
        };

        let mut body = json!({
            "error": error_message,
            "status": status.as_u16()
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError { message, .. } => {
                write!(f, "Internal server error: {message}")
            }
            AppError::BadRequest { message, .. } => write!(f, "Bad request: {message}"),
            AppError::NotFound(msg) => write!(f, "Not found: {msg}"),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Directive(e) => AppError::BadRequest {
                message: e.to_string(),
                details: Some(json!({ "directive": e.directive() })),
            },
            ServiceError::InvalidRequest(msg) => AppError::bad_request(msg),
            ServiceError::TextTooLong { max } => {
                AppError::PayloadTooLarge(format!("Text is too long, limit is {max} characters"))
            }
            ServiceError::NotFound(msg) => AppError::NotFound(msg),
            ServiceError::Pipeline(e) => e.into(),
            ServiceError::Provider(e) => AppError::internal(e.to_string()),
            ServiceError::Cache(e) => AppError::internal(e.to_string()),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match err {
            PipelineError::Validation(ValidationError::UnknownVoices {
                ref missing,
                ref available_sample,
                ..
            }) => AppError::BadRequest {
                details: Some(json!({
                    "missing": missing,
                    "availableVoicesSample": available_sample,
                })),
                message,
            },
            PipelineError::Validation(_) => AppError::bad_request(message),
            PipelineError::Synthesis {
                segment,
                ref voice,
                rate,
                pitch,
                ref source,
                ..
            } => AppError::InternalServerError {
                details: Some(json!({
                    "segment": segment,
                    "usedVoice": voice,
                    "usedRate": rate,
                    "usedPitch": pitch,
                    "voicesSample": source.voices_sample(),
                })),
                message,
            },
            _ => AppError::internal(message),
        }
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
