use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use pantry_core::filter::FilterError;
use pantry_core::schema::{FieldViolation, ValidationError};
use pantry_repository::RepositoryError;

pub const ENTITY_NOT_FOUND: &str = "ENTITY_NOT_FOUND";
pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
pub const INVALID_PARAMETER_VALUE: &str = "INVALID_PARAMETER_VALUE";
pub const INVALID_REQUEST_BODY: &str = "INVALID_REQUEST_BODY";

/// Unified API error type for all route handlers and extractors.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest { code: &'static str, message: String },
    Validation(ValidationError),
    UnsupportedMediaType(String),
    Internal(String),
}

impl ApiError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: INVALID_PARAMETER_VALUE,
            message: message.into(),
        }
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: INVALID_REQUEST_BODY,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    name: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldViolation>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (name, message, code, details) = match self {
            ApiError::NotFound(msg) => ("NotFoundError", msg, Some(ENTITY_NOT_FOUND), None),
            ApiError::BadRequest { code, message } => ("BadRequestError", message, Some(code), None),
            ApiError::Validation(err) => (
                "UnprocessableEntityError",
                err.to_string(),
                Some(VALIDATION_FAILED),
                Some(err.details),
            ),
            ApiError::UnsupportedMediaType(msg) => ("UnsupportedMediaTypeError", msg, None, None),
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    "InternalServerError",
                    "Internal Server Error".to_string(),
                    None,
                    None,
                )
            }
        };

        let body = ErrorEnvelope {
            error: ErrorBody {
                status_code: status.as_u16(),
                name,
                message,
                code,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            not_found @ RepositoryError::EntityNotFound { .. } => {
                ApiError::NotFound(not_found.to_string())
            }
            RepositoryError::Validation(err) => ApiError::Validation(err),
            RepositoryError::InvalidFilter(err) => err.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(e: FilterError) -> Self {
        ApiError::invalid_parameter(e.to_string())
    }
}
