//! Failures a handler can return instead of a response

use crate::error::ServerError;
use crate::response::range::RangeError;
use crate::response::ErrorResponse;
use axum::http::header::{ACCEPT, CONTENT_RANGE, WWW_AUTHENTICATE};
use axum::http::{HeaderValue, Method, StatusCode};
use prelude_core::PreludeError;
use prelude_storage::StorageError;
use std::collections::BTreeMap;
use thiserror::Error;

pub const AUTH_CHALLENGE: &str = r#"Basic realm="Prelude API", Bearer realm="Prelude API""#;
pub const ACCEPTED_BODY_TYPES: &str = "application/json, application/x-www-form-urlencoded";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Authorisation is required to access this endpoint.")]
    Unauthorized,

    #[error("You don't have permission to access this endpoint.")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("The HTTP method `{method}` is not allowed for endpoint `{path}`.")]
    MethodNotAllowed { method: Method, path: String },

    #[error("{message}")]
    UnsatisfiableRange { message: String, size: u64 },

    #[error("The request body has unsupported media type.")]
    UnsupportedMediaType,

    #[error("One or more fields in the request body were invalid.")]
    UnprocessableField {
        status: StatusCode,
        fields: BTreeMap<String, String>,
    },

    #[error("{0}")]
    UnprocessableEntity(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UpstreamProxy(String),

    #[error("An internal server error occurred.")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(err.into())
    }

    /// 422 for a single invalid field
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        Self::field_with_status(StatusCode::UNPROCESSABLE_ENTITY, name, message)
    }

    /// A field error reported with a status other than 422, e.g. a
    /// reference to a missing record (404) or an ungrantable scope (403)
    pub fn field_with_status(status: StatusCode, name: &str, message: impl Into<String>) -> Self {
        ApiError::UnprocessableField {
            status,
            fields: BTreeMap::from([(name.to_string(), message.into())]),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn endpoint_not_found(path: &str) -> Self {
        ApiError::NotFound(format!("The requested endpoint `{}` does not exist.", path))
    }

    pub fn method_not_allowed(method: &Method, path: &str) -> Self {
        ApiError::MethodNotAllowed {
            method: method.clone(),
            path: path.to_string(),
        }
    }

    pub fn from_range(err: RangeError, size: u64) -> Self {
        if err.is_unsatisfiable() {
            ApiError::UnsatisfiableRange {
                message: err.to_string(),
                size,
            }
        } else {
            ApiError::BadRequest(err.to_string())
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::UnsatisfiableRange { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::UnprocessableField { status, .. } => *status,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UpstreamProxy(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        let response = ErrorResponse::new(err.status(), err.to_string());
        match err {
            ApiError::Unauthorized => response
                .with_header(WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_CHALLENGE)),
            ApiError::UnsupportedMediaType => {
                response.with_header(ACCEPT, HeaderValue::from_static(ACCEPTED_BODY_TYPES))
            }
            ApiError::UnsatisfiableRange { size, .. } => response.with_header(
                CONTENT_RANGE,
                HeaderValue::from_str(&format!("bytes */{}", size))
                    .unwrap_or(HeaderValue::from_static("bytes */*")),
            ),
            ApiError::UnprocessableField { fields, .. } => response.with_fields(fields),
            ApiError::Internal(cause) => response.with_cause(cause),
            _ => response,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::internal(err)
    }
}

impl From<PreludeError> for ApiError {
    fn from(err: PreludeError) -> Self {
        ApiError::internal(err)
    }
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        ApiError::internal(err)
    }
}
