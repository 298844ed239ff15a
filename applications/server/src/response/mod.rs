//! Typed responses and their serialization onto the wire.
//!
//! Every handler produces an [`ApiResponse`]. The pipeline renders it once
//! per request through [`ApiRequest::end`](crate::api::ApiRequest::end).

pub mod error;
pub mod file;
pub mod page;
pub mod proxy;
pub mod range;

pub use error::ErrorResponse;
pub use file::{ByteSource, FileResponse, LocalFile};
pub use page::PageResponse;
pub use proxy::{ContentTypeRule, ProxyResponse};

use crate::api::request::{Limits, RequestHead};
use crate::api::ApiError;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Response, StatusCode};
use bytes::Bytes;
use prelude_storage::Page;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug)]
pub enum ApiResponse {
    Json { status: StatusCode, body: Value },
    Error(ErrorResponse),
    Paged(PageResponse),
    File(FileResponse),
    Buffer { content_type: String, data: Bytes },
    Proxy(ProxyResponse),
    Empty,
}

impl ApiResponse {
    /// `200 OK` with a serialized body
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        Self::json_with_status(StatusCode::OK, value)
    }

    /// `201 Created` with a serialized body
    pub fn created<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        Self::json_with_status(StatusCode::CREATED, value)
    }

    pub fn json_with_status<T: Serialize + ?Sized>(
        status: StatusCode,
        value: &T,
    ) -> Result<Self, ApiError> {
        let body = serde_json::to_value(value).map_err(ApiError::internal)?;
        Ok(ApiResponse::Json { status, body })
    }

    pub fn paged<T: Serialize>(limits: Limits, page: Page<T>) -> Result<Self, ApiError> {
        Ok(ApiResponse::Paged(PageResponse::new(limits, page)?))
    }

    pub fn buffer(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        ApiResponse::Buffer {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn file(source: impl ByteSource + 'static) -> Self {
        ApiResponse::File(FileResponse::new(source))
    }

    pub(crate) async fn render(self, head: &RequestHead) -> Response<Body> {
        let rendered = match self {
            ApiResponse::Json { status, body } => Ok(json_response(status, &body)),
            ApiResponse::Error(error) => Ok(error.render(head)),
            ApiResponse::Paged(page) => Ok(json_response(StatusCode::OK, &page.body(&head.uri))),
            ApiResponse::File(file) => file.render(head).await,
            ApiResponse::Buffer { content_type, data } => {
                let mut response = Response::new(Body::from(data));
                if let Ok(value) = HeaderValue::from_str(&content_type) {
                    response.headers_mut().insert(CONTENT_TYPE, value);
                }
                Ok(response)
            }
            ApiResponse::Proxy(proxy) => proxy.render().await,
            ApiResponse::Empty => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::NO_CONTENT;
                Ok(response)
            }
        };

        rendered.unwrap_or_else(|err| ErrorResponse::from(err).render(head))
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response<Body> {
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        ApiResponse::Error(err.into())
    }
}

impl From<ErrorResponse> for ApiResponse {
    fn from(err: ErrorResponse) -> Self {
        ApiResponse::Error(err)
    }
}
