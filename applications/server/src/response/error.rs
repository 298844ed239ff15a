//! Error responses: a JSON message, optional field messages and a cause
//! that is logged but never sent.

use crate::api::request::RequestHead;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub message: String,
    pub fields: Option<BTreeMap<String, String>>,
    pub headers: HeaderMap,
    pub cause: Option<anyhow::Error>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            fields: None,
            headers: HeaderMap::new(),
            cause: None,
        }
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_cause(mut self, cause: anyhow::Error) -> Self {
        self.cause = Some(cause);
        self
    }

    pub(crate) fn render(self, head: &RequestHead) -> Response<Body> {
        if let Some(cause) = &self.cause {
            tracing::error!(
                method = %head.method,
                path = %head.uri,
                remote = ?head.remote,
                status = self.status.as_u16(),
                "Request failed: {:#}",
                cause
            );
        }

        let mut error = json!({ "message": self.message });
        if let Some(fields) = self.fields {
            error["fields"] = json!(fields);
        }
        let body = json!({ "error": error }).to_string();

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
