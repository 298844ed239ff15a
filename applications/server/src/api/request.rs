//! The per-request object handed to every controller

use super::body::{FormValue, RequestBody};
use super::ApiError;
use crate::response::ApiResponse;
use crate::services::auth::AuthContext;
use axum::body::Body;
use axum::http::header::{
    ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, Response, Uri};
use prelude_core::Scope;
use prelude_storage::Pagination;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use url::form_urlencoded;

pub const ALLOWED_METHODS: &str = "GET, HEAD, POST, PUT, PATCH, DELETE, PURGE, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

const DEFAULT_LIMIT: u32 = 100;

/// Request line, headers and peer address
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub remote: Option<SocketAddr>,
}

/// Pagination window requested through `page` and `limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub page: u64,
    pub limit: u32,
    pub offset: u64,
}

impl Limits {
    pub fn pagination(self) -> Pagination {
        Pagination::new(self.limit, self.offset)
    }
}

pub struct ApiRequest {
    head: RequestHead,
    body: RequestBody,
    auth: Option<AuthContext>,
    sent: AtomicBool,
    response: Mutex<Option<Response<Body>>>,
}

impl ApiRequest {
    pub fn new(head: RequestHead, body: RequestBody, auth: Option<AuthContext>) -> Self {
        Self {
            head,
            body,
            auth,
            sent: AtomicBool::new(false),
            response: Mutex::new(None),
        }
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn path(&self) -> &str {
        self.head.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    pub fn auth(&self) -> Option<&AuthContext> {
        self.auth.as_ref()
    }

    /// Path split into segments, without the leading or trailing slash
    pub fn segments(&self) -> Vec<String> {
        let path = self.path();
        let path = path.strip_suffix('/').unwrap_or(path);
        path.split('/').skip(1).map(str::to_string).collect()
    }

    /// First value of a query parameter
    pub fn query(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Every value of a repeated query parameter
    pub fn query_all(&self, name: &str) -> Vec<String> {
        self.query_pairs()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value)
            .collect()
    }

    /// Whether a query parameter is present, with or without a value
    pub fn has_query(&self, name: &str) -> bool {
        self.query_pairs().any(|(key, _)| key == name)
    }

    fn query_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        form_urlencoded::parse(self.head.uri.query().unwrap_or_default().as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
    }

    pub fn limits(&self) -> Limits {
        let page = self
            .query("page")
            .and_then(|page| page.parse::<u64>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1);
        let limit = self
            .query("limit")
            .and_then(|limit| limit.parse::<u32>().ok())
            .unwrap_or(DEFAULT_LIMIT);

        Limits {
            page,
            limit,
            offset: (page - 1).saturating_mul(u64::from(limit)),
        }
    }

    /// The body as a key/value object
    pub fn object(&self) -> Result<Cow<'_, Map<String, Value>>, ApiError> {
        match &self.body {
            RequestBody::Json(Value::Object(map)) | RequestBody::Form(map) => {
                Ok(Cow::Borrowed(map))
            }
            RequestBody::Json(Value::Array(_)) => Err(ApiError::UnprocessableEntity(
                "The request body is an array; expected an object.".to_string(),
            )),
            RequestBody::Json(_) => Err(ApiError::UnprocessableEntity(
                "The request body is not an object.".to_string(),
            )),
            RequestBody::Multipart(fields) => {
                let mut map = Map::new();
                for field in fields {
                    if let FormValue::Text(text) = &field.value {
                        map.insert(field.name.clone(), Value::String(text.clone()));
                    }
                }
                Ok(Cow::Owned(map))
            }
            RequestBody::Raw(_) => Err(ApiError::UnsupportedMediaType),
        }
    }

    /// The authorization context, if it grants `scope`
    pub fn require(&self, scope: Scope) -> Result<&AuthContext, ApiError> {
        let auth = self.auth.as_ref().ok_or(ApiError::Unauthorized)?;
        auth.require(scope)?;
        Ok(auth)
    }

    /// The authorization context, if it grants any of `scopes`
    pub fn require_any(&self, scopes: &[Scope]) -> Result<&AuthContext, ApiError> {
        let auth = self.auth.as_ref().ok_or(ApiError::Unauthorized)?;
        if scopes.iter().any(|scope| auth.has(*scope)) {
            Ok(auth)
        } else {
            Err(ApiError::Forbidden)
        }
    }

    pub fn is_sent(&self) -> bool {
        self.sent.load(Ordering::Acquire)
    }

    /// Render `response` as this request's reply.
    ///
    /// Only the first call has any effect.
    pub async fn end(&self, response: impl Into<ApiResponse>) {
        if self.sent.swap(true, Ordering::AcqRel) {
            tracing::debug!(path = %self.head.uri, "Response already sent, ignoring");
            return;
        }

        let mut rendered = response.into().render(&self.head).await;
        self.apply_standard_headers(rendered.headers_mut());
        *self
            .response
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(rendered);
    }

    /// Take the rendered reply, if one was sent
    pub fn take_response(&self) -> Option<Response<Body>> {
        self.response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn apply_standard_headers(&self, headers: &mut HeaderMap) {
        let origin = self
            .head
            .headers
            .get(ORIGIN)
            .cloned()
            .unwrap_or(HeaderValue::from_static("*"));

        headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
    }
}
