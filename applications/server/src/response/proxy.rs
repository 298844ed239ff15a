//! Responses relayed from an upstream HTTP fetch

use crate::api::ApiError;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use regex::Regex;

/// Headers that describe a single connection and are never relayed
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Content type an upstream response must carry
#[derive(Debug, Clone)]
pub enum ContentTypeRule {
    Exact(String),
    Pattern(Regex),
}

impl ContentTypeRule {
    pub fn matches(&self, content_type: &str) -> bool {
        match self {
            ContentTypeRule::Exact(expected) => expected == content_type,
            ContentTypeRule::Pattern(pattern) => pattern.is_match(content_type),
        }
    }
}

#[derive(Debug)]
pub struct ProxyResponse {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
    required_status: Option<StatusCode>,
    required_content_type: Option<ContentTypeRule>,
    mirror_headers: bool,
}

impl ProxyResponse {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            headers: HeaderMap::new(),
            required_status: None,
            required_content_type: None,
            mirror_headers: true,
        }
    }

    /// Forward a request header to the upstream server
    pub fn forward_header(mut self, name: HeaderName, value: Option<&HeaderValue>) -> Self {
        if let Some(value) = value {
            self.headers.insert(name, value.clone());
        }
        self
    }

    pub fn require_status(mut self, status: StatusCode) -> Self {
        self.required_status = Some(status);
        self
    }

    pub fn require_content_type(mut self, rule: ContentTypeRule) -> Self {
        self.required_content_type = Some(rule);
        self
    }

    /// Relay upstream headers; `Content-Type` is always relayed
    pub fn mirror_headers(mut self, mirror: bool) -> Self {
        self.mirror_headers = mirror;
        self
    }

    pub(crate) async fn render(self) -> Result<Response<Body>, ApiError> {
        let mut outbound = reqwest::header::HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(name.as_str().as_bytes()),
                reqwest::header::HeaderValue::from_bytes(value.as_bytes()),
            ) {
                outbound.insert(name, value);
            }
        }

        let upstream = self
            .client
            .get(&self.url)
            .headers(outbound)
            .send()
            .await
            .map_err(|err| {
                ApiError::UpstreamProxy(format!("Failed to proxy URL \"{}\": {}", self.url, err))
            })?;

        let status = StatusCode::from_u16(upstream.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = upstream
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let status_ok = match self.required_status {
            Some(required) => required == status,
            None => true,
        };
        let type_ok = match &self.required_content_type {
            Some(rule) => content_type.as_deref().is_some_and(|value| rule.matches(value)),
            None => true,
        };
        if !status_ok || !type_ok {
            return Err(ApiError::UpstreamProxy(format!(
                "Failed to proxy URL \"{}\": got {} {}",
                self.url,
                status.as_u16(),
                content_type.as_deref().unwrap_or("(no content-type)")
            )));
        }

        let mut headers = HeaderMap::new();
        if self.mirror_headers {
            for (name, value) in upstream.headers() {
                if HOP_BY_HOP.contains(&name.as_str()) {
                    continue;
                }
                if let (Ok(name), Ok(value)) = (
                    HeaderName::from_bytes(name.as_str().as_bytes()),
                    HeaderValue::from_bytes(value.as_bytes()),
                ) {
                    headers.append(name, value);
                }
            }
        } else if let Some(value) = content_type.and_then(|value| HeaderValue::from_str(&value).ok()) {
            headers.insert(CONTENT_TYPE, value);
        }

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
