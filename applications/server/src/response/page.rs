//! Paged list responses with navigation links

use crate::api::request::Limits;
use crate::api::ApiError;
use axum::http::Uri;
use prelude_storage::Page;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

/// One page of serialized resources, plus the window that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    pub page: u64,
    pub limit: u32,
    pub total: u64,
    pub resources: Vec<Value>,
}

#[derive(Serialize)]
struct PageBody<'a> {
    page: u64,
    limit: u32,
    total: u64,
    href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<String>,
    resources: &'a [Value],
}

impl PageResponse {
    pub fn new<T: Serialize>(limits: Limits, page: Page<T>) -> Result<Self, ApiError> {
        Ok(Self {
            page: limits.page,
            limit: limits.limit,
            total: page.total,
            resources: page
                .resources
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<_, _>>()
                .map_err(ApiError::internal)?,
        })
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// A zero limit never narrows the result set, so any rows mean a next page.
    pub fn has_next(&self) -> bool {
        if self.limit == 0 {
            return self.total > 0;
        }
        self.page < self.total.div_ceil(u64::from(self.limit))
    }

    pub(crate) fn body(&self, uri: &Uri) -> Value {
        let href = match uri.query() {
            Some(query) => format!("{}?{}", uri.path(), query),
            None => uri.path().to_string(),
        };

        let body = PageBody {
            page: self.page,
            limit: self.limit,
            total: self.total,
            href,
            previous: self.has_previous().then(|| with_page(uri, self.page - 1)),
            next: self.has_next().then(|| with_page(uri, self.page + 1)),
            resources: &self.resources,
        };
        serde_json::to_value(body).unwrap_or(Value::Null)
    }
}

/// The request path and query with only the `page` parameter replaced
fn with_page(uri: &Uri, page: u64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut replaced = false;

    for (key, value) in form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
        if key == "page" {
            if !replaced {
                query.append_pair("page", &page.to_string());
                replaced = true;
            }
        } else {
            query.append_pair(&key, &value);
        }
    }
    if !replaced {
        query.append_pair("page", &page.to_string());
    }

    format!("{}?{}", uri.path(), query.finish())
}
