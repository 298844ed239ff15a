use super::router::not_allowed;
use super::{ApiRequest, Controller, HandlerResult};
use crate::response::ApiResponse;
use async_trait::async_trait;
use axum::http::Method;
use serde_json::json;

/// `GET /`: server version
pub struct RootController;

#[async_trait]
impl Controller for RootController {
    fn matches(&self, _req: &ApiRequest, segments: &[String]) -> bool {
        segments.is_empty()
    }

    async fn handle(&self, req: &ApiRequest, _segments: &[String]) -> HandlerResult {
        match *req.method() {
            Method::GET | Method::HEAD => {
                ApiResponse::json(&json!({ "version": env!("CARGO_PKG_VERSION") }))
            }
            _ => Err(not_allowed(req)),
        }
    }
}
