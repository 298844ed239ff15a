//! The request pipeline.
//!
//! Every HTTP request enters through [`Api::handle`]: preflight requests are
//! answered straight away, then credentials are resolved, the body decoded
//! and the first matching controller asked to respond.

pub mod body;
pub mod error;
pub mod request;
pub mod root;
pub mod router;

pub use error::ApiError;
pub use request::ApiRequest;
pub use router::{Controller, HandlerResult, Resource, ResourceController, RoutePattern};

use crate::controllers;
use crate::response::ApiResponse;
use crate::services::AuthService;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::{Method, Response, StatusCode};
use axum::Router;
use request::RequestHead;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

pub struct Api {
    controllers: Vec<Box<dyn Controller>>,
    auth: Arc<AuthService>,
    max_body_size: usize,
}

impl Api {
    pub fn new(state: &AppState) -> Self {
        let mut routes: Vec<Box<dyn Controller>> = vec![Box::new(root::RootController)];
        routes.extend(controllers::all(state));

        Self {
            controllers: routes,
            auth: state.auth_service.clone(),
            max_body_size: state.config.api.max_body_size,
        }
    }

    pub async fn handle(&self, request: Request) -> Response<Body> {
        let (parts, body) = request.into_parts();
        let head = RequestHead {
            remote: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
        };

        if head.method == Method::OPTIONS {
            let req = ApiRequest::new(head, body::RequestBody::default(), None);
            return finish(req, ApiResponse::Empty).await;
        }

        let authorization = head
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let auth = match self.auth.resolve(authorization).await {
            Ok(auth) => auth,
            Err(err) => {
                let req = ApiRequest::new(head, body::RequestBody::default(), None);
                return finish(req, ApiError::internal(err)).await;
            }
        };

        let decoded = body::decode(&head.method, &head.headers, body, self.max_body_size).await;
        let (req, outcome) = match decoded {
            Ok(decoded) => {
                let req = ApiRequest::new(head, decoded, auth);
                let outcome = self.dispatch(&req).await;
                (req, outcome)
            }
            Err(err) => (ApiRequest::new(head, body::RequestBody::default(), auth), Err(err)),
        };

        match outcome {
            Ok(response) => finish(req, response).await,
            Err(err) => finish(req, err).await,
        }
    }

    async fn dispatch(&self, req: &ApiRequest) -> HandlerResult {
        let segments = req.segments();
        for controller in &self.controllers {
            if controller.matches(req, &segments) {
                return controller.handle(req, &segments).await;
            }
        }
        Err(ApiError::endpoint_not_found(req.path()))
    }
}

async fn finish(req: ApiRequest, response: impl Into<ApiResponse>) -> Response<Body> {
    req.end(response).await;
    req.take_response().unwrap_or_else(|| {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

/// Build the axum application around the pipeline
pub fn router(state: AppState) -> Router {
    let api = Arc::new(Api::new(&state));

    Router::new()
        .fallback(move |request: Request| {
            let api = api.clone();
            async move { api.handle(request).await }
        })
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
}
