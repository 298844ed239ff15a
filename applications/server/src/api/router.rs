//! Pattern-matched controllers and the resource dispatch rules

use super::{ApiError, ApiRequest};
use crate::response::ApiResponse;
use async_trait::async_trait;
use axum::http::Method;

pub type HandlerResult = Result<ApiResponse, ApiError>;

/// A node in the routing tree
#[async_trait]
pub trait Controller: Send + Sync {
    fn matches(&self, req: &ApiRequest, segments: &[String]) -> bool;

    async fn handle(&self, req: &ApiRequest, segments: &[String]) -> HandlerResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Literal(&'static str),
    Any,
}

/// Leading path segments a controller claims.
///
/// `offset` is the number of segments owned by enclosing controllers, so the
/// collection sits at `offset` and an item id at `offset + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
    offset: usize,
}

impl RoutePattern {
    /// Parse `albums/*/tracks`, where `*` matches any single segment.
    ///
    /// The last segment is the collection.
    pub fn new(pattern: &'static str) -> Self {
        let segments: Vec<Segment> = pattern
            .trim_matches('/')
            .split('/')
            .map(|segment| match segment {
                "*" => Segment::Any,
                literal => Segment::Literal(literal),
            })
            .collect();
        let offset = segments.len().saturating_sub(1);
        Self { segments, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Every literal equals its segment and the path is at least as long
    pub fn matches(&self, path: &[String]) -> bool {
        path.len() >= self.segments.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(segment, actual)| match segment {
                    Segment::Literal(literal) => literal == actual,
                    Segment::Any => true,
                })
    }

    /// Id of the enclosing item, e.g. the album in `albums/*/tracks`
    pub fn parent_id(&self, path: &[String]) -> Option<String> {
        self.offset
            .checked_sub(1)
            .and_then(|index| path.get(index))
            .cloned()
    }

    /// Like [`matches`](Self::matches), with no trailing segments allowed
    pub fn matches_exactly(&self, path: &[String]) -> bool {
        path.len() == self.segments.len() && self.matches(path)
    }
}

/// A collection/item controller.
///
/// Every handler defaults to `405 Method Not Allowed`.
#[async_trait]
pub trait ResourceController: Send + Sync {
    fn pattern(&self) -> &RoutePattern;

    /// Controllers for paths below an item, tried in order
    fn children(&self) -> &[Box<dyn Controller>] {
        &[]
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        Err(not_allowed(req))
    }

    async fn create(&self, req: &ApiRequest) -> HandlerResult {
        Err(not_allowed(req))
    }

    async fn delete_all(&self, req: &ApiRequest) -> HandlerResult {
        Err(not_allowed(req))
    }

    async fn get(&self, req: &ApiRequest, _id: &str) -> HandlerResult {
        Err(not_allowed(req))
    }

    async fn delete(&self, req: &ApiRequest, _id: &str) -> HandlerResult {
        Err(not_allowed(req))
    }

    async fn put(&self, req: &ApiRequest, _id: &str) -> HandlerResult {
        Err(not_allowed(req))
    }

    async fn patch(&self, req: &ApiRequest, _id: &str) -> HandlerResult {
        Err(not_allowed(req))
    }
}

pub fn not_allowed(req: &ApiRequest) -> ApiError {
    ApiError::method_not_allowed(req.method(), req.path())
}

/// Adapts a [`ResourceController`] into a routing [`Controller`]
pub struct Resource<C>(pub C);

#[async_trait]
impl<C: ResourceController> Controller for Resource<C> {
    fn matches(&self, _req: &ApiRequest, segments: &[String]) -> bool {
        self.0.pattern().matches(segments)
    }

    async fn handle(&self, req: &ApiRequest, segments: &[String]) -> HandlerResult {
        let controller = &self.0;
        let depth = controller.pattern().offset();
        let method = req.method();

        if segments.len() == depth + 1 {
            return match *method {
                Method::GET | Method::HEAD => controller.list(req).await,
                Method::POST => controller.create(req).await,
                Method::DELETE => controller.delete_all(req).await,
                _ => Err(not_allowed(req)),
            };
        }

        if segments.len() == depth + 2 {
            let id = segments[depth + 1].as_str();
            return match *method {
                Method::GET | Method::HEAD => controller.get(req, id).await,
                Method::DELETE => controller.delete(req, id).await,
                Method::PUT => controller.put(req, id).await,
                Method::PATCH => controller.patch(req, id).await,
                _ => Err(not_allowed(req)),
            };
        }

        for child in controller.children() {
            if child.matches(req, segments) {
                return child.handle(req, segments).await;
            }
        }

        Err(ApiError::endpoint_not_found(req.path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::body::RequestBody;
    use crate::api::request::RequestHead;
    use axum::http::{HeaderMap, StatusCode};

    fn path(value: &str) -> Vec<String> {
        value
            .trim_matches('/')
            .split('/')
            .map(str::to_string)
            .collect()
    }

    fn request(method: Method, uri: &str) -> ApiRequest {
        let head = RequestHead {
            method,
            uri: uri.parse().unwrap(),
            headers: HeaderMap::new(),
            remote: None,
        };
        ApiRequest::new(head, RequestBody::default(), None)
    }

    #[test]
    fn pattern_matches_by_prefix() {
        let pattern = RoutePattern::new("albums/*/tracks");
        assert_eq!(pattern.offset(), 2);
        assert!(pattern.matches(&path("/albums/abc/tracks")));
        assert!(pattern.matches(&path("/albums/abc/tracks/extra")));
        assert!(!pattern.matches(&path("/albums/abc")));
        assert!(!pattern.matches(&path("/artists/abc/tracks")));
        assert_eq!(pattern.parent_id(&path("/albums/abc/tracks")).as_deref(), Some("abc"));
        assert_eq!(RoutePattern::new("albums").parent_id(&path("/albums")), None);
    }

    #[test]
    fn literals_are_case_sensitive() {
        let pattern = RoutePattern::new("tracks");
        assert!(pattern.matches(&path("/tracks/1")));
        assert!(!pattern.matches(&path("/Tracks/1")));
    }

    #[test]
    fn exact_match_rejects_trailing_segments() {
        let pattern = RoutePattern::new("tracks/*/image");
        assert!(pattern.matches_exactly(&path("/tracks/1/image")));
        assert!(!pattern.matches_exactly(&path("/tracks/1/image/x")));
    }

    struct Echo(RoutePattern);

    #[async_trait]
    impl ResourceController for Echo {
        fn pattern(&self) -> &RoutePattern {
            &self.0
        }

        async fn list(&self, _req: &ApiRequest) -> HandlerResult {
            ApiResponse::json("list")
        }

        async fn get(&self, _req: &ApiRequest, id: &str) -> HandlerResult {
            ApiResponse::json(id)
        }
    }

    async fn dispatch(method: Method, uri: &str) -> HandlerResult {
        let controller = Resource(Echo(RoutePattern::new("things")));
        let req = request(method, uri);
        let segments = req.segments();
        assert!(controller.matches(&req, &segments));
        controller.handle(&req, &segments).await
    }

    fn json_body(result: HandlerResult) -> serde_json::Value {
        match result.unwrap() {
            ApiResponse::Json { body, .. } => body,
            other => panic!("unexpected response {:?}", other),
        }
    }

    #[tokio::test]
    async fn dispatches_collection_and_item() {
        assert_eq!(json_body(dispatch(Method::GET, "/things").await), "list");
        assert_eq!(json_body(dispatch(Method::HEAD, "/things/").await), "list");
        assert_eq!(json_body(dispatch(Method::GET, "/things/42").await), "42");
    }

    #[tokio::test]
    async fn unimplemented_handlers_are_not_allowed() {
        let err = dispatch(Method::POST, "/things").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);

        let err = dispatch(Method::PATCH, "/things/42").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "The HTTP method `PATCH` is not allowed for endpoint `/things/42`."
        );
    }

    #[tokio::test]
    async fn deeper_paths_without_children_are_not_found() {
        let err = dispatch(Method::GET, "/things/42/parts").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
