//! `/albums`, an album's tracks and its cover art

use super::tracks::{cover_response, read_cover, Cover};
use crate::api::router::not_allowed;
use crate::api::{
    ApiError, ApiRequest, Controller, HandlerResult, Resource, ResourceController, RoutePattern,
};
use crate::response::ApiResponse;
use crate::state::AppState;
use async_trait::async_trait;
use axum::http::Method;
use prelude_core::{Album, AlbumId, Scope};
use prelude_storage::{albums, tracks, Pagination};

const ALBUM_NOT_FOUND: &str = "The requested album could not be found.";

/// Tracks checked for embedded art when serving an album cover
const COVER_CANDIDATES: u32 = 5;

pub struct AlbumsController {
    state: AppState,
    pattern: RoutePattern,
    children: Vec<Box<dyn Controller>>,
}

impl AlbumsController {
    pub fn new(state: AppState) -> Self {
        let children: Vec<Box<dyn Controller>> = vec![
            Box::new(Resource(AlbumTracksController {
                state: state.clone(),
                pattern: RoutePattern::new("albums/*/tracks"),
            })),
            Box::new(AlbumImageController {
                state: state.clone(),
                pattern: RoutePattern::new("albums/*/image"),
            }),
        ];
        Self {
            state,
            pattern: RoutePattern::new("albums"),
            children,
        }
    }
}

async fn find_album(state: &AppState, id: &str) -> Result<Album, ApiError> {
    albums::get(state.pool(), &AlbumId::new(id))
        .await?
        .ok_or_else(|| ApiError::not_found(ALBUM_NOT_FOUND))
}

#[async_trait]
impl ResourceController for AlbumsController {
    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    fn children(&self) -> &[Box<dyn Controller>] {
        &self.children
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        req.require(Scope::LibraryRead)?;
        let limits = req.limits();
        let page = albums::list(self.state.pool(), limits.pagination()).await?;
        ApiResponse::paged(limits, page)
    }

    async fn get(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        req.require(Scope::LibraryRead)?;
        ApiResponse::json(&find_album(&self.state, id).await?)
    }
}

/// `/albums/:id/tracks`
struct AlbumTracksController {
    state: AppState,
    pattern: RoutePattern,
}

#[async_trait]
impl ResourceController for AlbumTracksController {
    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        req.require(Scope::LibraryRead)?;
        let id = self.pattern.parent_id(&req.segments()).unwrap_or_default();
        let album = find_album(&self.state, &id).await?;

        let limits = req.limits();
        let page = tracks::by_album(self.state.pool(), &album.id, limits.pagination()).await?;
        ApiResponse::paged(limits, page)
    }
}

/// `/albums/:id/image`
struct AlbumImageController {
    state: AppState,
    pattern: RoutePattern,
}

#[async_trait]
impl Controller for AlbumImageController {
    fn matches(&self, _req: &ApiRequest, segments: &[String]) -> bool {
        self.pattern.matches_exactly(segments)
    }

    async fn handle(&self, req: &ApiRequest, segments: &[String]) -> HandlerResult {
        if !matches!(*req.method(), Method::GET | Method::HEAD) {
            return Err(not_allowed(req));
        }
        req.require(Scope::LibraryRead)?;

        let album = find_album(&self.state, &segments[1]).await?;
        let candidates = tracks::by_album(
            self.state.pool(),
            &album.id,
            Pagination::first(COVER_CANDIDATES),
        )
        .await?;

        for track in &candidates.resources {
            if let Cover::Found(cover) = read_cover(&self.state, track).await? {
                return Ok(cover_response(&cover));
            }
        }

        Err(ApiError::not_found(format!(
            "Album \"{}\" ({}) does not have an associated cover image.",
            album.id, album.title
        )))
    }
}

pub fn controller(state: AppState) -> Box<dyn Controller> {
    Box::new(Resource(AlbumsController::new(state)))
}
