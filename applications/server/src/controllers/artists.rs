//! `/artists`, an artist's albums and tracks, and their external image

use crate::api::router::not_allowed;
use crate::api::request::Limits;
use crate::api::{
    ApiError, ApiRequest, Controller, HandlerResult, Resource, ResourceController, RoutePattern,
};
use crate::response::{ApiResponse, ContentTypeRule, ProxyResponse};
use crate::state::AppState;
use async_trait::async_trait;
use axum::http::header::RANGE;
use axum::http::{Method, StatusCode};
use prelude_core::{Artist, ArtistId, Scope};
use prelude_storage::{albums, artists, tracks, Page};
use regex::Regex;

const ARTIST_NOT_FOUND: &str = "The requested artist could not be found.";

pub struct ArtistsController {
    state: AppState,
    pattern: RoutePattern,
    children: Vec<Box<dyn Controller>>,
}

impl ArtistsController {
    pub fn new(state: AppState) -> Self {
        let children: Vec<Box<dyn Controller>> = vec![
            Box::new(Resource(ArtistAlbumsController {
                state: state.clone(),
                pattern: RoutePattern::new("artists/*/albums"),
            })),
            Box::new(Resource(ArtistTracksController {
                state: state.clone(),
                pattern: RoutePattern::new("artists/*/tracks"),
            })),
            Box::new(ArtistImageController {
                state: state.clone(),
                pattern: RoutePattern::new("artists/*/image"),
            }),
        ];
        Self {
            state,
            pattern: RoutePattern::new("artists"),
            children,
        }
    }

    /// `?id=a&id=b`: the named artists, in request order
    async fn list_selected(&self, ids: Vec<String>) -> HandlerResult {
        let mut unique: Vec<ArtistId> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = ArtistId::new(id);
            if !unique.contains(&id) {
                unique.push(id);
            }
        }

        if unique.len() > artists::MAX_BATCH {
            return Err(ApiError::BadRequest(format!(
                "You can only query up to {} artists at a time. (got {})",
                artists::MAX_BATCH,
                unique.len()
            )));
        }

        let found = artists::get_many(self.state.pool(), &unique).await?;
        let limits = Limits {
            page: 1,
            limit: unique.len() as u32,
            offset: 0,
        };
        let total = found.len() as u64;
        ApiResponse::paged(
            limits,
            Page {
                resources: found,
                total,
            },
        )
    }
}

async fn find_artist(state: &AppState, id: &str) -> Result<Artist, ApiError> {
    artists::get(state.pool(), &ArtistId::new(id))
        .await?
        .ok_or_else(|| ApiError::not_found(ARTIST_NOT_FOUND))
}

#[async_trait]
impl ResourceController for ArtistsController {
    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    fn children(&self) -> &[Box<dyn Controller>] {
        &self.children
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        req.require(Scope::LibraryRead)?;

        let ids = req.query_all("id");
        if !ids.is_empty() {
            return self.list_selected(ids).await;
        }

        let limits = req.limits();
        let page = artists::list(self.state.pool(), limits.pagination()).await?;
        ApiResponse::paged(limits, page)
    }

    async fn get(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        req.require(Scope::LibraryRead)?;
        ApiResponse::json(&find_artist(&self.state, id).await?)
    }
}

/// `/artists/:id/albums`
struct ArtistAlbumsController {
    state: AppState,
    pattern: RoutePattern,
}

#[async_trait]
impl ResourceController for ArtistAlbumsController {
    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        req.require(Scope::LibraryRead)?;
        let id = self.pattern.parent_id(&req.segments()).unwrap_or_default();
        let artist = find_artist(&self.state, &id).await?;

        let limits = req.limits();
        let page = albums::by_artist(self.state.pool(), &artist.id, limits.pagination()).await?;
        ApiResponse::paged(limits, page)
    }
}

/// `/artists/:id/tracks`
struct ArtistTracksController {
    state: AppState,
    pattern: RoutePattern,
}

#[async_trait]
impl ResourceController for ArtistTracksController {
    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        req.require(Scope::LibraryRead)?;
        let id = self.pattern.parent_id(&req.segments()).unwrap_or_default();
        let artist = find_artist(&self.state, &id).await?;

        let limits = req.limits();
        let page = tracks::by_artist(self.state.pool(), &artist.id, limits.pagination()).await?;
        ApiResponse::paged(limits, page)
    }
}

/// `/artists/:id/image`: relays the artist's external image
struct ArtistImageController {
    state: AppState,
    pattern: RoutePattern,
}

#[async_trait]
impl Controller for ArtistImageController {
    fn matches(&self, _req: &ApiRequest, segments: &[String]) -> bool {
        self.pattern.matches_exactly(segments)
    }

    async fn handle(&self, req: &ApiRequest, segments: &[String]) -> HandlerResult {
        if !matches!(*req.method(), Method::GET | Method::HEAD) {
            return Err(not_allowed(req));
        }
        req.require(Scope::LibraryRead)?;

        let artist = find_artist(&self.state, &segments[1]).await?;
        let Some(url) = artist.external_image else {
            return Err(ApiError::not_found(format!(
                "Artist \"{}\" ({}) does not have an associated image.",
                artist.id, artist.name
            )));
        };

        let image = Regex::new("^image/.+$").map_err(ApiError::internal)?;
        let proxy = ProxyResponse::new(self.state.http.clone(), url)
            .forward_header(RANGE, req.headers().get(RANGE))
            .require_status(StatusCode::OK)
            .require_content_type(ContentTypeRule::Pattern(image))
            .mirror_headers(false);

        Ok(ApiResponse::Proxy(proxy))
    }
}

pub fn controller(state: AppState) -> Box<dyn Controller> {
    Box::new(Resource(ArtistsController::new(state)))
}
