//! `/tracks`, plus the audio stream and cover art of each track

use crate::api::router::not_allowed;
use crate::api::{
    ApiError, ApiRequest, Controller, HandlerResult, Resource, ResourceController, RoutePattern,
};
use crate::response::{ApiResponse, LocalFile};
use crate::state::AppState;
use async_trait::async_trait;
use axum::http::Method;
use prelude_artwork::{ArtworkError, CoverArt};
use prelude_core::{Scope, Track, TrackId};
use prelude_storage::tracks::{self, Sort};
use std::sync::Arc;

pub const TRACK_NOT_FOUND: &str = "The requested track could not be found.";

pub struct TracksController {
    state: AppState,
    pattern: RoutePattern,
    children: Vec<Box<dyn Controller>>,
}

impl TracksController {
    pub fn new(state: AppState) -> Self {
        let children: Vec<Box<dyn Controller>> = vec![
            Box::new(TrackAudioController::new(state.clone())),
            Box::new(TrackImageController::new(state.clone())),
        ];
        Self {
            state,
            pattern: RoutePattern::new("tracks"),
            children,
        }
    }
}

#[async_trait]
impl ResourceController for TracksController {
    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    fn children(&self) -> &[Box<dyn Controller>] {
        &self.children
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        req.require(Scope::LibraryRead)?;
        let limits = req.limits();
        let sort = req.query("sort").and_then(|sort| sort.parse::<Sort>().ok());
        let page = tracks::list(self.state.pool(), limits.pagination(), sort).await?;
        ApiResponse::paged(limits, page)
    }

    async fn get(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        req.require(Scope::LibraryRead)?;
        let track = find_track(&self.state, id).await?;
        ApiResponse::json(&track)
    }
}

pub(crate) async fn find_track(state: &AppState, id: &str) -> Result<Track, ApiError> {
    tracks::get(state.pool(), &TrackId::new(id))
        .await?
        .ok_or_else(|| ApiError::not_found(TRACK_NOT_FOUND))
}

/// Whether the track's file can still be opened; a track whose file is
/// gone is removed from the library
pub(crate) async fn ensure_readable(state: &AppState, track: &Track) -> Result<bool, ApiError> {
    match tokio::fs::File::open(&track.file).await {
        Ok(_) => Ok(true),
        Err(err) => {
            tracing::warn!(
                track = %track.id,
                file = %track.file.display(),
                "Removing track with unreadable file: {}",
                err
            );
            tracks::remove(state.pool(), track).await?;
            Ok(false)
        }
    }
}

pub(crate) enum Cover {
    Found(Arc<CoverArt>),
    Absent,
    FileGone,
}

/// Embedded cover art of a track's file
pub(crate) async fn read_cover(state: &AppState, track: &Track) -> Result<Cover, ApiError> {
    if !ensure_readable(state, track).await? {
        return Ok(Cover::FileGone);
    }

    let reader = state.artwork.clone();
    let path = track.file.clone();
    let read = tokio::task::spawn_blocking(move || reader.read(&path))
        .await
        .map_err(ApiError::internal)?;

    match read {
        Ok(Some(cover)) => Ok(Cover::Found(cover)),
        Ok(None) => Ok(Cover::Absent),
        Err(ArtworkError::FileNotFound(_)) => {
            tracks::remove(state.pool(), track).await?;
            Ok(Cover::FileGone)
        }
        Err(err) => {
            tracing::warn!(track = %track.id, "Could not read cover art: {}", err);
            Ok(Cover::Absent)
        }
    }
}

pub(crate) fn cover_response(cover: &CoverArt) -> ApiResponse {
    ApiResponse::buffer(cover.content_type.clone(), cover.data.clone())
}

fn require_read_method(req: &ApiRequest) -> Result<(), ApiError> {
    match *req.method() {
        Method::GET | Method::HEAD => Ok(()),
        _ => Err(not_allowed(req)),
    }
}

/// `/tracks/:id/audio`
struct TrackAudioController {
    state: AppState,
    pattern: RoutePattern,
}

impl TrackAudioController {
    fn new(state: AppState) -> Self {
        Self {
            state,
            pattern: RoutePattern::new("tracks/*/audio"),
        }
    }
}

#[async_trait]
impl Controller for TrackAudioController {
    fn matches(&self, _req: &ApiRequest, segments: &[String]) -> bool {
        self.pattern.matches_exactly(segments)
    }

    async fn handle(&self, req: &ApiRequest, segments: &[String]) -> HandlerResult {
        require_read_method(req)?;
        req.require(Scope::LibraryRead)?;

        let track = find_track(&self.state, &segments[1]).await?;
        if !ensure_readable(&self.state, &track).await? {
            return Err(ApiError::not_found(TRACK_NOT_FOUND));
        }

        Ok(ApiResponse::file(LocalFile::new(&track.file)))
    }
}

/// `/tracks/:id/image`
struct TrackImageController {
    state: AppState,
    pattern: RoutePattern,
}

impl TrackImageController {
    fn new(state: AppState) -> Self {
        Self {
            state,
            pattern: RoutePattern::new("tracks/*/image"),
        }
    }
}

#[async_trait]
impl Controller for TrackImageController {
    fn matches(&self, _req: &ApiRequest, segments: &[String]) -> bool {
        self.pattern.matches_exactly(segments)
    }

    async fn handle(&self, req: &ApiRequest, segments: &[String]) -> HandlerResult {
        require_read_method(req)?;
        req.require(Scope::LibraryRead)?;

        let track = find_track(&self.state, &segments[1]).await?;
        match read_cover(&self.state, &track).await? {
            Cover::Found(cover) => Ok(cover_response(&cover)),
            Cover::FileGone => Err(ApiError::not_found(TRACK_NOT_FOUND)),
            Cover::Absent => Err(ApiError::not_found(format!(
                "Track \"{}\" ({}) does not have an associated cover image.",
                track.id, track.title
            ))),
        }
    }
}

pub fn controller(state: AppState) -> Box<dyn Controller> {
    Box::new(Resource(TracksController::new(state)))
}
