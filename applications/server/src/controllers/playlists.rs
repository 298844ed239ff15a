//! `/playlists`

use super::fields::{self, Object};
use crate::api::{
    ApiError, ApiRequest, Controller, HandlerResult, Resource, ResourceController, RoutePattern,
};
use crate::response::ApiResponse;
use crate::services::AuthContext;
use crate::state::AppState;
use async_trait::async_trait;
use axum::http::StatusCode;
use prelude_core::{Playlist, PlaylistId, Scope, TrackId, UserId, Visibility};
use prelude_storage::{playlists, tracks, users};

const PLAYLIST_NOT_FOUND: &str = "The requested playlist could not be found.";
const NAME_MAX_LENGTH: usize = 128;

const WRITE: [Scope; 2] = [Scope::PlaylistsWrite, Scope::PlaylistsWriteAll];

pub struct PlaylistsController {
    state: AppState,
    pattern: RoutePattern,
}

impl PlaylistsController {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            pattern: RoutePattern::new("playlists"),
        }
    }

    /// A playlist the caller may read. Private playlists of other users
    /// are hidden without `playlists:read:all`.
    async fn find_visible(&self, auth: &AuthContext, id: &str) -> Result<Playlist, ApiError> {
        playlists::get(self.state.pool(), &PlaylistId::new(id))
            .await?
            .filter(|playlist| {
                playlist.visibility != Visibility::Private
                    || playlist.user == auth.user().id
                    || auth.has(Scope::PlaylistsReadAll)
            })
            .ok_or_else(|| ApiError::not_found(PLAYLIST_NOT_FOUND))
    }

    /// A playlist the caller may modify
    async fn find_writable(&self, auth: &AuthContext, id: &str) -> Result<Playlist, ApiError> {
        let playlist = self.find_visible(auth, id).await?;
        if playlist.user != auth.user().id && !auth.has(Scope::PlaylistsWriteAll) {
            return Err(ApiError::Forbidden);
        }
        Ok(playlist)
    }

    async fn track_list(&self, body: &Object) -> Result<Vec<TrackId>, ApiError> {
        let ids = fields::string_list(body, "tracks", "Please select the tracks for this playlist.")?;
        if ids.is_empty() {
            return Err(ApiError::field(
                "tracks",
                "The playlist must have at least one track.",
            ));
        }

        let mut tracks = Vec::with_capacity(ids.len());
        for id in ids {
            let id = TrackId::new(id);
            if !tracks::exists(self.state.pool(), &id).await? {
                return Err(ApiError::field_with_status(
                    StatusCode::NOT_FOUND,
                    "tracks",
                    format!("Track {} does not exist.", id),
                ));
            }
            tracks.push(id);
        }
        Ok(tracks)
    }

    async fn apply(&self, playlist: &mut Playlist, body: &Object, complete: bool) -> Result<(), ApiError> {
        if complete || body.contains_key("name") {
            playlist.name = name(body)?.to_string();
        }
        if complete || body.contains_key("visibility") {
            playlist.visibility = visibility(body)?;
        }
        if complete || body.contains_key("tracks") {
            playlist.tracks = self.track_list(body).await?;
        }
        Ok(())
    }

    async fn update(&self, req: &ApiRequest, id: &str, complete: bool) -> HandlerResult {
        let auth = req.require_any(&WRITE)?;
        let mut playlist = self.find_writable(auth, id).await?;
        let body = req.object()?;

        self.apply(&mut playlist, &body, complete).await?;
        playlists::save(self.state.pool(), &playlist).await?;
        ApiResponse::json(&playlist)
    }
}

fn name(body: &Object) -> Result<&str, ApiError> {
    let name = fields::required_string(body, "name", "Please enter a name for this playlist.")?;
    fields::max_length("name", name, NAME_MAX_LENGTH)?;
    Ok(name)
}

fn visibility(body: &Object) -> Result<Visibility, ApiError> {
    fields::required_string(body, "visibility", "Please select playlist visibility.")?
        .parse()
        .map_err(|()| ApiError::field("visibility", "Invalid visibility setting."))
}

#[async_trait]
impl ResourceController for PlaylistsController {
    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        let auth = req.require(Scope::PlaylistsRead)?;
        let limits = req.limits();
        let pool = self.state.pool();
        let own = &auth.user().id;

        let page = if req.has_query("public") {
            playlists::list_public_except(pool, own, limits.pagination()).await?
        } else if req.has_query("all") && auth.has(Scope::PlaylistsReadAll) {
            playlists::list(pool, limits.pagination()).await?
        } else {
            playlists::list_by_user(pool, own, limits.pagination()).await?
        };

        ApiResponse::paged(limits, page)
    }

    async fn create(&self, req: &ApiRequest) -> HandlerResult {
        let auth = req.require_any(&WRITE)?;
        let body = req.object()?;

        let owner = match fields::optional_string(&body, "user")? {
            Some(user) if auth.has(Scope::PlaylistsWriteAll) => {
                users::get(self.state.pool(), &UserId::new(user))
                    .await?
                    .ok_or_else(|| {
                        ApiError::field_with_status(
                            StatusCode::NOT_FOUND,
                            "user",
                            "A user with the provided ID does not exist.",
                        )
                    })?
                    .id
            }
            _ => auth.user().id.clone(),
        };

        let mut playlist = Playlist::new(String::new(), owner, Visibility::Private, Vec::new());
        self.apply(&mut playlist, &body, true).await?;
        playlists::save(self.state.pool(), &playlist).await?;

        ApiResponse::created(&playlist)
    }

    async fn delete_all(&self, req: &ApiRequest) -> HandlerResult {
        let auth = req.require_any(&WRITE)?;
        if auth.has(Scope::PlaylistsWriteAll) {
            playlists::delete_all(self.state.pool()).await?;
        } else {
            playlists::delete_by_user(self.state.pool(), &auth.user().id).await?;
        }
        Ok(ApiResponse::Empty)
    }

    async fn get(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        let auth = req.require(Scope::PlaylistsRead)?;
        ApiResponse::json(&self.find_visible(auth, id).await?)
    }

    async fn delete(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        let auth = req.require_any(&WRITE)?;
        let playlist = self.find_writable(auth, id).await?;
        playlists::delete(self.state.pool(), &playlist.id).await?;
        Ok(ApiResponse::Empty)
    }

    async fn put(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        self.update(req, id, true).await
    }

    async fn patch(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        self.update(req, id, false).await
    }
}

pub fn controller(state: AppState) -> Box<dyn Controller> {
    Box::new(Resource(PlaylistsController::new(state)))
}
