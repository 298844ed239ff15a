//! `/users`

use super::fields::{self, Object};
use crate::api::{
    ApiError, ApiRequest, Controller, HandlerResult, Resource, ResourceController, RoutePattern,
};
use crate::response::ApiResponse;
use crate::state::AppState;
use async_trait::async_trait;
use prelude_core::{Scope, User, UserId};
use prelude_storage::{playlists, users};

const USER_NOT_FOUND: &str = "The requested user could not be found.";

pub struct UsersController {
    state: AppState,
    pattern: RoutePattern,
}

impl UsersController {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            pattern: RoutePattern::new("users"),
        }
    }

    async fn find(&self, id: &str) -> Result<User, ApiError> {
        users::get(self.state.pool(), &UserId::new(id))
            .await?
            .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
    }

    async fn store(&self, user: &User) -> Result<(), ApiError> {
        users::save(self.state.pool(), user).await.map_err(|err| {
            if err.is_duplicate() {
                ApiError::Conflict(format!("The username \"{}\" is already taken.", user.username))
            } else {
                err.into()
            }
        })
    }

    async fn hash(&self, password: &str) -> Result<String, ApiError> {
        Ok(self.state.auth_service.hash_password(password).await?)
    }

    /// Apply the fields present in `body`; with `complete` every field is required
    async fn apply(&self, user: &mut User, body: &Object, complete: bool) -> Result<(), ApiError> {
        if complete || body.contains_key("username") {
            user.username = username(body)?.to_string();
        }
        if complete || body.contains_key("password") {
            user.password_hash = self.hash(password(body)?).await?;
        }
        if complete || body.contains_key("scopes") {
            user.scopes = fields::scopes(body, "scopes")?;
        }
        if complete || body.contains_key("disabled") {
            user.disabled = fields::boolean(body, "disabled")?;
        }
        Ok(())
    }
}

fn username(body: &Object) -> Result<&str, ApiError> {
    let username = fields::required_string(body, "username", "Please enter a username.")?;
    fields::length_between("username", username, 3, 24)?;

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if !username.chars().all(allowed) {
        return Err(ApiError::field(
            "username",
            "Must only contain alphanumeric characters, hyphens, underscores, and periods.",
        ));
    }
    Ok(username)
}

fn password(body: &Object) -> Result<&str, ApiError> {
    let password = fields::required_string(body, "password", "Please enter a password.")?;
    fields::length_between("password", password, 3, 24)?;
    Ok(password)
}

#[async_trait]
impl ResourceController for UsersController {
    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        req.require(Scope::UsersRead)?;
        let limits = req.limits();
        let page = users::list(self.state.pool(), limits.pagination()).await?;
        ApiResponse::paged(limits, page)
    }

    async fn create(&self, req: &ApiRequest) -> HandlerResult {
        req.require(Scope::UsersWrite)?;
        let body = req.object()?;

        let mut user = User::new(String::new(), String::new(), std::iter::empty());
        self.apply(&mut user, &body, true).await?;
        self.store(&user).await?;

        tracing::info!(user = %user.id, username = %user.username, "Created user");
        ApiResponse::created(&user)
    }

    async fn delete_all(&self, req: &ApiRequest) -> HandlerResult {
        req.require(Scope::UsersWrite)?;
        playlists::delete_all(self.state.pool()).await?;
        users::delete_all(self.state.pool()).await?;
        Ok(ApiResponse::Empty)
    }

    async fn get(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        req.require(Scope::UsersRead)?;
        ApiResponse::json(&self.find(id).await?)
    }

    async fn delete(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        req.require(Scope::UsersWrite)?;
        let user = self.find(id).await?;
        playlists::delete_by_user(self.state.pool(), &user.id).await?;
        users::delete(self.state.pool(), &user.id).await?;

        tracing::info!(user = %user.id, "Deleted user");
        Ok(ApiResponse::Empty)
    }

    async fn put(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        req.require(Scope::UsersWrite)?;
        let mut user = self.find(id).await?;
        let body = req.object()?;
        self.apply(&mut user, &body, true).await?;
        self.store(&user).await?;
        ApiResponse::json(&user)
    }

    async fn patch(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        req.require(Scope::UsersWrite)?;
        let mut user = self.find(id).await?;
        let body = req.object()?;
        self.apply(&mut user, &body, false).await?;
        self.store(&user).await?;
        ApiResponse::json(&user)
    }
}

pub fn controller(state: AppState) -> Box<dyn Controller> {
    Box::new(Resource(UsersController::new(state)))
}
