//! `/tokens`: API tokens of the current user, or of everyone with the
//! `tokens:*:all` scopes

use super::fields;
use crate::api::{
    ApiError, ApiRequest, Controller, HandlerResult, Resource, ResourceController, RoutePattern,
};
use crate::response::ApiResponse;
use crate::services::AuthContext;
use crate::state::AppState;
use async_trait::async_trait;
use axum::http::StatusCode;
use prelude_core::{Scope, Token, TokenId, UserId};
use prelude_storage::{tokens, users};

const TOKEN_NOT_FOUND: &str = "The requested token could not be found.";
const NOTE_MAX_LENGTH: usize = 128;

const READ: [Scope; 2] = [Scope::TokensReadSelf, Scope::TokensReadAll];
const WRITE: [Scope; 2] = [Scope::TokensWriteSelf, Scope::TokensWriteAll];

pub struct TokensController {
    state: AppState,
    pattern: RoutePattern,
}

impl TokensController {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            pattern: RoutePattern::new("tokens"),
        }
    }

    /// A token the caller may see. Other users' tokens need `all_scope`.
    async fn find(&self, auth: &AuthContext, id: &str, all_scope: Scope) -> Result<Token, ApiError> {
        tokens::get(self.state.pool(), &TokenId::new(id))
            .await?
            .filter(|token| token.user == auth.user().id || auth.has(all_scope))
            .ok_or_else(|| ApiError::not_found(TOKEN_NOT_FOUND))
    }

    async fn update(&self, req: &ApiRequest, id: &str, complete: bool) -> HandlerResult {
        let auth = req.require_any(&WRITE)?;
        let mut token = self.find(auth, id, Scope::TokensWriteAll).await?;
        let body = req.object()?;

        if complete || body.contains_key("note") {
            token.note = note(&body)?.to_string();
        }

        tokens::save(self.state.pool(), &token).await?;
        ApiResponse::json(&token)
    }
}

fn note(body: &fields::Object) -> Result<&str, ApiError> {
    let note = fields::required_string(body, "note", "Please enter a note.")?;
    fields::max_length("note", note, NOTE_MAX_LENGTH)?;
    Ok(note)
}

#[async_trait]
impl ResourceController for TokensController {
    fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    async fn list(&self, req: &ApiRequest) -> HandlerResult {
        let auth = req.require_any(&READ)?;
        let limits = req.limits();
        let pool = self.state.pool();

        let page = if auth.has(Scope::TokensReadAll) {
            match req.query("user") {
                Some(user) => tokens::list_by_user(pool, &UserId::new(user), limits.pagination()).await?,
                None if req.has_query("all") => tokens::list(pool, limits.pagination()).await?,
                None => tokens::list_by_user(pool, &auth.user().id, limits.pagination()).await?,
            }
        } else {
            tokens::list_by_user(pool, &auth.user().id, limits.pagination()).await?
        };

        ApiResponse::paged(limits, page)
    }

    async fn create(&self, req: &ApiRequest) -> HandlerResult {
        let auth = req.require_any(&WRITE)?;
        let body = req.object()?;

        let owner = match fields::optional_string(&body, "user")? {
            Some(user) if auth.has(Scope::TokensWriteAll) => {
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

        let expires = fields::future_time(&body, "expires", "Please select a date.")?;
        let scopes = fields::scopes(&body, "scopes")?;
        if let Some(scope) = scopes.iter().find(|scope| !auth.has(**scope)) {
            return Err(ApiError::field_with_status(
                StatusCode::FORBIDDEN,
                "scopes",
                format!(
                    "You don't have permission to grant scope {} in the current authorisation context.",
                    scope
                ),
            ));
        }
        let note = note(&body)?;

        let token = Token::issue(owner, expires, scopes, note);
        tokens::save(self.state.pool(), &token).await?;

        tracing::info!(token = %token.id, user = %token.user, "Issued API token");
        ApiResponse::created(&token.json_with_secret())
    }

    async fn delete_all(&self, req: &ApiRequest) -> HandlerResult {
        let auth = req.require_any(&WRITE)?;
        if auth.has(Scope::TokensWriteAll) {
            tokens::delete_all(self.state.pool()).await?;
        } else {
            tokens::delete_by_user(self.state.pool(), &auth.user().id).await?;
        }
        Ok(ApiResponse::Empty)
    }

    async fn get(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        let auth = req.require_any(&READ)?;
        ApiResponse::json(&self.find(auth, id, Scope::TokensReadAll).await?)
    }

    async fn delete(&self, req: &ApiRequest, id: &str) -> HandlerResult {
        let auth = req.require_any(&WRITE)?;
        let token = self.find(auth, id, Scope::TokensWriteAll).await?;
        tokens::delete(self.state.pool(), &token.id).await?;
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
    Box::new(Resource(TokensController::new(state)))
}
