/// Authentication service - credential resolution and password handling
use crate::api::ApiError;
use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use prelude_core::{CredentialStore, PreludeError, Scope, ScopeSet, TokenSecret, User};
use std::sync::Arc;

/// Who is making a request and what they may do.
///
/// Built once per request and never modified.
#[derive(Debug, Clone)]
pub struct AuthContext {
    user: User,
    scopes: ScopeSet,
    expires: Option<DateTime<Utc>>,
}

impl AuthContext {
    pub fn new(user: User, scopes: ScopeSet, expires: Option<DateTime<Utc>>) -> Self {
        Self {
            user,
            scopes,
            expires,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn scopes(&self) -> &ScopeSet {
        &self.scopes
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    /// Not consulted during resolution; expired tokens still authenticate
    pub fn is_expired(&self) -> bool {
        self.expires.is_some_and(|expires| expires < Utc::now())
    }

    /// Whether `scope` is granted, directly or through `admin`
    pub fn has(&self, scope: Scope) -> bool {
        scope.granted_by(&self.scopes)
    }

    pub fn require(&self, scope: Scope) -> std::result::Result<(), ApiError> {
        if self.has(scope) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Use a different bcrypt work factor for new hashes
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Resolve an `Authorization` header value.
    ///
    /// Unknown schemes and bad credentials resolve to `None`; only store
    /// failures are errors.
    pub async fn resolve(
        &self,
        header: Option<&str>,
    ) -> std::result::Result<Option<AuthContext>, PreludeError> {
        let Some(header) = header else {
            return Ok(None);
        };

        let (scheme, credentials) = header.trim().split_once(' ').unwrap_or((header, ""));
        match scheme.to_ascii_lowercase().as_str() {
            "bearer" => self.resolve_token(credentials.trim()).await,
            "basic" => match decode_basic(credentials.trim()) {
                Some((username, password)) => self.resolve_password(&username, &password).await,
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }

    async fn resolve_token(
        &self,
        secret: &str,
    ) -> std::result::Result<Option<AuthContext>, PreludeError> {
        let Some(token) = self
            .store
            .find_token_by_secret(&TokenSecret::new(secret))
            .await?
        else {
            return Ok(None);
        };

        let Some(user) = self.store.find_user(&token.user).await? else {
            tracing::info!(token = %token.id, user = %token.user, "Removing token of deleted user");
            self.store.delete_token(&token.id).await?;
            return Ok(None);
        };

        if user.disabled {
            return Ok(None);
        }

        Ok(Some(AuthContext::new(user, token.scopes, token.expires)))
    }

    async fn resolve_password(
        &self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Option<AuthContext>, PreludeError> {
        let Some(user) = self.store.find_user_by_username(username).await? else {
            return Ok(None);
        };

        if user.disabled || !self.verify_password(password, &user.password_hash).await {
            return Ok(None);
        }

        let scopes = user.scopes.clone();
        Ok(Some(AuthContext::new(user, scopes, None)))
    }

    /// Hash a password using bcrypt
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hash)
    }

    /// Verify a password against a hash; an unreadable hash never matches
    pub async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let password = password.to_string();
        let hash = hash.to_string();
        match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(err)) => {
                tracing::warn!("Stored password hash could not be checked: {}", err);
                false
            }
            Err(err) => {
                tracing::error!("Password verification task failed: {}", err);
                false
            }
        }
    }
}

/// Split a Basic credential into username and password
fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':').unwrap_or((&decoded, ""));
    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use prelude_core::{Token, TokenId, UserId};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        users: Mutex<Vec<User>>,
        tokens: Mutex<Vec<Token>>,
    }

    #[async_trait]
    impl CredentialStore for MemoryStore {
        async fn find_token_by_secret(
            &self,
            secret: &TokenSecret,
        ) -> prelude_core::Result<Option<Token>> {
            let tokens = self.tokens.lock().unwrap();
            Ok(tokens.iter().find(|t| &t.secret == secret).cloned())
        }

        async fn find_user(&self, id: &UserId) -> prelude_core::Result<Option<User>> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| &u.id == id).cloned())
        }

        async fn find_user_by_username(
            &self,
            username: &str,
        ) -> prelude_core::Result<Option<User>> {
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.username == username).cloned())
        }

        async fn delete_token(&self, id: &TokenId) -> prelude_core::Result<()> {
            self.tokens.lock().unwrap().retain(|t| &t.id != id);
            Ok(())
        }
    }

    async fn service_with_user(disabled: bool) -> (AuthService, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::default());
        let service = AuthService::new(store.clone()).with_cost(4);

        let hash = service.hash_password("hunter22").await.unwrap();
        let mut user = User::new("alice", hash, [Scope::LibraryRead]);
        user.disabled = disabled;
        store.users.lock().unwrap().push(user.clone());

        (service, store, user)
    }

    fn issue(store: &MemoryStore, user: &User, scopes: &[Scope]) -> Token {
        let token = Token::issue(
            user.id.clone(),
            None,
            scopes.iter().copied().collect(),
            "test",
        );
        store.tokens.lock().unwrap().push(token.clone());
        token
    }

    fn basic(username: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
    }

    #[test]
    fn admin_context_satisfies_every_scope() {
        let user = User::new("root", "x", [Scope::Admin]);
        let context = AuthContext::new(user, [Scope::Admin].into_iter().collect(), None);
        for scope in Scope::ALL {
            assert!(context.require(scope).is_ok(), "{} should be granted", scope);
        }
    }

    #[test]
    fn missing_scope_is_forbidden() {
        let user = User::new("bob", "x", std::iter::empty());
        let context = AuthContext::new(user, [Scope::LibraryRead].into_iter().collect(), None);
        assert!(context.require(Scope::LibraryRead).is_ok());
        assert!(matches!(
            context.require(Scope::LibraryWrite),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn decodes_basic_credentials() {
        let encoded = STANDARD.encode("alice:pa:ss");
        assert_eq!(
            decode_basic(&encoded),
            Some(("alice".to_string(), "pa:ss".to_string()))
        );
        assert_eq!(decode_basic("%%%"), None);
    }

    #[tokio::test]
    async fn absent_or_unknown_schemes_resolve_to_none() {
        let (service, _, _) = service_with_user(false).await;
        assert!(service.resolve(None).await.unwrap().is_none());
        assert!(service.resolve(Some("Digest abc")).await.unwrap().is_none());
        assert!(service.resolve(Some("")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bearer_token_carries_token_scopes() {
        let (service, store, user) = service_with_user(false).await;
        let token = issue(&store, &user, &[Scope::PlaylistsRead]);

        let header = format!("Bearer {}", token.secret.as_str());
        let context = service.resolve(Some(&header)).await.unwrap().unwrap();

        assert_eq!(context.user().id, user.id);
        assert!(context.has(Scope::PlaylistsRead));
        assert!(!context.has(Scope::LibraryRead));
    }

    #[tokio::test]
    async fn scheme_is_case_insensitive() {
        let (service, store, user) = service_with_user(false).await;
        let token = issue(&store, &user, &[]);
        let header = format!("bearer {}", token.secret.as_str());
        assert!(service.resolve(Some(&header)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn token_of_deleted_user_is_purged() {
        let (service, store, user) = service_with_user(false).await;
        let token = issue(&store, &user, &[Scope::LibraryRead]);
        store.users.lock().unwrap().clear();

        let header = format!("Bearer {}", token.secret.as_str());
        assert!(service.resolve(Some(&header)).await.unwrap().is_none());
        assert!(store.tokens.lock().unwrap().is_empty());
        assert!(service.resolve(Some(&header)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn token_of_disabled_user_is_kept_but_rejected() {
        let (service, store, user) = service_with_user(true).await;
        let token = issue(&store, &user, &[Scope::LibraryRead]);

        let header = format!("Bearer {}", token.secret.as_str());
        assert!(service.resolve(Some(&header)).await.unwrap().is_none());
        assert_eq!(store.tokens.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_token_still_resolves() {
        let (service, store, user) = service_with_user(false).await;
        let mut token = issue(&store, &user, &[Scope::LibraryRead]);
        token.expires = Some(Utc::now() - chrono::Duration::hours(1));
        *store.tokens.lock().unwrap() = vec![token.clone()];

        let header = format!("Bearer {}", token.secret.as_str());
        let context = service.resolve(Some(&header)).await.unwrap().unwrap();
        assert!(context.is_expired());
    }

    #[tokio::test]
    async fn basic_uses_user_scopes() {
        let (service, _, _) = service_with_user(false).await;
        let context = service
            .resolve(Some(&basic("alice", "hunter22")))
            .await
            .unwrap()
            .unwrap();
        assert!(context.has(Scope::LibraryRead));
        assert!(context.expires().is_none());
    }

    #[tokio::test]
    async fn basic_rejects_wrong_password_and_unknown_user() {
        let (service, _, _) = service_with_user(false).await;
        assert!(service.resolve(Some(&basic("alice", "wrong"))).await.unwrap().is_none());
        assert!(service.resolve(Some(&basic("mallory", "hunter22"))).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn basic_rejects_disabled_user_with_any_password() {
        let (service, _, _) = service_with_user(true).await;
        assert!(service.resolve(Some(&basic("alice", "hunter22"))).await.unwrap().is_none());
        assert!(service.resolve(Some(&basic("alice", "wrong"))).await.unwrap().is_none());
    }
}
