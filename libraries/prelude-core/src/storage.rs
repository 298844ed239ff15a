//! Credential lookups consumed by request authorization

use crate::error::Result;
use crate::types::{Token, TokenId, TokenSecret, User, UserId};
use async_trait::async_trait;

/// Read-mostly access to the credential records backing authorization.
///
/// The only write is `delete_token`, used to purge a token whose owning user
/// no longer exists.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a token by its opaque secret
    async fn find_token_by_secret(&self, secret: &TokenSecret) -> Result<Option<Token>>;

    /// Look up a user by ID
    async fn find_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Look up a user by username (case-sensitive)
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Delete a token record
    async fn delete_token(&self, id: &TokenId) -> Result<()>;
}
