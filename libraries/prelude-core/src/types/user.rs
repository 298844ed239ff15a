/// User domain type
use crate::types::{Scope, ScopeSet, UserId};
use serde::Serialize;

/// User account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user identifier
    pub id: UserId,

    /// Login name, unique across users
    pub username: String,

    /// Scopes granted when authenticating with username and password
    pub scopes: ScopeSet,

    /// Password hash; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Disabled users cannot authenticate by any scheme
    pub disabled: bool,
}

impl User {
    /// Create a new enabled user with a fresh ID
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        scopes: impl IntoIterator<Item = Scope>,
    ) -> Self {
        Self {
            id: UserId::generate(),
            username: username.into(),
            scopes: scopes.into_iter().collect(),
            password_hash: password_hash.into(),
            disabled: false,
        }
    }
}
