/// API token domain type
use crate::types::{ScopeSet, TokenId, TokenSecret, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A bearer credential owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Public token identifier
    pub id: TokenId,

    /// Owning user
    pub user: UserId,

    /// Bearer secret; only revealed once, when the token is created
    #[serde(skip_serializing)]
    pub secret: TokenSecret,

    /// When the token expires, or `None` if it never does
    pub expires: Option<DateTime<Utc>>,

    /// Scopes this token grants
    pub scopes: ScopeSet,

    /// User-provided note
    pub note: String,
}

impl Token {
    /// Issue a new token with a fresh ID and secret
    pub fn issue(
        user: UserId,
        expires: Option<DateTime<Utc>>,
        scopes: ScopeSet,
        note: impl Into<String>,
    ) -> Self {
        Self {
            id: TokenId::generate(),
            user,
            secret: TokenSecret::generate(),
            expires,
            scopes,
            note: note.into(),
        }
    }

    /// Whether the expiry time has passed
    pub fn is_expired(&self) -> bool {
        self.expires.is_some_and(|expires| expires < Utc::now())
    }

    /// JSON view that includes the secret
    pub fn json_with_secret(&self) -> Value {
        let mut json = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut json {
            map.insert(
                "secret".to_string(),
                Value::String(self.secret.as_str().to_string()),
            );
        }
        json
    }
}
