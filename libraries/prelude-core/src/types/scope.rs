/// Capability scopes granted to users and API tokens
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An immutable-by-convention set of granted scopes
pub type ScopeSet = BTreeSet<Scope>;

/// Which resources a credential can read or write.
///
/// [`Scope::Admin`] is a wildcard: it satisfies every scope check, including
/// checks for scopes added after a token was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Read-only access to artists, albums and tracks
    #[serde(rename = "library:read")]
    LibraryRead,
    /// Write access to artists, albums and tracks
    #[serde(rename = "library:write")]
    LibraryWrite,
    /// Read your own tokens
    #[serde(rename = "tokens:read:self")]
    TokensReadSelf,
    /// Create, modify and delete your own tokens
    #[serde(rename = "tokens:write:self")]
    TokensWriteSelf,
    /// Read everyone's tokens
    #[serde(rename = "tokens:read:all")]
    TokensReadAll,
    /// Create, modify and delete everyone's tokens
    #[serde(rename = "tokens:write:all")]
    TokensWriteAll,
    /// Read users
    #[serde(rename = "users:read")]
    UsersRead,
    /// Create, modify and delete users
    #[serde(rename = "users:write")]
    UsersWrite,
    /// Read playlists, excluding other users' private playlists
    #[serde(rename = "playlists:read")]
    PlaylistsRead,
    /// Create, modify and delete your own playlists
    #[serde(rename = "playlists:write")]
    PlaylistsWrite,
    /// Read everyone's playlists
    #[serde(rename = "playlists:read:all")]
    PlaylistsReadAll,
    /// Create, modify and delete everyone's playlists
    #[serde(rename = "playlists:write:all")]
    PlaylistsWriteAll,
    /// Full administrative access
    #[serde(rename = "admin")]
    Admin,
}

impl Scope {
    /// Every defined scope, in declaration order
    pub const ALL: [Scope; 13] = [
        Scope::LibraryRead,
        Scope::LibraryWrite,
        Scope::TokensReadSelf,
        Scope::TokensWriteSelf,
        Scope::TokensReadAll,
        Scope::TokensWriteAll,
        Scope::UsersRead,
        Scope::UsersWrite,
        Scope::PlaylistsRead,
        Scope::PlaylistsWrite,
        Scope::PlaylistsReadAll,
        Scope::PlaylistsWriteAll,
        Scope::Admin,
    ];

    /// Wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::LibraryRead => "library:read",
            Scope::LibraryWrite => "library:write",
            Scope::TokensReadSelf => "tokens:read:self",
            Scope::TokensWriteSelf => "tokens:write:self",
            Scope::TokensReadAll => "tokens:read:all",
            Scope::TokensWriteAll => "tokens:write:all",
            Scope::UsersRead => "users:read",
            Scope::UsersWrite => "users:write",
            Scope::PlaylistsRead => "playlists:read",
            Scope::PlaylistsWrite => "playlists:write",
            Scope::PlaylistsReadAll => "playlists:read:all",
            Scope::PlaylistsWriteAll => "playlists:write:all",
            Scope::Admin => "admin",
        }
    }

    /// Whether a set of granted scopes satisfies a check for `self`
    pub fn granted_by(self, scopes: &ScopeSet) -> bool {
        scopes.contains(&Scope::Admin) || scopes.contains(&self)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a string that names no known scope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown scope {0}")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| UnknownScope(s.to_string()))
    }
}
