/// ID types for Prelude entities
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing string representation
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

macro_rules! random_id {
    ($name:ident) => {
        impl $name {
            /// Generate a new random ID
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }
        }
    };
}

string_id!(
    /// User identifier
    UserId
);
string_id!(
    /// API token identifier (public, safe to show)
    TokenId
);
string_id!(
    /// Track identifier
    TrackId
);
string_id!(
    /// Album identifier
    AlbumId
);
string_id!(
    /// Artist identifier
    ArtistId
);
string_id!(
    /// Playlist identifier
    PlaylistId
);

random_id!(UserId);
random_id!(TokenId);
random_id!(PlaylistId);

/// Opaque bearer secret of an API token.
///
/// `Debug` never prints the secret itself.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);

impl TokenSecret {
    /// Number of characters in a generated secret
    pub const LENGTH: usize = 36;

    /// Wrap a secret received from a client or loaded from storage
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Generate a new random alphanumeric secret
    pub fn generate() -> Self {
        let secret = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::LENGTH)
            .map(char::from)
            .collect();
        Self(secret)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(***)")
    }
}
