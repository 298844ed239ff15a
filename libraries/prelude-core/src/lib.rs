//! Prelude Core
//!
//! Value types, collaborator traits, and error handling shared by the
//! Prelude media-library server and its storage layer.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `Token`, `Track`, `Album`, `Artist`, `Playlist`
//! - **Scopes**: the capability tags granted to credentials, including the
//!   `admin` wildcard
//! - **Collaborator Traits**: `CredentialStore`, consumed by authorization
//! - **Error Handling**: Unified `PreludeError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use prelude_core::{Scope, ScopeSet};
//!
//! let scopes: ScopeSet = [Scope::LibraryRead, Scope::PlaylistsRead].into_iter().collect();
//! assert!(scopes.contains(&Scope::LibraryRead));
//! assert_eq!("tokens:read:self".parse::<Scope>().unwrap(), Scope::TokensReadSelf);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{PreludeError, Result};
pub use storage::CredentialStore;

pub use types::{
    Album, AlbumId, Artist, ArtistId, AudioMeta, Playlist, PlaylistId, Position, Scope, ScopeSet,
    Token, TokenId, TokenSecret, Track, TrackId, User, UserId, Visibility,
};
