mod ids;
mod library;
mod playlist;
mod scope;
mod token;
mod user;

pub use ids::{AlbumId, ArtistId, PlaylistId, TokenId, TokenSecret, TrackId, UserId};
pub use library::{Album, Artist, AudioMeta, Position, Track};
pub use playlist::{Playlist, Visibility};
pub use scope::{Scope, ScopeSet, UnknownScope};
pub use token::Token;
pub use user::User;
