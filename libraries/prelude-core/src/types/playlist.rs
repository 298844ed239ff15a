/// Playlist domain types
use crate::types::{PlaylistId, TrackId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who can see a playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only visible to its owner
    Private,
    /// Accessible to anyone with the ID, but not listed publicly
    Unlisted,
    /// Listed publicly
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Unlisted => "unlisted",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Visibility::Private),
            "unlisted" => Ok(Visibility::Unlisted),
            "public" => Ok(Visibility::Public),
            _ => Err(()),
        }
    }
}

/// An ordered list of tracks owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub user: UserId,
    pub visibility: Visibility,
    pub tracks: Vec<TrackId>,
}

impl Playlist {
    /// Create a playlist with a fresh ID
    pub fn new(
        name: impl Into<String>,
        user: UserId,
        visibility: Visibility,
        tracks: Vec<TrackId>,
    ) -> Self {
        Self {
            id: PlaylistId::generate(),
            name: name.into(),
            user,
            visibility,
            tracks,
        }
    }
}
