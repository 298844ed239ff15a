/// Library domain types: tracks, albums and artists
use crate::types::{AlbumId, ArtistId, TrackId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Position of a track within an album or of a disk within a set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub no: u32,
    pub of: Option<u32>,
}

/// Audio stream properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMeta {
    /// Number of audio channels
    pub channels: u8,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bitrate in bits per second
    pub bitrate: u32,
    /// Whether the audio format is lossless
    pub lossless: bool,
}

/// A track in the library
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: ArtistId,
    pub album: Option<AlbumId>,

    /// Location of the audio file on disk; never serialized
    #[serde(skip_serializing)]
    pub file: PathBuf,

    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub track: Option<Position>,
    pub disk: Option<Position>,

    /// Duration in seconds
    pub duration: f64,

    pub meta: AudioMeta,
}

/// An album in the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub artist: ArtistId,
}

/// An artist in the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,

    /// Remote image URL, served through the image proxy endpoint
    #[serde(rename = "image")]
    pub external_image: Option<String>,
}
