//! Prelude Artwork - embedded cover art for the media-library server
//!
//! Reads the cover image embedded in an audio file's tags (ID3v2 APIC,
//! FLAC METADATA_BLOCK_PICTURE, MP4 covr and others supported by Lofty) and
//! keeps recently served images in an LRU cache.
//!
//! # Example
//!
//! ```no_run
//! use prelude_artwork::CoverArtReader;
//! use std::path::Path;
//!
//! let reader = CoverArtReader::new(100);
//! match reader.read(Path::new("music/track.flac")) {
//!     Ok(Some(cover)) => println!("{} bytes of {}", cover.data.len(), cover.content_type),
//!     Ok(None) => println!("No cover"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

mod error;
mod extractor;
mod types;

pub use error::{ArtworkError, Result};
pub use extractor::CoverArtReader;
pub use types::CoverArt;
