use crate::error::{ArtworkError, Result};
use crate::types::CoverArt;
use lofty::{Picture, PictureType, TaggedFileExt};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::sync::Arc;

/// Maximum embedded image size (5MB)
const MAX_COVER_SIZE: usize = 5 * 1024 * 1024;

/// Reads embedded cover art from audio files, caching recent results
pub struct CoverArtReader {
    cache: Mutex<LruCache<PathBuf, Arc<CoverArt>>>,
}

impl CoverArtReader {
    /// Create a reader that caches up to `cache_size` images (minimum 1)
    pub fn new(cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Read the cover image of an audio file.
    ///
    /// Returns `Ok(None)` if the file has no tag, no pictures, or several
    /// pictures none of which is a cover. This call blocks on file I/O.
    pub fn read(&self, path: &Path) -> Result<Option<Arc<CoverArt>>> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if let Some(cached) = self.lock().get(&key) {
            return Ok(Some(Arc::clone(cached)));
        }

        let Some(cover) = Self::read_from_file(path)? else {
            return Ok(None);
        };

        let cover = Arc::new(cover);
        self.lock().put(key, Arc::clone(&cover));
        Ok(Some(cover))
    }

    /// Drop every cached image
    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<PathBuf, Arc<CoverArt>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_from_file(path: &Path) -> Result<Option<CoverArt>> {
        if !path.exists() {
            return Err(ArtworkError::FileNotFound(path.to_path_buf()));
        }

        let tagged_file = lofty::read_from_path(path)?;

        let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
            return Ok(None);
        };

        let Some(picture) = select_cover(tag.pictures()) else {
            return Ok(None);
        };

        let data = picture.data();
        if data.len() > MAX_COVER_SIZE {
            return Err(ArtworkError::TooLarge(data.len(), MAX_COVER_SIZE));
        }

        let content_type = picture
            .mime_type()
            .map_or_else(|| "image/jpeg".to_string(), |m| m.as_str().to_string());

        Ok(Some(CoverArt::new(data.to_vec(), content_type)))
    }
}

/// A lone picture is always the cover. Among several, the front cover wins,
/// then any other cover-like picture.
fn select_cover(pictures: &[Picture]) -> Option<&Picture> {
    if let [only] = pictures {
        return Some(only);
    }
    pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| {
            pictures
                .iter()
                .find(|p| matches!(p.pic_type(), PictureType::CoverBack | PictureType::Media))
        })
}
