//! Album queries

use crate::codec::count;
use crate::{Page, Pagination, Result};
use prelude_core::{Album, AlbumId, ArtistId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn from_row(row: &SqliteRow) -> Result<Album> {
    Ok(Album {
        id: AlbumId::new(row.try_get::<String, _>("id")?),
        title: row.try_get("title")?,
        artist: ArtistId::new(row.try_get::<String, _>("artist")?),
    })
}

/// Get an album by ID
pub async fn get(pool: &SqlitePool, id: &AlbumId) -> Result<Option<Album>> {
    let row = sqlx::query("SELECT * FROM albums WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// List albums
pub async fn list(pool: &SqlitePool, page: Pagination) -> Result<Page<Album>> {
    let rows = sqlx::query("SELECT * FROM albums ORDER BY rowid LIMIT ? OFFSET ?")
        .bind(page.bind_limit())
        .bind(page.bind_offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM albums")
        .fetch_one(pool)
        .await?;

    Ok(Page {
        resources: rows.iter().map(from_row).collect::<Result<_>>()?,
        total: count(total),
    })
}

/// Albums of an artist, by title
pub async fn by_artist(
    pool: &SqlitePool,
    artist: &ArtistId,
    page: Pagination,
) -> Result<Page<Album>> {
    let rows = sqlx::query("SELECT * FROM albums WHERE artist = ? ORDER BY title LIMIT ? OFFSET ?")
        .bind(artist.as_str())
        .bind(page.bind_limit())
        .bind(page.bind_offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM albums WHERE artist = ?")
        .bind(artist.as_str())
        .fetch_one(pool)
        .await?;

    Ok(Page {
        resources: rows.iter().map(from_row).collect::<Result<_>>()?,
        total: count(total),
    })
}

/// Insert or replace an album
pub async fn save(pool: &SqlitePool, album: &Album) -> Result<()> {
    sqlx::query("REPLACE INTO albums (id, title, artist) VALUES (?, ?, ?)")
        .bind(album.id.as_str())
        .bind(&album.title)
        .bind(album.artist.as_str())
        .execute(pool)
        .await?;

    Ok(())
}
