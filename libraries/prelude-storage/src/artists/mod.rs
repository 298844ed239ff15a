//! Artist queries

use crate::codec::count;
use crate::{Page, Pagination, Result};
use prelude_core::{Artist, ArtistId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Maximum number of artists [`get_many`] looks up
pub const MAX_BATCH: usize = 100;

fn from_row(row: &SqliteRow) -> Result<Artist> {
    Ok(Artist {
        id: ArtistId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        external_image: row.try_get("external_image")?,
    })
}

/// Get an artist by ID
pub async fn get(pool: &SqlitePool, id: &ArtistId) -> Result<Option<Artist>> {
    let row = sqlx::query("SELECT * FROM artists WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Get up to [`MAX_BATCH`] artists by ID, in request order, skipping
/// unknown IDs
pub async fn get_many(pool: &SqlitePool, ids: &[ArtistId]) -> Result<Vec<Artist>> {
    let mut artists = Vec::new();
    for id in ids.iter().take(MAX_BATCH) {
        if let Some(artist) = get(pool, id).await? {
            artists.push(artist);
        }
    }
    Ok(artists)
}

/// List artists
pub async fn list(pool: &SqlitePool, page: Pagination) -> Result<Page<Artist>> {
    let rows = sqlx::query("SELECT * FROM artists ORDER BY rowid LIMIT ? OFFSET ?")
        .bind(page.bind_limit())
        .bind(page.bind_offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
        .fetch_one(pool)
        .await?;

    Ok(Page {
        resources: rows.iter().map(from_row).collect::<Result<_>>()?,
        total: count(total),
    })
}

/// Insert or replace an artist
pub async fn save(pool: &SqlitePool, artist: &Artist) -> Result<()> {
    sqlx::query("REPLACE INTO artists (id, name, external_image) VALUES (?, ?, ?)")
        .bind(artist.id.as_str())
        .bind(&artist.name)
        .bind(&artist.external_image)
        .execute(pool)
        .await?;

    Ok(())
}
