//! Playlist queries

use crate::codec::{count, decode_json, encode_json};
use crate::{Page, Pagination, Result, StorageError};
use prelude_core::{Playlist, PlaylistId, TrackId, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn from_row(row: &SqliteRow) -> Result<Playlist> {
    let visibility: String = row.try_get("visibility")?;
    let tracks: Vec<String> = decode_json("tracks", &row.try_get::<String, _>("tracks")?)?;

    Ok(Playlist {
        id: PlaylistId::new(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        user: UserId::new(row.try_get::<String, _>("user")?),
        visibility: visibility
            .parse()
            .map_err(|()| StorageError::corrupt("visibility", &visibility))?,
        tracks: tracks.into_iter().map(TrackId::new).collect(),
    })
}

fn rows_to_page(rows: &[SqliteRow], total: i64) -> Result<Page<Playlist>> {
    Ok(Page {
        resources: rows.iter().map(from_row).collect::<Result<_>>()?,
        total: count(total),
    })
}

/// Get a playlist by ID
pub async fn get(pool: &SqlitePool, id: &PlaylistId) -> Result<Option<Playlist>> {
    let row = sqlx::query("SELECT * FROM playlists WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// List every playlist
pub async fn list(pool: &SqlitePool, page: Pagination) -> Result<Page<Playlist>> {
    let rows = sqlx::query("SELECT * FROM playlists ORDER BY rowid LIMIT ? OFFSET ?")
        .bind(page.bind_limit())
        .bind(page.bind_offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM playlists")
        .fetch_one(pool)
        .await?;

    rows_to_page(&rows, total)
}

/// List the playlists owned by a user
pub async fn list_by_user(
    pool: &SqlitePool,
    user: &UserId,
    page: Pagination,
) -> Result<Page<Playlist>> {
    let rows = sqlx::query("SELECT * FROM playlists WHERE user = ? ORDER BY rowid LIMIT ? OFFSET ?")
        .bind(user.as_str())
        .bind(page.bind_limit())
        .bind(page.bind_offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM playlists WHERE user = ?")
        .bind(user.as_str())
        .fetch_one(pool)
        .await?;

    rows_to_page(&rows, total)
}

/// List public playlists owned by anyone except `user`
pub async fn list_public_except(
    pool: &SqlitePool,
    user: &UserId,
    page: Pagination,
) -> Result<Page<Playlist>> {
    let rows = sqlx::query(
        "SELECT * FROM playlists WHERE visibility = 'public' AND user != ? ORDER BY rowid LIMIT ? OFFSET ?",
    )
    .bind(user.as_str())
    .bind(page.bind_limit())
    .bind(page.bind_offset())
    .fetch_all(pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM playlists WHERE visibility = 'public' AND user != ?")
            .bind(user.as_str())
            .fetch_one(pool)
            .await?;

    rows_to_page(&rows, total)
}

/// Insert or replace a playlist
pub async fn save(pool: &SqlitePool, playlist: &Playlist) -> Result<()> {
    let tracks: Vec<&str> = playlist.tracks.iter().map(TrackId::as_str).collect();

    sqlx::query("REPLACE INTO playlists (id, name, user, visibility, tracks) VALUES (?, ?, ?, ?, ?)")
        .bind(playlist.id.as_str())
        .bind(&playlist.name)
        .bind(playlist.user.as_str())
        .bind(playlist.visibility.as_str())
        .bind(encode_json(&tracks)?)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a playlist
pub async fn delete(pool: &SqlitePool, id: &PlaylistId) -> Result<()> {
    sqlx::query("DELETE FROM playlists WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete every playlist owned by a user
pub async fn delete_by_user(pool: &SqlitePool, user: &UserId) -> Result<()> {
    sqlx::query("DELETE FROM playlists WHERE user = ?")
        .bind(user.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete every playlist
pub async fn delete_all(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM playlists").execute(pool).await?;
    Ok(())
}
