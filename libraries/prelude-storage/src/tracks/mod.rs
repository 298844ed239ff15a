//! Track queries

use crate::codec::{count, decode_json, encode_json};
use crate::{Page, Pagination, Result};
use prelude_core::{AlbumId, ArtistId, Position, Track, TrackId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Columns a track listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Year,
    TrackNo,
    DiskNo,
    Duration,
}

impl SortField {
    fn column(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Year => "year",
            SortField::TrackNo => "track_no",
            SortField::DiskNo => "disk_no",
            SortField::Duration => "duration",
        }
    }
}

/// Ordering for [`list`], parsed from `<field>` or `<field>:desc`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub descending: bool,
}

impl FromStr for Sort {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (field, direction) = s.split_once(':').unwrap_or((s, "asc"));
        let field = match field {
            "title" => SortField::Title,
            "year" => SortField::Year,
            "track_no" => SortField::TrackNo,
            "disk_no" => SortField::DiskNo,
            "duration" => SortField::Duration,
            _ => return Err(()),
        };
        Ok(Sort {
            field,
            descending: direction == "desc",
        })
    }
}

fn position(no: Option<u32>, of: Option<u32>) -> Option<Position> {
    no.map(|no| Position { no, of })
}

fn from_row(row: &SqliteRow) -> Result<Track> {
    Ok(Track {
        id: TrackId::new(row.try_get::<String, _>("id")?),
        title: row.try_get("title")?,
        artist: ArtistId::new(row.try_get::<String, _>("artist")?),
        album: row.try_get::<Option<String>, _>("album")?.map(AlbumId::new),
        file: PathBuf::from(row.try_get::<String, _>("file")?),
        year: row.try_get("year")?,
        genres: decode_json("genres", &row.try_get::<String, _>("genres")?)?,
        track: position(row.try_get("track_no")?, row.try_get("track_of")?),
        disk: position(row.try_get("disk_no")?, row.try_get("disk_of")?),
        duration: row.try_get("duration")?,
        meta: decode_json("meta", &row.try_get::<String, _>("meta")?)?,
    })
}

fn rows_to_page(rows: &[SqliteRow], total: i64) -> Result<Page<Track>> {
    Ok(Page {
        resources: rows.iter().map(from_row).collect::<Result<_>>()?,
        total: count(total),
    })
}

/// Get a track by ID
pub async fn get(pool: &SqlitePool, id: &TrackId) -> Result<Option<Track>> {
    let row = sqlx::query("SELECT * FROM tracks WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Get the track stored for a file path
pub async fn get_by_file(pool: &SqlitePool, file: &Path) -> Result<Option<Track>> {
    let row = sqlx::query("SELECT * FROM tracks WHERE file = ?")
        .bind(file.to_string_lossy().as_ref())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Whether a track with the given ID exists
pub async fn exists(pool: &SqlitePool, id: &TrackId) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM tracks WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

/// List tracks, optionally ordered
pub async fn list(pool: &SqlitePool, page: Pagination, sort: Option<Sort>) -> Result<Page<Track>> {
    let sql = match sort {
        Some(sort) => format!(
            "SELECT * FROM tracks ORDER BY {} {} LIMIT ? OFFSET ?",
            sort.field.column(),
            if sort.descending { "DESC" } else { "ASC" }
        ),
        None => "SELECT * FROM tracks ORDER BY rowid LIMIT ? OFFSET ?".to_string(),
    };

    let rows = sqlx::query(&sql)
        .bind(page.bind_limit())
        .bind(page.bind_offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks")
        .fetch_one(pool)
        .await?;

    rows_to_page(&rows, total)
}

/// Tracks of an album, by track number
pub async fn by_album(pool: &SqlitePool, album: &AlbumId, page: Pagination) -> Result<Page<Track>> {
    let rows = sqlx::query(
        "SELECT * FROM tracks WHERE album = ? ORDER BY disk_no, track_no LIMIT ? OFFSET ?",
    )
    .bind(album.as_str())
    .bind(page.bind_limit())
    .bind(page.bind_offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks WHERE album = ?")
        .bind(album.as_str())
        .fetch_one(pool)
        .await?;

    rows_to_page(&rows, total)
}

/// Tracks of an artist, newest first
pub async fn by_artist(
    pool: &SqlitePool,
    artist: &ArtistId,
    page: Pagination,
) -> Result<Page<Track>> {
    let rows = sqlx::query(
        "SELECT * FROM tracks WHERE artist = ? ORDER BY year DESC, title LIMIT ? OFFSET ?",
    )
    .bind(artist.as_str())
    .bind(page.bind_limit())
    .bind(page.bind_offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracks WHERE artist = ?")
        .bind(artist.as_str())
        .fetch_one(pool)
        .await?;

    rows_to_page(&rows, total)
}

/// Insert or replace a track
pub async fn save(pool: &SqlitePool, track: &Track) -> Result<()> {
    sqlx::query(
        r#"
        REPLACE INTO tracks (
            id, title, artist, album, file, year, genres,
            track_no, track_of, disk_no, disk_of, duration, meta
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(track.id.as_str())
    .bind(&track.title)
    .bind(track.artist.as_str())
    .bind(track.album.as_ref().map(AlbumId::as_str))
    .bind(track.file.to_string_lossy().as_ref())
    .bind(track.year)
    .bind(encode_json(&track.genres)?)
    .bind(track.track.map(|p| p.no))
    .bind(track.track.and_then(|p| p.of))
    .bind(track.disk.map(|p| p.no))
    .bind(track.disk.and_then(|p| p.of))
    .bind(track.duration)
    .bind(encode_json(&track.meta)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a track whose file is gone, along with its album and artist
/// once nothing else references them
pub async fn remove(pool: &SqlitePool, track: &Track) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(track.id.as_str())
        .execute(&mut *tx)
        .await?;

    if let Some(album) = &track.album {
        sqlx::query(
            "DELETE FROM albums WHERE id = ? AND NOT EXISTS (SELECT 1 FROM tracks WHERE album = ?)",
        )
        .bind(album.as_str())
        .bind(album.as_str())
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        DELETE FROM artists WHERE id = ?
            AND NOT EXISTS (SELECT 1 FROM tracks WHERE artist = ?)
            AND NOT EXISTS (SELECT 1 FROM albums WHERE artist = ?)
        "#,
    )
    .bind(track.artist.as_str())
    .bind(track.artist.as_str())
    .bind(track.artist.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parses_field_and_direction() {
        assert_eq!(
            "year:desc".parse(),
            Ok(Sort {
                field: SortField::Year,
                descending: true
            })
        );
        assert_eq!(
            "title".parse(),
            Ok(Sort {
                field: SortField::Title,
                descending: false
            })
        );
        assert!("file".parse::<Sort>().is_err());
    }
}
