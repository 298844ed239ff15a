//! User account queries

use crate::codec::{count, decode_scopes, encode_scopes};
use crate::{Page, Pagination, Result, StorageError};
use prelude_core::{User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: UserId::new(row.try_get::<String, _>("id")?),
        username: row.try_get("username")?,
        scopes: decode_scopes(&row.try_get::<String, _>("scopes")?)?,
        password_hash: row.try_get("password_hash")?,
        disabled: row.try_get("disabled")?,
    })
}

/// Get a user by ID
pub async fn get(pool: &SqlitePool, id: &UserId) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Get a user by username (case-sensitive)
pub async fn get_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// List users ordered by username
pub async fn list(pool: &SqlitePool, page: Pagination) -> Result<Page<User>> {
    let rows = sqlx::query("SELECT * FROM users ORDER BY username LIMIT ? OFFSET ?")
        .bind(page.bind_limit())
        .bind(page.bind_offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(Page {
        resources: rows.iter().map(from_row).collect::<Result<_>>()?,
        total: count(total),
    })
}

/// Insert or update a user
///
/// Returns [`StorageError::Duplicate`] when another user already has the
/// username.
pub async fn save(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, username, password_hash, scopes, disabled)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            username = excluded.username,
            password_hash = excluded.password_hash,
            scopes = excluded.scopes,
            disabled = excluded.disabled
        "#,
    )
    .bind(user.id.as_str())
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(encode_scopes(&user.scopes)?)
    .bind(user.disabled)
    .execute(pool)
    .await
    .map_err(|e| StorageError::from_write(e, "User", &user.username))?;

    Ok(())
}

/// Delete a user together with their tokens
pub async fn delete(pool: &SqlitePool, id: &UserId) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM tokens WHERE user = ?")
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Delete every user and every token
pub async fn delete_all(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM tokens").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM users").execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(())
}
