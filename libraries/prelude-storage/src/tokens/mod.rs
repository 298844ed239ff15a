//! API token queries

use crate::codec::{count, decode_scopes, decode_timestamp, encode_scopes};
use crate::{Page, Pagination, Result};
use prelude_core::{Token, TokenId, TokenSecret, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn from_row(row: &SqliteRow) -> Result<Token> {
    Ok(Token {
        id: TokenId::new(row.try_get::<String, _>("id")?),
        user: UserId::new(row.try_get::<String, _>("user")?),
        secret: TokenSecret::new(row.try_get::<String, _>("secret")?),
        expires: decode_timestamp(row.try_get("expires")?)?,
        scopes: decode_scopes(&row.try_get::<String, _>("scopes")?)?,
        note: row.try_get("note")?,
    })
}

/// Get a token by its public ID
pub async fn get(pool: &SqlitePool, id: &TokenId) -> Result<Option<Token>> {
    let row = sqlx::query("SELECT * FROM tokens WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// Get a token by its bearer secret
pub async fn get_by_secret(pool: &SqlitePool, secret: &TokenSecret) -> Result<Option<Token>> {
    let row = sqlx::query("SELECT * FROM tokens WHERE secret = ?")
        .bind(secret.as_str())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(from_row).transpose()
}

/// List every token
pub async fn list(pool: &SqlitePool, page: Pagination) -> Result<Page<Token>> {
    let rows = sqlx::query("SELECT * FROM tokens ORDER BY rowid LIMIT ? OFFSET ?")
        .bind(page.bind_limit())
        .bind(page.bind_offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens")
        .fetch_one(pool)
        .await?;

    Ok(Page {
        resources: rows.iter().map(from_row).collect::<Result<_>>()?,
        total: count(total),
    })
}

/// List the tokens owned by a user
pub async fn list_by_user(
    pool: &SqlitePool,
    user: &UserId,
    page: Pagination,
) -> Result<Page<Token>> {
    let rows = sqlx::query("SELECT * FROM tokens WHERE user = ? ORDER BY rowid LIMIT ? OFFSET ?")
        .bind(user.as_str())
        .bind(page.bind_limit())
        .bind(page.bind_offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE user = ?")
        .bind(user.as_str())
        .fetch_one(pool)
        .await?;

    Ok(Page {
        resources: rows.iter().map(from_row).collect::<Result<_>>()?,
        total: count(total),
    })
}

/// Insert or replace a token
pub async fn save(pool: &SqlitePool, token: &Token) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tokens (id, user, secret, expires, scopes, note)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            user = excluded.user,
            secret = excluded.secret,
            expires = excluded.expires,
            scopes = excluded.scopes,
            note = excluded.note
        "#,
    )
    .bind(token.id.as_str())
    .bind(token.user.as_str())
    .bind(token.secret.as_str())
    .bind(token.expires.map(|e| e.timestamp()))
    .bind(encode_scopes(&token.scopes)?)
    .bind(&token.note)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a token
pub async fn delete(pool: &SqlitePool, id: &TokenId) -> Result<()> {
    sqlx::query("DELETE FROM tokens WHERE id = ?")
        .bind(id.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete every token owned by a user
pub async fn delete_by_user(pool: &SqlitePool, user: &UserId) -> Result<()> {
    sqlx::query("DELETE FROM tokens WHERE user = ?")
        .bind(user.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete every token
pub async fn delete_all(pool: &SqlitePool) -> Result<()> {
    sqlx::query("DELETE FROM tokens").execute(pool).await?;
    Ok(())
}
