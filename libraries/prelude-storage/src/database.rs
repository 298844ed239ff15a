/// Database handle shared by the server
use crate::{tokens, users};
use async_trait::async_trait;
use prelude_core::{CredentialStore, Result, Token, TokenId, TokenSecret, User, UserId};
use sqlx::SqlitePool;

/// `SQLite`-backed store for every Prelude resource
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str) -> crate::Result<Self> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (migrations are assumed to have run)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for Database {
    async fn find_token_by_secret(&self, secret: &TokenSecret) -> Result<Option<Token>> {
        Ok(tokens::get_by_secret(&self.pool, secret).await?)
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(users::get(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(users::get_by_username(&self.pool, username).await?)
    }

    async fn delete_token(&self, id: &TokenId) -> Result<()> {
        Ok(tokens::delete(&self.pool, id).await?)
    }
}
