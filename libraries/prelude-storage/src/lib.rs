//! Prelude Storage
//!
//! `SQLite` persistence for the Prelude media-library server.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: each resource owns its own queries and row mapping
//! - **Embedded Migrations**: the schema ships inside the binary
//! - **Credential Lookups**: [`Database`] implements
//!   [`prelude_core::CredentialStore`] for request authorization
//!
//! # Example
//!
//! ```rust,no_run
//! use prelude_storage::{create_pool, run_migrations, tracks, Pagination};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://prelude.db").await?;
//! run_migrations(&pool).await?;
//!
//! let page = tracks::list(&pool, Pagination::first(20), None).await?;
//! println!("{} of {} tracks", page.resources.len(), page.total);
//! # Ok(())
//! # }
//! ```

mod codec;
mod database;
mod error;
mod page;

// Vertical slices
pub mod albums;
pub mod artists;
pub mod playlists;
pub mod tokens;
pub mod tracks;
pub mod users;

pub use database::Database;
pub use error::{Result, StorageError};
pub use page::{Page, Pagination};
pub use sqlx::sqlite::SqlitePool;

use sqlx::migrate::Migrator;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before serving requests.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// The database file is created if missing and opened in WAL mode.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
