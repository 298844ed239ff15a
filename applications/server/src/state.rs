/// Shared application state
use crate::config::ServerConfig;
use crate::services::AuthService;
use prelude_artwork::CoverArtReader;
use prelude_storage::Database;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all controllers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub auth_service: Arc<AuthService>,
    pub artwork: Arc<CoverArtReader>,
    pub http: reqwest::Client,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Arc<Database>, auth_service: Arc<AuthService>, config: ServerConfig) -> Self {
        let artwork = CoverArtReader::new(config.api.artwork_cache_size);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.proxy_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            db,
            auth_service,
            artwork: Arc::new(artwork),
            http,
            config: Arc::new(config),
        }
    }

    /// Connect to the configured database and build the default services
    pub async fn connect(config: ServerConfig) -> crate::Result<Self> {
        let db = Arc::new(Database::connect(&config.storage.database_url).await?);
        let auth_service = Arc::new(AuthService::new(db.clone()));
        Ok(Self::new(db, auth_service, config))
    }

    pub fn pool(&self) -> &prelude_storage::SqlitePool {
        self.db.pool()
    }
}
