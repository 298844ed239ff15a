/// Server configuration
use crate::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_api")]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSettings {
    /// Largest request body accepted, in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// Number of decoded cover images kept in memory
    #[serde(default = "default_artwork_cache_size")]
    pub artwork_cache_size: usize,

    /// Timeout for upstream fetches made by proxy responses
    #[serde(default = "default_proxy_timeout_secs")]
    pub proxy_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from `config.toml` (or `path`) and the environment.
    ///
    /// Environment variables use the `PRELUDE_` prefix and `__` between
    /// nesting levels, e.g. `PRELUDE_STORAGE__DATABASE_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = Path::new("config.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("PRELUDE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ServerError::Config("server.port must not be 0".to_string()));
        }

        if self.storage.database_url.is_empty() {
            return Err(ServerError::Config(
                "Database URL is required (set PRELUDE_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/prelude.db".to_string()
}

fn default_api() -> ApiSettings {
    ApiSettings {
        max_body_size: default_max_body_size(),
        artwork_cache_size: default_artwork_cache_size(),
        proxy_timeout_secs: default_proxy_timeout_secs(),
    }
}

fn default_max_body_size() -> usize {
    16 * 1024 * 1024
}

fn default_artwork_cache_size() -> usize {
    64
}

fn default_proxy_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            api: default_api(),
        }
    }
}
