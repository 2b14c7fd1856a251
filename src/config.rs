use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub entry: EntryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL; in-memory collaborators are used when unset.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Upper bound for mapping and supplier lookups.
    pub lookup_timeout_secs: u64,
    /// Upper bound for handing an entry to the stock store.
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,
    /// When set, every submitted entry is also written here as CSV.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

impl EntryConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}

fn default_submit_timeout_secs() -> u64 {
    30
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_secs: 10,
            submit_timeout_secs: default_submit_timeout_secs(),
            export_dir: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig::default(),
            entry: EntryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads defaults, then `nfe-entry.{toml,yaml,json}` if present, then
    /// `NFE_ENTRY__SECTION__KEY` variables. The plain `DATABASE_URL`,
    /// `SERVER_HOST` and `SERVER_PORT` variables win over everything.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port as i64)?
            .set_default("entry.lookup_timeout_secs", defaults.entry.lookup_timeout_secs as i64)?
            .set_default("entry.submit_timeout_secs", defaults.entry.submit_timeout_secs as i64)?
            .add_source(File::with_name("nfe-entry").required(false))
            .add_source(
                Environment::with_prefix("NFE_ENTRY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option(
                "server.port",
                std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse::<i64>().ok()),
            )?
            .build()?
            .try_deserialize()
    }
}
