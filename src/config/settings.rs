//! Process settings read from the environment (after `dotenvy`).

use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_PREFIX: &str = "/api/batching";

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub config_path: PathBuf,
    pub bind_addr: String,
    /// Route prefix the batching endpoints are nested under.
    pub prefix: String,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Validation(format!("DB_MAX_CONNECTIONS must be an integer, got {}", v)))?,
            None => 5,
        };
        let prefix = get("BATCHING_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.into());
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!("BATCHING_PREFIX must start with '/', got {}", prefix)));
        }
        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/batching".into()),
            config_path: get("BATCHING_CONFIG").unwrap_or_else(|| "batching.json".into()).into(),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            prefix: prefix.trim_end_matches('/').to_string(),
            max_connections,
        })
    }
}
