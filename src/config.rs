use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Mongo,
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StorageKind::Mongo),
            "memory" => Ok(StorageKind::Memory),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageKind,
    pub mongodb_uri: Option<String>,
    pub database: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub cors_origin: Option<String>,
}

impl Config {
    /// Reads the configuration from the environment, loading a `.env` file
    /// first if there is one.
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded variables from .env");
        }

        let storage = try_load("SPLITLEDGER_STORAGE", "mongo")?;
        let mongodb_uri = env::var("MONGODB_URI").ok();
        if storage == StorageKind::Mongo && mongodb_uri.is_none() {
            return Err(ConfigError::Missing("MONGODB_URI"));
        }

        let session_secret =
            env::var("SESSION_SECRET").map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < 16 {
            return Err(ConfigError::Invalid {
                key: "SESSION_SECRET",
                reason: "must be at least 16 bytes long".into(),
            });
        }

        Ok(Config {
            host: try_load("SPLITLEDGER_HOST", "0.0.0.0")?,
            port: try_load("SPLITLEDGER_PORT", "8080")?,
            storage,
            mongodb_uri,
            database: try_load("SPLITLEDGER_DATABASE", "splitledger")?,
            session_secret,
            session_ttl_hours: try_load("SESSION_TTL_HOURS", "168")?,
            cors_origin: env::var("CORS_ORIGIN").ok(),
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}
