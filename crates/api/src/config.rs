//! Process configuration loaded from the environment.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use afterschool_infra::{SeedMode, StoreConfig};
use afterschool_observability::LogFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read env file {path}: {reason}")]
    EnvFile { path: String, reason: String },
}

/// Runtime configuration for the API process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub store: StoreConfig,
    pub images_dir: PathBuf,
    /// Catalogue seeding at startup; `None` disables it.
    pub seed: Option<SeedMode>,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            store: StoreConfig::default(),
            images_dir: PathBuf::from("images"),
            seed: Some(SeedMode::Merge),
            log_format: LogFormat::Json,
        }
    }
}

impl AppConfig {
    /// Read `.env` from the working directory when present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Path::new(".env");
        if path.is_file() {
            Self::from_env_file(path)
        } else {
            Self::from_env()
        }
    }

    /// Read configuration from an env file. Process variables win over file entries.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let env_file_error = |e: dotenvy::Error| ConfigError::EnvFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let entries = dotenvy::from_path_iter(path)
            .map_err(env_file_error)?
            .collect::<Result<HashMap<String, String>, _>>()
            .map_err(env_file_error)?;

        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| entries.get(key).cloned()))
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(v) => parse_with("PORT", &v, |s| s.trim().parse::<u16>())?,
            None => defaults.port,
        };

        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => parse_with("DB_MAX_CONNECTIONS", &v, |s| {
                s.trim().parse::<u32>().map_err(|e| e.to_string()).and_then(|n| {
                    if n == 0 {
                        Err("must be at least 1".to_string())
                    } else {
                        Ok(n)
                    }
                })
            })?,
            None => defaults.store.max_connections,
        };

        let lock_timeout = match get("STORE_LOCK_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse_with("STORE_LOCK_TIMEOUT_MS", &v, |s| {
                s.trim().parse::<u64>()
            })?),
            None => defaults.store.lock_timeout,
        };

        let seed = match get("SEED_ON_START") {
            Some(v) if v.trim().eq_ignore_ascii_case("off") => None,
            Some(v) => Some(parse_with("SEED_ON_START", &v, |s| s.parse::<SeedMode>())?),
            None => defaults.seed,
        };

        let log_format = match get("LOG_FORMAT") {
            Some(v) => parse_with("LOG_FORMAT", &v, |s| s.parse::<LogFormat>())?,
            None => defaults.log_format,
        };

        Ok(Self {
            port,
            store: StoreConfig {
                database_url: get("DATABASE_URL"),
                max_connections,
                lock_timeout,
            },
            images_dir: get("IMAGES_DIR").map(PathBuf::from).unwrap_or(defaults.images_dir),
            seed,
            log_format,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_with<T, E, P>(var: &'static str, value: &str, parse: P) -> Result<T, ConfigError>
where
    P: FnOnce(&str) -> Result<T, E>,
    E: ToString,
{
    parse(value).map_err(|e| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
