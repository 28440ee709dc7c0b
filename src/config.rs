//! Environment configuration.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Where session carts live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionBackend {
    /// Process memory; carts vanish on restart.
    #[default]
    Memory,
    Postgres,
}

impl FromStr for SessionBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" | "db" => Ok(Self::Postgres),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub session_cookie_name: String,
    pub session_ttl: Duration,
    pub session_backend: SessionBackend,
    pub nats_url: Option<String>,
    pub db_max_connections: u32,
    pub db_health_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            port: parsed(&get, "PORT", 3000)?,
            session_cookie_name: get("SESSION_COOKIE_NAME").unwrap_or_else(|| "clima.sid".to_string()),
            session_ttl: Duration::from_secs(parsed::<u64>(&get, "SESSION_TTL_HOURS", 24)?.saturating_mul(3600)),
            session_backend: parsed(&get, "SESSION_BACKEND", SessionBackend::Memory)?,
            nats_url: get("NATS_URL"),
            db_max_connections: parsed(&get, "DB_MAX_CONNECTIONS", 10)?,
            db_health_interval: Duration::from_secs(parsed::<u64>(&get, "DB_HEALTH_INTERVAL_SECS", 5)?.max(1)),
        })
    }
}

fn parsed<T: FromStr>(get: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match get(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}
