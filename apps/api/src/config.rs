use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

/// Which persistence backend the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local state, lost on restart. Useful for demos and local runs.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("Unknown STORE_BACKEND '{other}' (expected postgres|memory)")),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    /// Required only for the Postgres backend.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Loads migrations from this directory instead of the embedded set.
    pub migrations_dir: Option<String>,
    /// Laxity percentage used when a proposal request does not carry one.
    pub default_laxity: f64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend: StoreBackend = std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = match store_backend {
            StoreBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StoreBackend::Memory => std::env::var("DATABASE_URL").ok(),
        };

        Ok(Config {
            store_backend,
            database_url,
            db_max_connections: parse_env_or("DB_MAX_CONNECTIONS", 10)?,
            migrations_dir: std::env::var("MIGRATIONS_DIR").ok(),
            default_laxity: parse_env_or("DEFAULT_LAXITY", 0.0)?,
            port: parse_env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}
