use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::matching::scoring::{ScoringPolicy, DEFAULT_CURRENT_YEAR};

/// Application configuration loaded from environment variables.
/// Startup fails if a variable is set to a malformed value.
#[derive(Debug, Clone)]
pub struct Config {
    /// The in-process store is used when unset.
    pub database_url: Option<String>,
    /// Response caching is disabled when unset.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub db_max_connections: u32,
    pub cache_ttl: Duration,
    pub scoring: ScoringPolicy,
    pub seed_demo_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            db_max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            cache_ttl: Duration::from_secs(parse_env("CACHE_TTL_SECS", 1)?),
            scoring: ScoringPolicy {
                current_year: parse_env("SCORING_CURRENT_YEAR", DEFAULT_CURRENT_YEAR)?,
            },
            seed_demo_data: parse_env("SEED_DEMO_DATA", false)?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            database_url: None,
            redis_url: None,
            port: 0,
            rust_log: "debug".to_string(),
            db_max_connections: 1,
            cache_ttl: Duration::from_secs(1),
            scoring: ScoringPolicy::default(),
            seed_demo_data: false,
        }
    }
}

/// Unset and empty variables both read as `None`.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Reads and parses `key`, falling back to `default` when it is unset.
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'"))
}
