//! Configuration module
//!
//! Loads configuration from environment variables.

use secrecy::Secret;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::jobs::RetentionConfig;
use crate::queue::ConsumerConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Secret used to sign access tokens
    pub jwt_secret: Secret<String>,

    /// Lifetime of an access token and its session
    pub token_ttl_minutes: i64,

    /// Comma-separated list of allowed CORS origins
    pub cors_allowed_origins: String,

    /// Payment edition queue subscription settings
    pub consumer: ConsumerConfig,

    /// Maintenance schedule and retention windows
    pub retention: RetentionConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::MissingEnv("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue("JWT_SECRET"));
        }

        let token_ttl_minutes: i64 = parse_or(&lookup, "TOKEN_TTL_MINUTES", 60)?;
        if token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_MINUTES"));
        }

        let queue = lookup("PAYMENTS_EDITION_QUEUE")
            .unwrap_or_else(|| "payments_edition_queue".to_string());

        let max_attempts: i32 = parse_or(&lookup, "QUEUE_MAX_ATTEMPTS", 5)?;
        if max_attempts < 1 {
            return Err(ConfigError::InvalidValue("QUEUE_MAX_ATTEMPTS"));
        }

        let batch_size: i64 = parse_or(&lookup, "QUEUE_BATCH_SIZE", 10)?;
        if batch_size < 1 {
            return Err(ConfigError::InvalidValue("QUEUE_BATCH_SIZE"));
        }

        let consumer = ConsumerConfig {
            queue,
            poll_interval: Duration::from_millis(parse_positive(
                &lookup,
                "QUEUE_POLL_INTERVAL_MS",
                500,
            )?),
            batch_size,
            max_attempts,
            visibility_timeout: Duration::from_secs(parse_positive(
                &lookup,
                "QUEUE_VISIBILITY_TIMEOUT_SECS",
                30,
            )?),
            retry_base: Duration::from_millis(parse_or(&lookup, "QUEUE_RETRY_BASE_MS", 1_000)?),
            retry_max: Duration::from_millis(parse_or(&lookup, "QUEUE_RETRY_MAX_MS", 60_000)?),
        };

        let hours = |key: &'static str, default: u64| -> Result<Duration, ConfigError> {
            let hours = parse_positive(&lookup, key, default)?;
            Ok(Duration::from_secs(hours.saturating_mul(3600)))
        };

        let retention = RetentionConfig {
            cleanup_interval: Duration::from_secs(parse_positive(
                &lookup,
                "CLEANUP_INTERVAL_SECS",
                3600,
            )?),
            sessions: hours("SESSION_RETENTION_HOURS", 24)?,
            edition_ledger: hours("EDITION_LEDGER_RETENTION_HOURS", 168)?,
            dead_letters: hours("DEAD_LETTER_RETENTION_HOURS", 336)?,
        };

        // A message redelivered after its ledger entry is purged would be applied twice
        if retention.edition_ledger <= consumer.redelivery_horizon() {
            return Err(ConfigError::InvalidValue("EDITION_LEDGER_RETENTION_HOURS"));
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 20)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            jwt_secret: Secret::new(jwt_secret),
            token_ttl_minutes,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            consumer,
            retention,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Like [`parse_or`], rejecting zero
fn parse_positive<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, key, default)? {
        0 => Err(ConfigError::InvalidValue(key)),
        value => Ok(value),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
