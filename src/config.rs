//! Environment-driven configuration.
//! The binary loads `.env` (dotenvy) before calling [`AppConfig::from_env`].

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/posts.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// Default credential; a per-request header overrides it.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Unset means no timeout: a hanging upstream call blocks its request.
    pub timeout: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub allowed_origin: String,
    pub body_limit_bytes: usize,
    pub gemini: GeminiConfig,
}

impl AppConfig {
    /// Read configuration from process environment, applying defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_raw = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let body_limit_bytes = match var("BODY_LIMIT_BYTES") {
            Some(s) => s.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                key: "BODY_LIMIT_BYTES",
                message: e.to_string(),
            })?,
            None => DEFAULT_BODY_LIMIT_BYTES,
        };

        let timeout = match var("GEMINI_TIMEOUT_SECS") {
            Some(s) => Some(Duration::from_secs(s.parse().map_err(
                |e: std::num::ParseIntError| ConfigError::Invalid {
                    key: "GEMINI_TIMEOUT_SECS",
                    message: e.to_string(),
                },
            )?)),
            None => None,
        };

        Ok(AppConfig {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_addr,
            allowed_origin: var("ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.into()),
            body_limit_bytes,
            gemini: GeminiConfig {
                api_key: var("GEMINI_API_KEY"),
                model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
                base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
                timeout,
            },
        })
    }
}

/// Pick the credential for one generator call.
/// A non-blank request value beats the configured default.
pub fn resolve_api_key(request: Option<&str>, default: Option<&str>) -> Option<String> {
    request
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| default.map(str::trim).filter(|s| !s.is_empty()))
        .map(str::to_string)
}
