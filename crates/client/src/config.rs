//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKETPLACE_API_URL` - Base URL of the marketplace REST API
//!
//! ## Optional
//! - `MARKETPLACE_DATA_DIR` - Durable store directory (default: .marketplace)
//! - `MARKETPLACE_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `MARKETPLACE_NOTIFICATION_POLL_SECS` - Unread-count poll interval (default: 30)
//! - `MARKETPLACE_NOTIFICATION_LIMIT` - Notifications fetched per refresh (default: 20)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = ".marketplace";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_POLL_SECS: u64 = 30;
const DEFAULT_NOTIFICATION_LIMIT: u32 = 20;
const MAX_NOTIFICATION_LIMIT: u32 = 100;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Marketplace client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote API (always ends with `/`)
    pub api_url: Url,
    /// Directory backing the durable client store
    pub data_dir: PathBuf,
    /// Timeout applied to every outbound request
    pub http_timeout: Duration,
    /// Interval between unread-count polls while an admin is signed in
    pub notification_poll_interval: Duration,
    /// Number of notifications fetched by a list refresh
    pub notification_limit: u32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the API URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not an http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url("MARKETPLACE_API_URL", api_url)?,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            notification_poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            notification_limit: DEFAULT_NOTIFICATION_LIMIT,
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_env("MARKETPLACE_API_URL")?;
        let mut config = Self::new(&api_url)?;

        config.data_dir = PathBuf::from(get_env_or_default("MARKETPLACE_DATA_DIR", DEFAULT_DATA_DIR));
        config.http_timeout = Duration::from_secs(parse_positive(
            "MARKETPLACE_HTTP_TIMEOUT_SECS",
            &get_env_or_default(
                "MARKETPLACE_HTTP_TIMEOUT_SECS",
                &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
            ),
        )?);
        config.notification_poll_interval = Duration::from_secs(parse_positive(
            "MARKETPLACE_NOTIFICATION_POLL_SECS",
            &get_env_or_default(
                "MARKETPLACE_NOTIFICATION_POLL_SECS",
                &DEFAULT_POLL_SECS.to_string(),
            ),
        )?);
        config.notification_limit = parse_limit(&get_env_or_default(
            "MARKETPLACE_NOTIFICATION_LIMIT",
            &DEFAULT_NOTIFICATION_LIMIT.to_string(),
        ))?;
        config.sentry_dsn = get_optional_env("SENTRY_DSN");
        config.sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(config)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse the API base URL, normalizing it to end with a slash so that
/// relative endpoint paths join underneath it instead of replacing the last segment.
fn parse_api_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Parse a strictly positive integer.
fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    let value = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(value)
}

/// Parse the notification page size.
fn parse_limit(raw: &str) -> Result<u32, ConfigError> {
    let key = "MARKETPLACE_NOTIFICATION_LIMIT";
    let value = parse_positive(key, raw)?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_NOTIFICATION_LIMIT)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("must be at most {MAX_NOTIFICATION_LIMIT}"),
            )
        })
}
