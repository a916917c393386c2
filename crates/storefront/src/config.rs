//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AROMISTA_API_URL` - Base URL of the Aromista REST API
//! - `AROMISTA_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `AROMISTA_HOST` - Bind address (default: 127.0.0.1)
//! - `AROMISTA_PORT` - Listen port (default: 3000)
//! - `AROMISTA_API_TIMEOUT_SECS` - REST API request timeout (default: 15)
//! - `AROMISTA_MENU_CACHE_SECS` - Customer menu cache TTL (default: 60)
//! - `AROMISTA_BARISTA_POLL_SECS` - Barista board refresh interval (default: 20)
//! - `AROMISTA_STATIC_DIR` - Static assets directory (default: crates/storefront/static)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Directory served under `/static`
    pub static_dir: String,
    /// REST API configuration
    pub api: ApiConfig,
    /// How often the barista board re-polls for orders
    pub barista_poll: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced by Sentry
    pub sentry_traces_sample_rate: f32,
}

/// REST API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every API path is appended to
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// TTL of the cached customer menu
    pub menu_cache_ttl: Duration,
}

impl ApiConfig {
    /// Configuration with default timeouts for the given API base URL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(15),
            menu_cache_ttl: Duration::from_secs(60),
        }
    }
}

impl StorefrontConfig {
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

        let host = parse_env_or_default::<IpAddr>("AROMISTA_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("AROMISTA_PORT", "3000")?;
        let base_url = get_required_env("AROMISTA_BASE_URL")?;
        let static_dir = get_env_or_default("AROMISTA_STATIC_DIR", "crates/storefront/static");

        let api = ApiConfig {
            base_url: parse_url("AROMISTA_API_URL", &get_required_env("AROMISTA_API_URL")?)?,
            timeout: Duration::from_secs(parse_env_or_default("AROMISTA_API_TIMEOUT_SECS", "15")?),
            menu_cache_ttl: Duration::from_secs(parse_env_or_default(
                "AROMISTA_MENU_CACHE_SECS",
                "60",
            )?),
        };

        let barista_poll_secs: u64 = parse_env_or_default("AROMISTA_BARISTA_POLL_SECS", "20")?;
        if barista_poll_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "AROMISTA_BARISTA_POLL_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            static_dir,
            api,
            barista_poll: Duration::from_secs(barista_poll_secs),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Configuration for a local instance talking to `api_url`.
    ///
    /// Binds to an ephemeral loopback port; used by tests and local tooling.
    #[must_use]
    pub fn local(api_url: Url) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://127.0.0.1:3000".to_string(),
            static_dir: "crates/storefront/static".to_string(),
            api: ApiConfig::new(api_url),
            barista_poll: Duration::from_secs(20),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an absolute http(s) URL.
fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_reports_variable_name() {
        let err = parse_value::<u16>("AROMISTA_PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "AROMISTA_PORT"));

        let port: u16 = parse_value("AROMISTA_PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_url_requires_http() {
        assert!(parse_url("AROMISTA_API_URL", "http://localhost:5000/api").is_ok());
        assert!(parse_url("AROMISTA_API_URL", "ftp://example.com").is_err());
        assert!(parse_url("AROMISTA_API_URL", "not a url").is_err());
    }

    #[test]
    fn test_local_config() {
        let config = StorefrontConfig::local(Url::parse("http://127.0.0.1:5000").unwrap());
        assert_eq!(config.socket_addr().port(), 0);
        assert!(!config.is_secure());
        assert_eq!(config.api.timeout, Duration::from_secs(15));
        assert_eq!(config.barista_poll, Duration::from_secs(20));
    }
}
