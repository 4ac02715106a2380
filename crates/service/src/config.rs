//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STEWARD_API_URL` - Base URL of the Account Steward REST API
//! - `STEWARD_SERVICE_TOKEN` - Service account bearer token for the Account Steward
//!
//! ## Optional
//! - `STEWARD_LINK_HOST` - Bind address (default: 127.0.0.1)
//! - `STEWARD_LINK_PORT` - Listen port (default: 8080)
//! - `STEWARD_LINK_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; without either, local accounts are kept in memory)
//! - `STEWARD_LINK_REQUIRE_ACCOUNT` - Require a linked account on the message endpoint (default: false)
//! - `STEWARD_LINK_DEFAULT_DOMICILE` - Domicile used when an account has none (default: SK)
//! - `STEWARD_LINK_DEFAULT_LOCALE` - Locale used when an account has none
//!   (default: the default domicile's language)
//! - `STEWARD_LINK_ENTITY_CACHE_TTL_SECS` - Local account cache time-to-live (default: 3600)
//! - `STEWARD_TIMEOUT_SECS` - Account Steward request timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use steward_link_core::{Domicile, LanguageTag};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// `PostgreSQL` connection URL; `None` keeps local accounts in memory
    pub database_url: Option<SecretString>,
    /// Whether the message endpoint requires a linked local account
    pub require_account: bool,
    /// Fallbacks applied when reading a local account
    pub defaults: AccountDefaults,
    /// Time-to-live of cached local account entities
    pub entity_cache_ttl: Duration,
    /// Account Steward API configuration
    pub steward: StewardConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Process-wide defaults, resolved once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDefaults {
    /// Locale used when an account has no preferred language.
    pub locale: LanguageTag,
    /// Domicile used when an account has none.
    pub domicile: Domicile,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        let domicile = Domicile::default();
        Self {
            locale: domicile.language(),
            domicile,
        }
    }
}

/// Account Steward API configuration.
///
/// Implements `Debug` manually to redact the service token.
#[derive(Clone)]
pub struct StewardConfig {
    /// Base URL of the REST API (e.g., `https://steward.example.com/api/v1`)
    pub api_url: Url,
    /// Service account bearer token
    pub service_token: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for StewardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StewardConfig")
            .field("api_url", &self.api_url.as_str())
            .field("service_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the service token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_env(&env, "STEWARD_LINK_HOST", "127.0.0.1")?;
        let port = parse_env(&env, "STEWARD_LINK_PORT", "8080")?;
        let database_url = env("STEWARD_LINK_DATABASE_URL")
            .or_else(|| env("DATABASE_URL"))
            .map(SecretString::from);
        let require_account = parse_bool(&env, "STEWARD_LINK_REQUIRE_ACCOUNT")?;
        let defaults = AccountDefaults::from_lookup(&env)?;
        let ttl_secs: u64 = parse_env(&env, "STEWARD_LINK_ENTITY_CACHE_TTL_SECS", "3600")?;

        Ok(Self {
            host,
            port,
            database_url,
            require_account,
            defaults,
            entity_cache_ttl: Duration::from_secs(ttl_secs),
            steward: StewardConfig::from_lookup(&env)?,
            sentry_dsn: env("SENTRY_DSN"),
            sentry_environment: env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AccountDefaults {
    fn from_lookup(env: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let domicile: Domicile = parse_env(env, "STEWARD_LINK_DEFAULT_DOMICILE", "SK")?;
        let locale = match env("STEWARD_LINK_DEFAULT_LOCALE") {
            Some(value) => LanguageTag::parse(&value).map_err(|e| {
                ConfigError::InvalidEnvVar("STEWARD_LINK_DEFAULT_LOCALE".to_string(), e.to_string())
            })?,
            None => domicile.language(),
        };
        Ok(Self { locale, domicile })
    }
}

impl StewardConfig {
    fn from_lookup(env: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = get_required_env(env, "STEWARD_API_URL")?;
        let api_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STEWARD_API_URL".to_string(), e.to_string())
        })?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "STEWARD_API_URL".to_string(),
                format!("unsupported scheme '{}'", api_url.scheme()),
            ));
        }

        let token = get_required_env(env, "STEWARD_SERVICE_TOKEN")?;
        validate_secret_strength(&token, "STEWARD_SERVICE_TOKEN")?;

        let timeout_secs: u64 = parse_env(env, "STEWARD_TIMEOUT_SECS", "10")?;

        Ok(Self {
            api_url,
            service_token: SecretString::from(token),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    env(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an environment variable, falling back to a default literal.
fn parse_env<T>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = env(key).unwrap_or_else(|| default.to_string());
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an optional boolean flag (`true`/`false`, `1`/`0`, `yes`/`no`).
fn parse_bool(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, ConfigError> {
    let Some(value) = env(key) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued for the service account."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TOKEN: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("STEWARD_API_URL", "https://steward.test/api/v1"),
            ("STEWARD_SERVICE_TOKEN", TOKEN),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = ServiceConfig::from_lookup(lookup(&minimal())).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert!(config.database_url.is_none());
        assert!(!config.require_account);
        assert_eq!(config.defaults, AccountDefaults::default());
        assert_eq!(config.defaults.locale.as_str(), "sk");
        assert_eq!(config.entity_cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.steward.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_database_url_fallback() {
        let mut vars = minimal();
        vars.push(("DATABASE_URL", "postgres://localhost/link"));
        let config = ServiceConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(config.database_url.is_some());
    }

    #[test]
    fn test_default_locale_follows_domicile() {
        let mut vars = minimal();
        vars.push(("STEWARD_LINK_DEFAULT_DOMICILE", "cz"));
        let config = ServiceConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.defaults.domicile, Domicile::Cz);
        assert_eq!(config.defaults.locale.as_str(), "cs");

        vars.push(("STEWARD_LINK_DEFAULT_LOCALE", "en_GB"));
        let config = ServiceConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.defaults.locale.as_str(), "en-GB");
    }

    #[test]
    fn test_unsupported_default_domicile() {
        let mut vars = minimal();
        vars.push(("STEWARD_LINK_DEFAULT_DOMICILE", "XX"));
        let err = ServiceConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STEWARD_LINK_DEFAULT_DOMICILE"));
    }

    #[test]
    fn test_missing_steward_url() {
        let err = ServiceConfig::from_lookup(lookup(&[("STEWARD_SERVICE_TOKEN", TOKEN)]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "STEWARD_API_URL"));
    }

    #[test]
    fn test_steward_url_scheme() {
        let vars = [
            ("STEWARD_API_URL", "ftp://steward.test"),
            ("STEWARD_SERVICE_TOKEN", TOKEN),
        ];
        assert!(ServiceConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_parse_bool() {
        let env = lookup(&[("A", "TRUE"), ("B", "0"), ("C", "maybe")]);
        assert!(parse_bool(&env, "A").unwrap());
        assert!(!parse_bool(&env, "B").unwrap());
        assert!(!parse_bool(&env, "MISSING").unwrap());
        assert!(parse_bool(&env, "C").is_err());
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(TOKEN) > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-token-here", "T"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "T").is_err());
        assert!(validate_secret_strength(TOKEN, "T").is_ok());
    }

    #[test]
    fn test_steward_config_debug_redacts_token() {
        let config = ServiceConfig::from_lookup(lookup(&minimal())).unwrap();
        let debug_output = format!("{:?}", config.steward);

        assert!(debug_output.contains("steward.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(TOKEN));
    }
}
