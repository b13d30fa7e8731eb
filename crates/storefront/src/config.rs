//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ROCKETSHOES_API_URL` - Base URL of the catalog/stock API
//!
//! ## Optional
//! - `ROCKETSHOES_API_TOKEN` - Bearer token for the API (validated, never logged)
//! - `ROCKETSHOES_STORAGE_DIR` - Directory for the cart store (default: .rocketshoes)
//! - `ROCKETSHOES_CART_KEY` - Key the cart snapshot is stored under (default: @RocketShoes:cart)
//! - `ROCKETSHOES_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `ROCKETSHOES_CATALOG_CACHE_TTL_SECS` - Catalog cache TTL (default: 300)
//! - `ROCKETSHOES_STRICT_SNAPSHOT` - Fail instead of starting empty when the
//!   stored snapshot is unreadable (default: false)

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::cart::LoadPolicy;

/// Default key the cart snapshot is stored under.
pub const DEFAULT_CART_KEY: &str = "@RocketShoes:cart";

const DEFAULT_STORAGE_DIR: &str = ".rocketshoes";
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "10";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Catalog/stock API configuration
    pub api: ApiConfig,
    /// Directory backing the file store
    pub storage_dir: PathBuf,
    /// Key the cart snapshot is stored under
    pub cart_key: String,
    /// How to treat an unreadable snapshot at startup
    pub load_policy: LoadPolicy,
}

/// Catalog/stock API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:3333`
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// How long catalog details stay cached
    pub catalog_cache_ttl: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Configuration with default timeouts and no token.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            request_timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(300),
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
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&|key: &str| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_source(&|key: &str| vars.get(key).cloned())
    }

    fn from_source(source: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(source);

        let api = ApiConfig {
            base_url: env.parse(
                "ROCKETSHOES_API_URL",
                &env.required("ROCKETSHOES_API_URL")?,
            )?,
            token: env.optional_validated_secret("ROCKETSHOES_API_TOKEN")?,
            request_timeout: Duration::from_secs(env.parse(
                "ROCKETSHOES_REQUEST_TIMEOUT_SECS",
                &env.or_default("ROCKETSHOES_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            )?),
            catalog_cache_ttl: Duration::from_secs(env.parse(
                "ROCKETSHOES_CATALOG_CACHE_TTL_SECS",
                &env.or_default(
                    "ROCKETSHOES_CATALOG_CACHE_TTL_SECS",
                    DEFAULT_CATALOG_CACHE_TTL_SECS,
                ),
            )?),
        };

        let strict = env.parse_bool("ROCKETSHOES_STRICT_SNAPSHOT")?;

        Ok(Self {
            api,
            storage_dir: PathBuf::from(env.or_default("ROCKETSHOES_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            cart_key: env.or_default("ROCKETSHOES_CART_KEY", DEFAULT_CART_KEY),
            load_policy: if strict {
                LoadPolicy::Strict
            } else {
                LoadPolicy::Lenient
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with typed accessors.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        (self.0)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a value, naming the variable on failure.
    fn parse<T>(&self, key: &str, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse an optional boolean flag, absent meaning `false`.
    fn parse_bool(&self, key: &str) -> Result<bool, ConfigError> {
        match (self.0)(key).as_deref().map(str::trim) {
            None | Some("") => Ok(false),
            Some(v) if ["1", "true", "yes", "on"].contains(&v.to_lowercase().as_str()) => Ok(true),
            Some(v) if ["0", "false", "no", "off"].contains(&v.to_lowercase().as_str()) => {
                Ok(false)
            }
            Some(v) => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{v}'"),
            )),
        }
    }

    /// Load and validate an optional secret.
    fn optional_validated_secret(&self, key: &str) -> Result<Option<SecretString>, ConfigError> {
        let Some(value) = (self.0)(key).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        validate_secret_strength(&value, key)?;
        Ok(Some(SecretString::from(value)))
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
    let len = s.len() as f64;
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

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real API tokens have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}
