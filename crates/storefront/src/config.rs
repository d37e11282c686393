//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Checkout (required together, only when placing orders)
//! - `BLOOM_SUPABASE_URL` - Hosted database project URL (e.g., https://xyz.supabase.co)
//! - `BLOOM_SUPABASE_ANON_KEY` - Project anon key (high entropy, never a placeholder)
//!
//! ## Optional
//! - `BLOOM_ORDER_FUNCTION` - Order-creation remote procedure (default: `create_order`)
//! - `BLOOM_HTTP_TIMEOUT_SECS` - Request timeout for remote calls (default: 30)
//! - `BLOOM_CART_DIR` - Directory holding the persisted cart (default: `.bloom`)
//! - `BLOOM_CART_KEY` - Storage key of the persisted cart (default: `cart-storage`)
//! - `BLOOM_LOG_FORMAT` - `pretty` or `json` (default: `pretty`)
//! - `RUST_LOG` - Log filter, see [`crate::telemetry`]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::cart::DEFAULT_STORAGE_KEY;
use crate::telemetry::LogFormat;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
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

/// Application configuration.
#[derive(Debug, Clone)]
pub struct BloomConfig {
    /// Where the cart is persisted
    pub cart: CartConfig,
    /// Order backend, present when `BLOOM_SUPABASE_URL` is set
    pub supabase: Option<SupabaseConfig>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Persisted cart location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Storage directory
    pub dir: PathBuf,
    /// Storage key
    pub key: String,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".bloom"),
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// Hosted database configuration.
///
/// Implements `Debug` manually to redact the anon key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL
    pub url: Url,
    /// Project anon key
    pub anon_key: SecretString,
    /// Name of the order-creation remote procedure
    pub order_function: String,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("order_function", &self.order_function)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BloomConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, if only half of the
    /// checkout settings are present, or if the anon key fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`BloomConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let cart = CartConfig {
            dir: PathBuf::from(vars.or_default("BLOOM_CART_DIR", ".bloom")),
            key: vars.or_default("BLOOM_CART_KEY", DEFAULT_STORAGE_KEY),
        };

        let log_format = vars
            .or_default("BLOOM_LOG_FORMAT", "pretty")
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::InvalidEnvVar("BLOOM_LOG_FORMAT".to_string(), e))?;

        let supabase = match vars.optional("BLOOM_SUPABASE_URL") {
            Some(url) => Some(SupabaseConfig::from_vars(&vars, &url)?),
            None => None,
        };

        Ok(Self {
            cart,
            supabase,
            log_format,
        })
    }

    /// Order backend configuration, required for checkout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if checkout is not configured.
    pub fn require_supabase(&self) -> Result<&SupabaseConfig, ConfigError> {
        self.supabase
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("BLOOM_SUPABASE_URL".to_string()))
    }
}

impl SupabaseConfig {
    fn from_vars<F: Fn(&str) -> Option<String>>(
        vars: &Vars<'_, F>,
        url: &str,
    ) -> Result<Self, ConfigError> {
        let url = Url::parse(url).map_err(|e| {
            ConfigError::InvalidEnvVar("BLOOM_SUPABASE_URL".to_string(), e.to_string())
        })?;

        let anon_key = vars.required("BLOOM_SUPABASE_ANON_KEY")?;
        validate_secret_strength(&anon_key, "BLOOM_SUPABASE_ANON_KEY")?;

        let timeout_secs = vars
            .or_default("BLOOM_HTTP_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BLOOM_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            url,
            anon_key: SecretString::from(anon_key),
            order_function: vars.or_default("BLOOM_ORDER_FUNCTION", "create_order"),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Expose the anon key, e.g. for building request headers.
    #[must_use]
    pub fn anon_key(&self) -> &str {
        self.anon_key.expose_secret()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source with the usual required/optional/default accessors.
struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
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

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
