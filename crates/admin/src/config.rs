//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPWRIGHT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SUPABASE_URL` - Supabase project URL (e.g., `https://abc.supabase.co`)
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service-role key for storage and auth admin (HIGH PRIVILEGE)
//!
//! ## Optional
//! - `SUPABASE_ANON_KEY` - Public anon key, sent as `apikey` when resolving sessions
//! - `PRODUCT_IMAGES_BUCKET` - Storage bucket for product images (default: product-images)
//! - `CATEGORY_IMAGES_BUCKET` - Storage bucket for category images (default: category-images)
//! - `LISTING_CACHE_TTL_SECS` - Listing cache TTL in seconds (default: 300)
//! - `LISTING_CACHE_CAPACITY` - Listing cache entry limit (default: 1000)
//! - `SHOPWRIGHT_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_PRODUCT_BUCKET: &str = crate::services::products::DEFAULT_BUCKET;
const DEFAULT_CATEGORY_BUCKET: &str = crate::services::categories::DEFAULT_BUCKET;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Supabase project access
    pub supabase: SupabaseConfig,
    /// Image bucket names
    pub buckets: BucketConfig,
    /// Listing cache sizing
    pub cache: CacheConfig,
    /// Emit JSON logs instead of human-readable output
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

/// Supabase project configuration.
///
/// Implements `Debug` manually to redact the keys.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project base URL
    pub url: Url,
    /// Service-role key (HIGH PRIVILEGE - bypasses row level security)
    pub service_role_key: SecretString,
    /// Public anon key
    pub anon_key: Option<SecretString>,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("service_role_key", &"[REDACTED]")
            .field("anon_key", &self.anon_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl SupabaseConfig {
    /// The key sent as `apikey` on user-scoped requests.
    #[must_use]
    pub fn public_key(&self) -> &SecretString {
        self.anon_key.as_ref().unwrap_or(&self.service_role_key)
    }
}

/// Storage bucket names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketConfig {
    pub product_images: String,
    pub category_images: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            product_images: DEFAULT_PRODUCT_BUCKET.to_string(),
            category_images: DEFAULT_CATEGORY_BUCKET.to_string(),
        }
    }
}

/// Listing cache sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the service-role key fails validation (placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env
            .optional("SHOPWRIGHT_DATABASE_URL")
            .or_else(|| env.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("SHOPWRIGHT_DATABASE_URL".to_string()))?;

        let supabase = SupabaseConfig::from_env(&env)?;
        let buckets = BucketConfig {
            product_images: env.or_default("PRODUCT_IMAGES_BUCKET", DEFAULT_PRODUCT_BUCKET),
            category_images: env.or_default("CATEGORY_IMAGES_BUCKET", DEFAULT_CATEGORY_BUCKET),
        };

        let ttl_secs = env.parsed("LISTING_CACHE_TTL_SECS", DEFAULT_TTL.as_secs())?;
        let capacity = env.parsed("LISTING_CACHE_CAPACITY", DEFAULT_CAPACITY)?;

        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            supabase,
            buckets,
            cache: CacheConfig {
                ttl: Duration::from_secs(ttl_secs),
                capacity,
            },
            log_json: env.optional("SHOPWRIGHT_LOG_JSON").is_some(),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
        })
    }
}

impl SupabaseConfig {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Self, ConfigError> {
        let raw_url = env.required("SUPABASE_URL")?;
        let url = Url::parse(raw_url.trim_end_matches('/'))
            .map_err(|e| ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "SUPABASE_URL".to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        let service_role_key = env.required("SUPABASE_SERVICE_ROLE_KEY")?;
        validate_secret_strength(&service_role_key, "SUPABASE_SERVICE_ROLE_KEY")?;

        Ok(Self {
            url,
            service_role_key: SecretString::from(service_role_key),
            anon_key: env.optional("SUPABASE_ANON_KEY").map(SecretString::from),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
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
            #[allow(clippy::cast_precision_loss)]
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key from the Supabase dashboard."
            ),
        ));
    }

    Ok(())
}

/// Expose a secret for use in an HTTP header.
pub(crate) fn bearer(secret: &SecretString) -> String {
    format!("Bearer {}", secret.expose_secret())
}
