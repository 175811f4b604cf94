//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AIZOME_DATABASE_URL` - `PostgreSQL` connection string of the hosted store
//!   (falls back to `DATABASE_URL`)
//! - `PLATFORM_URL` - Base URL of the hosted platform (auth + storage REST)
//! - `PLATFORM_ANON_KEY` - Public API key sent as the `apikey` header
//!
//! ## Optional
//! - `AIZOME_HOST` - Bind address (default: 127.0.0.1)
//! - `AIZOME_PORT` - Listen port (default: 3000)
//! - `AIZOME_BASE_URL` - Public URL of this API (default: <http://localhost:3000>)
//! - `PLATFORM_SERVICE_KEY` - Service-role key used for storage writes
//! - `PLATFORM_JWT_SECRET` - HS256 secret for local token verification
//! - `STORAGE_BUCKET` - Hosted storage bucket; local files are used when unset
//! - `UPLOAD_DIR` - Local upload directory (default: ./uploads)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated list of browser origins
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_JWT_SECRET_LENGTH: usize = 32;
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

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of this API
    pub base_url: String,
    /// Hosted platform configuration
    pub platform: PlatformConfig,
    /// File storage configuration
    pub storage: StorageConfig,
    /// Browser origins allowed by CORS (empty = same-origin only)
    pub cors_allowed_origins: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Hosted platform (auth + storage) configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct PlatformConfig {
    /// Platform base URL without trailing slash
    pub url: String,
    /// Public API key (safe to expose in browser)
    pub anon_key: String,
    /// Service-role key (server-side only)
    pub service_key: Option<SecretString>,
    /// HS256 secret used to verify access tokens locally
    pub jwt_secret: Option<SecretString>,
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("url", &self.url)
            .field("anon_key", &self.anon_key)
            .field("service_key", &self.service_key.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Where uploaded files live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Hosted storage bucket; `None` selects the local directory
    pub bucket: Option<String>,
    /// Local fallback directory
    pub upload_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("AIZOME_DATABASE_URL")?;
        let host = get_env_or_default("AIZOME_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("AIZOME_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("AIZOME_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("AIZOME_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("AIZOME_BASE_URL", "http://localhost:3000");

        let platform = PlatformConfig::from_env()?;
        let storage = StorageConfig {
            bucket: get_optional_env("STORAGE_BUCKET").filter(|b| !b.trim().is_empty()),
            upload_dir: PathBuf::from(get_env_or_default("UPLOAD_DIR", "./uploads")),
        };
        let cors_allowed_origins = parse_origins(&get_env_or_default("CORS_ALLOWED_ORIGINS", ""));

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            platform,
            storage,
            cors_allowed_origins,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
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

impl PlatformConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = normalize_platform_url(&get_required_env("PLATFORM_URL")?)?;
        let jwt_secret = match get_optional_env("PLATFORM_JWT_SECRET") {
            Some(value) => {
                let secret = SecretString::from(value);
                validate_jwt_secret(&secret, "PLATFORM_JWT_SECRET")?;
                Some(secret)
            }
            None => None,
        };

        Ok(Self {
            url,
            anon_key: get_required_env("PLATFORM_ANON_KEY")?,
            service_key: get_optional_env("PLATFORM_SERVICE_KEY").map(SecretString::from),
            jwt_secret,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a sample rate in `[0.0, 1.0]`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ));
    }
    Ok(rate)
}

/// Validate the platform URL and strip any trailing slash.
fn normalize_platform_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("PLATFORM_URL".to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "PLATFORM_URL".to_string(),
            "must be an http(s) URL with a host".to_string(),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Split a comma-separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .collect()
}

/// Validate that a JWT secret is long, not a placeholder, and high-entropy.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    validate_secret_strength(value, var_name)
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_rejects_placeholders() {
        let err = validate_secret_strength("your-jwt-secret-goes-here", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_jwt_secret() {
        let short = SecretString::from("aB3$xY9!");
        assert!(validate_jwt_secret(&short, "PLATFORM_JWT_SECRET").is_err());

        let flat = SecretString::from("a".repeat(40));
        assert!(validate_jwt_secret(&flat, "PLATFORM_JWT_SECRET").is_err());

        let good = SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        assert!(validate_jwt_secret(&good, "PLATFORM_JWT_SECRET").is_ok());
    }

    #[test]
    fn test_normalize_platform_url() {
        assert_eq!(
            normalize_platform_url("https://abc.platform.test/").unwrap(),
            "https://abc.platform.test"
        );
        assert!(normalize_platform_url("ftp://abc.platform.test").is_err());
        assert!(normalize_platform_url("not a url").is_err());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://a.test/ ,, http://b.test "),
            vec!["https://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_socket_addr_and_secure_flag() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://aizome.test".to_string(),
            platform: PlatformConfig {
                url: "https://platform.test".to_string(),
                anon_key: "anon".to_string(),
                service_key: None,
                jwt_secret: None,
            },
            storage: StorageConfig {
                bucket: None,
                upload_dir: PathBuf::from("./uploads"),
            },
            cors_allowed_origins: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(config.is_secure());
    }

    #[test]
    fn test_platform_config_debug_redacts_secrets() {
        let config = PlatformConfig {
            url: "https://platform.test".to_string(),
            anon_key: "anon_key_value".to_string(),
            service_key: Some(SecretString::from("super_secret_service_key")),
            jwt_secret: Some(SecretString::from("super_secret_jwt")),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("anon_key_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_service_key"));
        assert!(!debug_output.contains("super_secret_jwt"));
    }
}
