//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;

use lookalike_core::{DetectorConfig, Thresholds, DEFAULT_KEY_PREFIX, DEFAULT_SIGNATURE_LEN};

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 1)
    pub body_limit_mb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// PostgreSQL connection string. In-memory store when unset.
    pub database_url: Option<String>,
    /// Database connection pool maximum connections (default: 20)
    pub database_max_connections: u32,
    /// Signature length N (default: 128)
    pub signature_len: usize,
    /// Maximum structural Hamming distance (default: 5)
    pub max_hamming_distance: u32,
    /// Minimum signature similarity (default: 0.2)
    pub min_jaccard_similarity: f64,
    /// Key prefix of the persisted keyspace (default: "lookalike")
    pub key_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 1,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            database_url: None,
            database_max_connections: 20,
            signature_len: DEFAULT_SIGNATURE_LEN,
            max_hamming_distance: thresholds.max_hamming,
            min_jaccard_similarity: thresholds.min_jaccard,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = parse_env("PORT").unwrap_or(defaults.port);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Self {
            port,
            host,
            allowed_origins,
            body_limit_mb: parse_env("BODY_LIMIT_MB").unwrap_or(defaults.body_limit_mb),
            timeout_secs: parse_env("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: parse_env("RATE_LIMIT_PER_SEC")
                .unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: parse_env("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            database_url,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            signature_len: parse_env("SIGNATURE_LEN").unwrap_or(defaults.signature_len),
            max_hamming_distance: parse_env("MAX_HAMMING_DISTANCE")
                .unwrap_or(defaults.max_hamming_distance),
            min_jaccard_similarity: parse_env("MIN_JACCARD_SIMILARITY")
                .unwrap_or(defaults.min_jaccard_similarity),
            key_prefix: std::env::var("KEY_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Detector parameters carried by this configuration.
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            signature_len: self.signature_len,
            thresholds: Thresholds {
                max_hamming: self.max_hamming_distance,
                min_jaccard: self.min_jaccard_similarity,
            },
            key_prefix: self.key_prefix.clone(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
