//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the update server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Where requests outside the database mount are redirected.
    pub home_page: String,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Database storage settings.
    pub storage: StorageConfig,

    /// Account credentials.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_page: "https://github.com/OpenIPDB".to_string(),
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum requests handled at once (backpressure).
    pub max_concurrent_requests: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            tls: None,
            max_concurrent_requests: 1024,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    /// Databases are compressed per request, so this is generous.
    pub request_secs: u64,

    /// Time allowed for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 300,
            shutdown_grace_secs: 30,
        }
    }
}

/// Database storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `<edition>.mmdb` files.
    pub databases_dir: PathBuf,

    /// Gzip level 0-9.
    pub compression_level: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            databases_dir: PathBuf::from("databases"),
            compression_level: 6,
        }
    }
}

/// Authentication configuration. No accounts means every request is accepted.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub accounts: Vec<AccountConfig>,
}

/// A single account with its license key.
#[derive(Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    pub account_id: String,
    pub license_key: String,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.home_page, "https://github.com/OpenIPDB");
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert_eq!(config.storage.databases_dir, PathBuf::from("databases"));
        assert!(config.auth.accounts.is_empty());
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_config() {
        let config: ServerConfig = toml::from_str(
            r#"
            home_page = "https://example.com/"

            [listener]
            bind_address = "0.0.0.0:443"
            tls = { cert_path = "cert.pem", key_path = "key.pem" }

            [storage]
            databases_dir = "/var/lib/mmdb"
            compression_level = 9

            [[auth.accounts]]
            account_id = "42"
            license_key = "abc"

            [observability]
            log_format = "json"
            metrics_enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.home_page, "https://example.com/");
        assert_eq!(config.listener.tls.as_ref().unwrap().key_path, "key.pem");
        assert_eq!(config.listener.max_concurrent_requests, 1024);
        assert_eq!(config.storage.compression_level, 9);
        assert_eq!(config.auth.accounts.len(), 1);
        assert_eq!(config.auth.accounts[0].account_id, "42");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn test_account_debug_hides_key() {
        let account = AccountConfig {
            account_id: "42".into(),
            license_key: "very-secret".into(),
        };
        assert!(!format!("{:?}", account).contains("very-secret"));
    }
}
