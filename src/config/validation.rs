//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//! - Detect duplicate accounts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}': not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid home_page '{0}': must be an absolute http(s) URL")]
    InvalidHomePage(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("storage.compression_level {0} is out of range 0-9")]
    CompressionLevel(u32),

    #[error("listener.tls.{0} must not be empty")]
    EmptyTlsPath(&'static str),

    #[error("auth.accounts[{0}] has an empty account_id")]
    EmptyAccountId(usize),

    #[error("auth.accounts has duplicate account_id '{0}'")]
    DuplicateAccount(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_concurrent_requests == 0 {
        errors.push(ValidationError::Zero("listener.max_concurrent_requests"));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("cert_path"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::EmptyTlsPath("key_path"));
        }
    }

    match url::Url::parse(&config.home_page) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidHomePage(config.home_page.clone())),
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.storage.compression_level > 9 {
        errors.push(ValidationError::CompressionLevel(config.storage.compression_level));
    }

    let mut seen = HashSet::new();
    for (i, account) in config.auth.accounts.iter().enumerate() {
        if account.account_id.is_empty() {
            errors.push(ValidationError::EmptyAccountId(i));
        } else if !seen.insert(account.account_id.as_str()) {
            errors.push(ValidationError::DuplicateAccount(account.account_id.clone()));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{AccountConfig, TlsConfig};

    fn account(id: &str) -> AccountConfig {
        AccountConfig {
            account_id: id.into(),
            license_key: "k".into(),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.home_page = "ftp://example.com".into();
        config.timeouts.request_secs = 0;
        config.storage.compression_level = 11;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidHomePage("ftp://example.com".into())));
        assert!(errors.contains(&ValidationError::Zero("timeouts.request_secs")));
        assert!(errors.contains(&ValidationError::CompressionLevel(11)));
    }

    #[test]
    fn test_relative_home_page_rejected() {
        let mut config = ServerConfig::default();
        config.home_page = "/home".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidHomePage("/home".into())])
        );
    }

    #[test]
    fn test_accounts() {
        let mut config = ServerConfig::default();
        config.auth.accounts = vec![account("1"), account(""), account("1")];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyAccountId(1),
                ValidationError::DuplicateAccount("1".into()),
            ]
        );
    }

    #[test]
    fn test_tls_and_metrics() {
        let mut config = ServerConfig::default();
        config.listener.tls = Some(TlsConfig {
            cert_path: "cert.pem".into(),
            key_path: " ".into(),
        });
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::EmptyTlsPath("key_path")));
        assert_eq!(
            errors[1].to_string(),
            "invalid observability.metrics_address 'nowhere': not a socket address"
        );
    }
}
