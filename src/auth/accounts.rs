//! Built-in authenticators.

use std::collections::HashMap;

use async_trait::async_trait;
use subtle::ConstantTimeEq;

use crate::auth::Authenticator;
use crate::config::AccountConfig;
use crate::delivery::error::{DeliveryError, DeliveryResult};
use crate::delivery::request::Credentials;

/// Accepts every request, including anonymous ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authenticator for AllowAll {
    async fn login(&self, _credentials: &Credentials) -> DeliveryResult<()> {
        Ok(())
    }
}

/// Fixed account table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticAccounts {
    keys: HashMap<String, String>,
}

impl StaticAccounts {
    pub fn new(accounts: &[AccountConfig]) -> Self {
        let keys = accounts
            .iter()
            .map(|a| (a.account_id.clone(), a.license_key.clone()))
            .collect();
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticAccounts {
    async fn login(&self, credentials: &Credentials) -> DeliveryResult<()> {
        match self.keys.get(&credentials.account_id) {
            Some(key) if constant_time_eq(key.as_bytes(), credentials.license_key.as_bytes()) => Ok(()),
            _ => {
                tracing::debug!(account_id = %credentials.account_id, "Login rejected");
                Err(DeliveryError::unauthorized())
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
