//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! validated request
//!     → Authenticator::login(credentials)
//!     → Ok(())  : continue to the database source
//!     → Err(e)  : terminal, rendered with e's status
//! ```
//!
//! # Design Decisions
//! - Called only after hash and edition id validated
//! - No retries, caching or rate limiting here; those belong to implementations
//! - Implementations choose the error variant (401 by default)

pub mod accounts;

use async_trait::async_trait;

use crate::delivery::error::DeliveryResult;
use crate::delivery::request::Credentials;

pub use accounts::{AllowAll, StaticAccounts};

/// Decides whether an account may download databases.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> DeliveryResult<()>;
}
