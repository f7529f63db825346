//! Delivery pipeline: authenticate, fetch, transform, decide freshness.
//!
//! # State Machine
//! ```text
//! Validated → Authenticated → Fetched → Transformed → { UpToDate | Delivered }
//!      └────────────┴──────────────┴──────────────┴──→ Failed
//! ```
//!
//! # Design Decisions
//! - Holds only shared, read-only collaborators; safe to share via Arc
//! - Any source failure is reported as `DatabaseNotFound`
//! - The up-to-date check runs after the whole payload has been hashed
//! - The payload reader is dropped (closed) on every exit path

use std::sync::Arc;
use std::time::SystemTime;

use flate2::Compression;

use crate::auth::Authenticator;
use crate::delivery::error::{DeliveryError, DeliveryResult};
use crate::delivery::request::UpdateRequest;
use crate::delivery::transform::{gzip_and_hash, Transformed};
use crate::storage::DatabaseSource;

/// A database ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Compressed payload and its uncompressed MD5.
    pub transformed: Transformed,
    /// Modification time reported by the source.
    pub modified: SystemTime,
}

/// Composes an authenticator and a database source.
#[derive(Clone)]
pub struct DeliveryPipeline {
    authenticator: Arc<dyn Authenticator>,
    source: Arc<dyn DatabaseSource>,
    compression: Compression,
}

impl DeliveryPipeline {
    pub fn new(authenticator: Arc<dyn Authenticator>, source: Arc<dyn DatabaseSource>) -> Self {
        Self {
            authenticator,
            source,
            compression: Compression::default(),
        }
    }

    /// Override the gzip level (0-9).
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    /// Run a validated request to a terminal state.
    pub async fn deliver(&self, request: &UpdateRequest) -> DeliveryResult<Delivery> {
        let credentials = &request.credentials;
        let edition_id = request.edition_id.as_str();

        self.authenticator.login(credentials).await?;

        let payload = match self
            .source
            .serve_mmdb(&credentials.account_id, edition_id, &request.client_hash)
            .await
        {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(edition_id, error = %e, "Database source failed");
                return Err(DeliveryError::DatabaseNotFound);
            }
        };
        let Some((reader, modified)) = payload.into_parts() else {
            return Err(DeliveryError::DatabaseNotFound);
        };

        let transformed = gzip_and_hash(reader, self.compression).await.map_err(|e| {
            tracing::error!(edition_id, error = %e, "Failed to compress database");
            DeliveryError::unclassified(e)
        })?;

        if transformed.matches(&request.client_hash) {
            return Err(DeliveryError::DatabaseUpToDate);
        }

        tracing::debug!(
            edition_id,
            md5 = %transformed.md5_hex(),
            uncompressed = transformed.uncompressed_len,
            compressed = transformed.gzipped.len(),
            "Database transformed"
        );

        Ok(Delivery {
            transformed,
            modified,
        })
    }
}

impl std::fmt::Debug for DeliveryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryPipeline")
            .field("compression", &self.compression.level())
            .finish_non_exhaustive()
    }
}
