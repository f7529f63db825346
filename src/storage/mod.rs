//! Database source subsystem.
//!
//! # Data Flow
//! ```text
//! validated, authenticated request (account, edition, client hash)
//!     → DatabaseSource::serve_mmdb
//!     → DatabasePayload { reader, modified }
//!     → delivery pipeline (gzip + md5)
//! ```
//!
//! # Design Decisions
//! - One capability, one operation: backings (filesystem, object store,
//!   database) plug in without touching the pipeline
//! - A payload with no reader or no timestamp means "not found"
//! - The client hash is passed through so a backing may skip expensive work

pub mod fs;

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::delivery::error::DeliveryResult;
use crate::delivery::request::ClientHash;

pub use fs::FsDatabaseSource;

/// Readable database bytes. Owned by the pipeline for one request.
pub type PayloadReader = Box<dyn AsyncRead + Send + Unpin>;

/// What a source hands back for one edition.
pub struct DatabasePayload {
    /// Database contents, if found.
    pub reader: Option<PayloadReader>,
    /// Last modification time, if known.
    pub modified: Option<SystemTime>,
}

impl DatabasePayload {
    /// A found database.
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static, modified: SystemTime) -> Self {
        Self {
            reader: Some(Box::new(reader)),
            modified: Some(modified),
        }
    }

    /// The "not found" payload.
    pub fn missing() -> Self {
        Self {
            reader: None,
            modified: None,
        }
    }

    /// Split into reader and timestamp, or `None` if either is absent.
    /// `UNIX_EPOCH` counts as an absent timestamp.
    pub fn into_parts(self) -> Option<(PayloadReader, SystemTime)> {
        let modified = self.modified.filter(|m| *m != UNIX_EPOCH)?;
        Some((self.reader?, modified))
    }
}

impl std::fmt::Debug for DatabasePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePayload")
            .field("reader", &self.reader.as_ref().map(|_| "..."))
            .field("modified", &self.modified)
            .finish()
    }
}

/// Supplies database bytes for an edition.
#[async_trait]
pub trait DatabaseSource: Send + Sync {
    async fn serve_mmdb(
        &self,
        account_id: &str,
        edition_id: &str,
        client_hash: &ClientHash,
    ) -> DeliveryResult<DatabasePayload>;
}
