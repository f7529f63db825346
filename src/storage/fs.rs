//! Filesystem-backed database source.
//!
//! Serves `<databases_dir>/<edition_id>.mmdb` with the file's mtime.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::delivery::error::{DeliveryError, DeliveryResult};
use crate::delivery::request::ClientHash;
use crate::storage::{DatabasePayload, DatabaseSource};

/// File extension of served databases.
pub const MMDB_EXTENSION: &str = "mmdb";

/// Looks up databases in a single flat directory.
#[derive(Debug, Clone)]
pub struct FsDatabaseSource {
    root: PathBuf,
}

impl FsDatabaseSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for an edition, or `None` if the id could leave the directory.
    pub fn database_path(&self, edition_id: &str) -> Option<PathBuf> {
        if !is_safe_edition_id(edition_id) {
            return None;
        }
        Some(self.root.join(format!("{}.{}", edition_id, MMDB_EXTENSION)))
    }
}

fn is_safe_edition_id(edition_id: &str) -> bool {
    !edition_id.is_empty()
        && edition_id != "."
        && !edition_id.contains("..")
        && !edition_id.contains(['/', '\\', '\0'])
}

#[async_trait]
impl DatabaseSource for FsDatabaseSource {
    async fn serve_mmdb(
        &self,
        account_id: &str,
        edition_id: &str,
        _client_hash: &ClientHash,
    ) -> DeliveryResult<DatabasePayload> {
        let Some(path) = self.database_path(edition_id) else {
            tracing::warn!(account_id, edition_id, "Rejected unsafe edition id");
            return Ok(DatabasePayload::missing());
        };

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Database not available");
                return Err(DeliveryError::DatabaseNotFound);
            }
        };

        let metadata = file.metadata().await.map_err(|_| DeliveryError::DatabaseNotFound)?;
        if !metadata.is_file() {
            return Err(DeliveryError::DatabaseNotFound);
        }
        let modified = metadata.modified().map_err(DeliveryError::unclassified)?;

        Ok(DatabasePayload::new(file, modified))
    }
}
