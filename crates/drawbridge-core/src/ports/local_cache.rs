//! Local cache filesystem port (driven/secondary port)
//!
//! Interface for the local working-copy files under the cache root.
//! All failures are surfaced, never swallowed; callers decide what a
//! failed stat or write means for the operation in progress.

use std::path::Path;

use chrono::{DateTime, Utc};

/// Snapshot of a cached file's state
#[derive(Debug, Clone)]
pub struct CacheFileState {
    /// Whether the file exists on disk
    pub exists: bool,
    /// Last modification time (None if unavailable or the file is absent)
    pub modified: Option<DateTime<Utc>>,
}

impl CacheFileState {
    /// State for a path that does not exist
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            exists: false,
            modified: None,
        }
    }
}

/// Port trait for local cache file operations
///
/// Paths are absolute, resolved by the cache layout
/// (`cache_root/<target>/<bucket>/<object key>`).
#[async_trait::async_trait]
pub trait ILocalCache: Send + Sync {
    /// Stats a cached file
    ///
    /// Returns `CacheFileState::not_found()` for a missing path (not an
    /// error).
    async fn stat(&self, path: &Path) -> anyhow::Result<CacheFileState>;

    /// Reads the entire contents of a cached file
    async fn read(&self, path: &Path) -> anyhow::Result<Vec<u8>>;

    /// Writes a cached file, creating parent directories as needed
    async fn write(&self, path: &Path, data: &[u8]) -> anyhow::Result<()>;

    /// Deletes a cached file; deleting a missing file is an error
    async fn delete(&self, path: &Path) -> anyhow::Result<()>;
}
