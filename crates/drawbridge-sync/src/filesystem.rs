//! Async filesystem adapter for the local cache port
//!
//! Writes go through a sibling temp file plus rename so a crashed write
//! never leaves a torn working copy for an editor to pick up.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use drawbridge_core::ports::local_cache::{CacheFileState, ILocalCache};

/// `ILocalCache` over `tokio::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheFs;

impl CacheFs {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ILocalCache for CacheFs {
    async fn stat(&self, path: &Path) -> Result<CacheFileState> {
        match tokio::fs::metadata(path).await {
            Ok(metadata) => {
                let modified = metadata
                    .modified()
                    .ok()
                    .map(DateTime::<Utc>::from);
                Ok(CacheFileState {
                    exists: true,
                    modified,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(CacheFileState::not_found())
            }
            Err(e) => {
                Err(anyhow::Error::new(e).context(format!("Failed to stat {}", path.display())))
            }
        }
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = path.with_extension("drawbridge-tmp");
        tokio::fs::write(&tmp, data)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to move into place {}", path.display()))?;
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to delete {}", path.display()))
    }
}
