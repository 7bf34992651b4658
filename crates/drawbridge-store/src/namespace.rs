//! Namespace listing - one level of the logical tree from a flat keyspace
//!
//! A delimiter listing at a directory's prefix yields exactly one tree
//! level: common prefixes become child directories, contents become child
//! files. The placeholder object whose key equals the prefix itself (and
//! any other key ending in the delimiter) is never surfaced as a file.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use drawbridge_core::domain::errors::EngineError;
use drawbridge_core::domain::node::{Directory, FileNode, LogicalNode};

use crate::session::Session;

/// Key delimiter separating logical path segments
const DELIMITER: &str = "/";

/// Lists logical children of directories in the current bucket
pub struct Namespace {
    session: Arc<RwLock<Session>>,
}

impl Namespace {
    pub fn new(session: Arc<RwLock<Session>>) -> Self {
        Self { session }
    }

    /// Lists the children of `parent` (None = bucket root)
    ///
    /// Directories come from common prefixes, files from contents;
    /// continuation tokens are followed so the level is always complete.
    ///
    /// # Errors
    /// `NoTargetSelected` / `NoBucketSelected` if the selection is
    /// incomplete; `Remote` on listing failure.
    #[instrument(skip_all, fields(parent = parent.map_or("<root>", |d| d.name())))]
    pub async fn list(
        &self,
        parent: Option<&Arc<Directory>>,
    ) -> Result<Vec<LogicalNode>, EngineError> {
        let (_, bucket, store) = self.session.write().await.current_context()?;

        let prefix = parent.map(|dir| dir.child_prefix()).unwrap_or_default();
        let mut children = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = store
                .list_objects(&bucket, &prefix, Some(DELIMITER), continuation.take())
                .await
                .map_err(|e| EngineError::remote("list_objects", e))?;

            for common in &page.common_prefixes {
                let name = common
                    .strip_prefix(&prefix)
                    .unwrap_or(common)
                    .trim_end_matches(DELIMITER);
                if name.is_empty() {
                    continue;
                }
                match Directory::new(name, parent.cloned()) {
                    Ok(dir) => children.push(LogicalNode::Directory(dir)),
                    Err(e) => warn!(prefix = %common, error = %e, "Skipping malformed prefix"),
                }
            }

            for entry in &page.entries {
                // The directory placeholder and any foreign `/`-suffixed
                // keys are structural, not content
                if entry.key == prefix || entry.key.ends_with(DELIMITER) {
                    continue;
                }
                let name = entry.key.strip_prefix(&prefix).unwrap_or(&entry.key);
                match FileNode::new(name, parent.cloned(), Some(entry.size)) {
                    Ok(file) => children.push(LogicalNode::File(file)),
                    Err(e) => warn!(key = %entry.key, error = %e, "Skipping malformed key"),
                }
            }

            match page.next_continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        debug!(count = children.len(), "Listed namespace level");
        Ok(children)
    }
}

// ============================================================================
// Tests
// ============================================================================
