//! Bucket catalog - list, create, and delete buckets on the current target
//!
//! Deletion purges the bucket first: every object is listed page by page
//! and deleted individually, then the empty bucket is removed. Compatible
//! stores disagree on batch-delete support, so the purge never uses it.
//! A mid-purge failure leaves a partially-emptied bucket; re-running the
//! delete resumes where it left off.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use drawbridge_core::domain::errors::EngineError;
use drawbridge_core::domain::newtypes::{BucketName, ObjectKey};
use drawbridge_core::ports::frontend::IRefreshSink;

use crate::session::Session;

/// Bucket-level operations against the current target
pub struct BucketCatalog {
    session: Arc<RwLock<Session>>,
    refresh: Arc<dyn IRefreshSink>,
}

impl BucketCatalog {
    pub fn new(session: Arc<RwLock<Session>>, refresh: Arc<dyn IRefreshSink>) -> Self {
        Self { session, refresh }
    }

    /// Lists the bucket names visible on the current target
    ///
    /// # Errors
    /// `NoTargetSelected` without a target selection.
    pub async fn list(&self) -> Result<Vec<String>, EngineError> {
        let store = self.session.write().await.connection()?;
        store
            .list_buckets()
            .await
            .map_err(|e| EngineError::remote("list_buckets", e))
    }

    /// Creates a bucket on the current target
    #[instrument(skip(self))]
    pub async fn create(&self, bucket: &BucketName) -> Result<(), EngineError> {
        let store = self.session.write().await.connection()?;
        store
            .create_bucket(bucket)
            .await
            .map_err(|e| EngineError::remote("create_bucket", e))?;
        info!(bucket = %bucket, "Bucket created");
        self.refresh.refresh();
        Ok(())
    }

    /// Purges and deletes a bucket on the current target
    ///
    /// Objects are deleted before the bucket, always; if the deleted
    /// bucket was the current selection, the selection clears.
    #[instrument(skip(self))]
    pub async fn delete(&self, bucket: &BucketName) -> Result<(), EngineError> {
        let store = self.session.write().await.connection()?;

        let mut continuation: Option<String> = None;
        let mut purged = 0usize;
        loop {
            let page = store
                .list_objects(bucket, "", None, continuation.take())
                .await
                .map_err(|e| EngineError::remote("list_objects", e))?;

            for entry in &page.entries {
                let key = ObjectKey::new(entry.key.clone())?;
                store
                    .delete_object(bucket, &key)
                    .await
                    .map_err(|e| EngineError::remote("delete_object", e))?;
                purged += 1;
            }

            match page.next_continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        store
            .delete_bucket(bucket)
            .await
            .map_err(|e| EngineError::remote("delete_bucket", e))?;
        info!(bucket = %bucket, purged, "Bucket purged and deleted");

        let mut session = self.session.write().await;
        if session.current_bucket() == Some(bucket) {
            warn!(bucket = %bucket, "Deleted the current bucket, clearing selection");
            session.clear_bucket();
        }
        drop(session);

        self.refresh.refresh();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
