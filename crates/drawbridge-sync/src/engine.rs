//! Watch engine - periodic prune and sync passes over the watch set
//!
//! Two independent periodic tasks run against the shared [`WatchSet`]:
//!
//! - the **sync** task (fine interval) pushes entries whose working copy
//!   changed since the last push,
//! - the **prune** task (coarse interval) drops entries whose editor is
//!   no longer open.
//!
//! Both are spawned by [`WatchEngine::start`] and stopped as a unit by
//! [`WatchEngine::shutdown`] via one `CancellationToken`: an in-flight
//! pass finishes, no further pass starts.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use drawbridge_core::domain::errors::EngineError;
use drawbridge_core::domain::node::FileNode;
use drawbridge_core::ports::frontend::{IEditorVisibility, IRefreshSink};
use drawbridge_core::ports::local_cache::ILocalCache;
use drawbridge_store::session::Session;

use crate::cache_sync::CacheSync;
use crate::watch::WatchSet;

/// Outcome of one sync pass, for logging and observability
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncPassResult {
    /// Entries whose working copy was uploaded
    pub pushed: usize,
    /// Entries skipped because a push was already in flight
    pub skipped: usize,
    /// Entries whose push failed
    pub errors: usize,
}

/// Drives the watch set: opens artifacts, prunes, syncs, shuts down
pub struct WatchEngine {
    session: Arc<RwLock<Session>>,
    cache_sync: Arc<CacheSync>,
    cache: Arc<dyn ILocalCache>,
    watches: Arc<WatchSet>,
    visibility: Arc<dyn IEditorVisibility>,
    refresh: Arc<dyn IRefreshSink>,
    /// Selection epoch the current watch set belongs to
    seen_epoch: AtomicU64,
    sync_interval: Duration,
    prune_interval: Duration,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WatchEngine {
    pub fn new(
        session: Arc<RwLock<Session>>,
        cache_sync: Arc<CacheSync>,
        cache: Arc<dyn ILocalCache>,
        visibility: Arc<dyn IEditorVisibility>,
        refresh: Arc<dyn IRefreshSink>,
        sync_interval: Duration,
        prune_interval: Duration,
    ) -> Self {
        Self {
            session,
            cache_sync,
            cache,
            watches: Arc::new(WatchSet::new()),
            visibility,
            refresh,
            seen_epoch: AtomicU64::new(0),
            sync_interval,
            prune_interval,
            shutdown: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// The shared watch set (read-only observation: progress, counts)
    #[must_use]
    pub fn watches(&self) -> &WatchSet {
        &self.watches
    }

    /// Opens an artifact: resolves a fresh working copy and starts
    /// watching it
    ///
    /// Returns the local path for handing to the editor.
    #[instrument(skip(self), fields(key = %file.object_key()))]
    pub async fn open(&self, file: &FileNode) -> Result<PathBuf, EngineError> {
        self.reconcile_selection().await;
        let path = self.cache_sync.resolve(file).await?;
        self.watches
            .insert(path.to_string_lossy().into_owned(), file.clone());
        info!(path = %path.display(), "Watching artifact");
        self.refresh.refresh();
        Ok(path)
    }

    /// Drops every watch unconditionally
    pub fn clear_watches(&self) {
        self.watches.clear();
    }

    /// Drops the watch set if the session selection moved since it was
    /// built
    ///
    /// Entries are keyed by paths of the selection that opened them; after
    /// a switch they would be pushed under the new selection, so they must
    /// never survive one.
    async fn reconcile_selection(&self) {
        let epoch = self.session.read().await.selection_epoch();
        if self.seen_epoch.swap(epoch, Ordering::SeqCst) != epoch && !self.watches.is_empty() {
            debug!("Selection changed, dropping watch set");
            self.watches.clear();
        }
    }

    // ========================================================================
    // Passes
    // ========================================================================

    /// Drops watches whose artifact no longer has an open editor
    pub fn prune_pass(&self) {
        let open = self.visibility.open_artifact_ids();
        let before = self.watches.len();
        self.watches.retain_ids(|id| open.contains(id));
        let dropped = before - self.watches.len();
        if dropped > 0 {
            debug!(dropped, "Pruned closed artifacts");
            self.refresh.refresh();
        }
    }

    /// Pushes every watched entry whose working copy changed
    ///
    /// Per entry: a local mtime strictly newer than `last_synced` triggers
    /// a push, unless the entry's `syncing` flag is already held, in which
    /// case the entry is skipped for this pass. Failures are isolated to
    /// their entry.
    pub async fn sync_pass(&self) -> SyncPassResult {
        self.reconcile_selection().await;
        let mut result = SyncPassResult::default();

        for (id, entry) in self.watches.snapshot() {
            let path = Path::new(&id);
            let state = match self.cache.stat(path).await {
                Ok(state) => state,
                Err(e) => {
                    warn!(path = %id, error = %e, "Stat failed, skipping entry");
                    result.errors += 1;
                    continue;
                }
            };
            if !state.exists {
                continue;
            }
            let mtime = match state.modified {
                Some(mtime) if mtime > entry.last_synced => mtime,
                _ => continue,
            };

            if entry.syncing.swap(true, Ordering::SeqCst) {
                // A previous pass is still pushing this entry
                result.skipped += 1;
                continue;
            }

            let outcome = async {
                let content = self
                    .cache
                    .read(path)
                    .await
                    .map_err(|e| EngineError::local(path.to_path_buf(), e))?;
                self.cache_sync.push(&entry.node, &content).await
            }
            .await;

            entry.syncing.store(false, Ordering::SeqCst);

            match outcome {
                Ok(()) => {
                    self.watches.mark_synced(&id, mtime);
                    result.pushed += 1;
                }
                Err(e) => {
                    warn!(path = %id, error = %e, "Push failed");
                    result.errors += 1;
                }
            }
        }

        result
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Spawns the periodic sync and prune tasks
    ///
    /// Idempotent: calling on an already-started engine does nothing.
    pub fn start(self: &Arc<Self>) {
        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !tasks.is_empty() {
            return;
        }
        info!(
            sync_secs = self.sync_interval.as_secs(),
            prune_secs = self.prune_interval.as_secs(),
            "Starting watch engine"
        );

        let engine = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(engine.sync_interval);
            interval.tick().await;
            loop {
                tokio::select! {
                    () = engine.shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let result = engine.sync_pass().await;
                        if result != SyncPassResult::default() {
                            info!(
                                pushed = result.pushed,
                                skipped = result.skipped,
                                errors = result.errors,
                                "Sync pass finished"
                            );
                        }
                    }
                }
            }
            debug!("Sync task stopped");
        }));

        let engine = Arc::clone(self);
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(engine.prune_interval);
            interval.tick().await;
            loop {
                tokio::select! {
                    () = engine.shutdown.cancelled() => break,
                    _ = interval.tick() => engine.prune_pass(),
                }
            }
            debug!("Prune task stopped");
        }));
    }

    /// Stops both periodic tasks and waits for in-flight passes to finish
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = match self.tasks.lock() {
                Ok(tasks) => tasks,
                Err(poisoned) => poisoned.into_inner(),
            };
            tasks.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Watch task ended abnormally");
            }
        }
        info!("Watch engine stopped");
    }
}
