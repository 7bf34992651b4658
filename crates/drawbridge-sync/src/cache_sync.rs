//! Cache synchronization - working copies kept fresh in both directions
//!
//! Layout: `cache_root/<target>/<bucket>/<object key>`, so switching
//! target or bucket never collides with another selection's copies.
//!
//! Freshness is decided by comparing the local file's mtime against the
//! remote object's `local-mtime` user-metadata field, which records the
//! uploader's local mtime in millis since epoch. Both sides of the
//! comparison therefore come from the same clock. An object without the
//! field has unknown freshness and the local copy wins.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use drawbridge_core::domain::errors::EngineError;
use drawbridge_core::domain::newtypes::{BucketName, ObjectKey, TargetName};
use drawbridge_core::domain::node::{Directory, FileNode};
use drawbridge_core::ports::frontend::IRefreshSink;
use drawbridge_core::ports::local_cache::ILocalCache;
use drawbridge_core::ports::object_store::ObjectMetadata;
use drawbridge_store::session::Session;

/// User-metadata field carrying the uploader's local mtime (millis since
/// epoch, decimal string)
pub const METADATA_LOCAL_MTIME: &str = "local-mtime";

fn remote_mtime(metadata: &ObjectMetadata) -> Option<DateTime<Utc>> {
    metadata
        .get(METADATA_LOCAL_MTIME)
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

fn mtime_metadata(mtime: DateTime<Utc>) -> ObjectMetadata {
    let mut metadata = ObjectMetadata::new();
    metadata.insert(
        METADATA_LOCAL_MTIME.to_string(),
        mtime.timestamp_millis().to_string(),
    );
    metadata
}

/// Canonical content of a freshly created diagram
fn empty_diagram() -> Vec<u8> {
    serde_json::json!({
        "type": "excalidraw",
        "version": 2,
        "source": "drawbridge",
        "elements": [],
        "appState": {},
        "files": {}
    })
    .to_string()
    .into_bytes()
}

/// Bidirectional synchronization between the local cache and the store
pub struct CacheSync {
    session: Arc<RwLock<Session>>,
    cache: Arc<dyn ILocalCache>,
    cache_root: PathBuf,
    refresh: Arc<dyn IRefreshSink>,
}

impl CacheSync {
    pub fn new(
        session: Arc<RwLock<Session>>,
        cache: Arc<dyn ILocalCache>,
        cache_root: impl Into<PathBuf>,
        refresh: Arc<dyn IRefreshSink>,
    ) -> Self {
        Self {
            session,
            cache,
            cache_root: cache_root.into(),
            refresh,
        }
    }

    /// The local working-copy path for a key under a given selection
    #[must_use]
    pub fn local_path(
        &self,
        target: &TargetName,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> PathBuf {
        let mut path = self
            .cache_root
            .join(target.as_str())
            .join(bucket.as_str());
        for segment in key.as_str().split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    /// Ensures a fresh local working copy of a file, returning its path
    ///
    /// Missing copies are fetched; existing copies are re-fetched only
    /// when the remote's recorded mtime is strictly newer. Repeated calls
    /// with nothing changed do no remote writes and at most one `head`.
    ///
    /// # Errors
    /// `NoTargetSelected` / `NoBucketSelected` on incomplete selection;
    /// `Remote` / `Local` on transfer or filesystem failure.
    #[instrument(skip(self), fields(key = %file.object_key()))]
    pub async fn resolve(&self, file: &FileNode) -> Result<PathBuf, EngineError> {
        let (target, bucket, store) = self.session.write().await.current_context()?;
        let key = file.object_key();
        let path = self.local_path(&target, &bucket, &key);

        let state = self
            .cache
            .stat(&path)
            .await
            .map_err(|e| EngineError::local(path.clone(), e))?;

        if !state.exists {
            debug!(path = %path.display(), "No working copy, fetching");
            let (data, _) = store
                .get_object(&bucket, &key)
                .await
                .map_err(|e| EngineError::remote("get_object", e))?;
            self.cache
                .write(&path, &data)
                .await
                .map_err(|e| EngineError::local(path.clone(), e))?;
            return Ok(path);
        }

        let metadata = store
            .head_object(&bucket, &key)
            .await
            .map_err(|e| EngineError::remote("head_object", e))?;

        let stale = match (metadata.as_ref().and_then(remote_mtime), state.modified) {
            (Some(remote), Some(local)) => remote > local,
            // Unknown freshness on either side: the local copy wins
            _ => false,
        };

        if stale {
            info!(key = %key, "Remote is newer, refreshing working copy");
            let (data, _) = store
                .get_object(&bucket, &key)
                .await
                .map_err(|e| EngineError::remote("get_object", e))?;
            self.cache
                .write(&path, &data)
                .await
                .map_err(|e| EngineError::local(path.clone(), e))?;
        }

        Ok(path)
    }

    /// Uploads a file's content under its derived key, recording the local
    /// working copy's mtime as the freshness mark
    ///
    /// With no selection this is a logged no-op: the watch loop may still
    /// hold entries across a selection change and must never crash on one.
    #[instrument(skip(self, content), fields(key = %file.object_key(), bytes = content.len()))]
    pub async fn push(&self, file: &FileNode, content: &[u8]) -> Result<(), EngineError> {
        let context = self.session.write().await.current_context();
        let (target, bucket, store) = match context {
            Ok(ctx) => ctx,
            Err(EngineError::NoTargetSelected | EngineError::NoBucketSelected) => {
                warn!("No selection, dropping push");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let key = file.object_key();
        let path = self.local_path(&target, &bucket, &key);
        let state = self
            .cache
            .stat(&path)
            .await
            .map_err(|e| EngineError::local(path.clone(), e))?;
        let mtime = state.modified.unwrap_or_else(Utc::now);

        store
            .put_object(&bucket, &key, content.to_vec(), mtime_metadata(mtime))
            .await
            .map_err(|e| EngineError::remote("put_object", e))?;
        debug!(key = %key, "Pushed working copy");
        self.refresh.refresh();
        Ok(())
    }

    /// Creates a new diagram file under `parent`, seeded with the
    /// canonical empty-diagram content, and returns its node
    #[instrument(skip(self, parent))]
    pub async fn create_file(
        &self,
        parent: Option<&Arc<Directory>>,
        name: &str,
    ) -> Result<FileNode, EngineError> {
        let file = FileNode::new(name, parent.cloned(), None)?;
        let (_, bucket, store) = self.session.write().await.current_context()?;

        let key = file.object_key();
        store
            .put_object(&bucket, &key, empty_diagram(), mtime_metadata(Utc::now()))
            .await
            .map_err(|e| EngineError::remote("put_object", e))?;

        info!(key = %key, "Created diagram");
        self.refresh.refresh();
        Ok(file)
    }

    /// Creates a directory under `parent` by writing its zero-length
    /// placeholder object
    #[instrument(skip(self, parent))]
    pub async fn create_directory(
        &self,
        parent: Option<&Arc<Directory>>,
        name: &str,
    ) -> Result<Arc<Directory>, EngineError> {
        let directory = Directory::new(name, parent.cloned())?;
        self.create_empty(&directory).await?;
        self.refresh.refresh();
        Ok(directory)
    }

    /// Writes the zero-length placeholder object for a directory
    pub async fn create_empty(&self, directory: &Arc<Directory>) -> Result<(), EngineError> {
        let (_, bucket, store) = self.session.write().await.current_context()?;
        let key = directory.object_key();
        store
            .put_object(&bucket, &key, Vec::new(), ObjectMetadata::new())
            .await
            .map_err(|e| EngineError::remote("put_object", e))?;
        info!(key = %key, "Created directory placeholder");
        Ok(())
    }

    /// Deletes a file remotely, then best-effort locally
    ///
    /// The remote store is authoritative: once the remote delete succeeds
    /// the operation has succeeded, and a failing local cleanup is only
    /// logged.
    #[instrument(skip(self), fields(key = %file.object_key()))]
    pub async fn delete_remote_and_local(&self, file: &FileNode) -> Result<(), EngineError> {
        let (target, bucket, store) = self.session.write().await.current_context()?;
        let key = file.object_key();

        store
            .delete_object(&bucket, &key)
            .await
            .map_err(|e| EngineError::remote("delete_object", e))?;
        info!(key = %key, "Deleted remote object");

        let path = self.local_path(&target, &bucket, &key);
        match self.cache.stat(&path).await {
            Ok(state) if state.exists => {
                if let Err(e) = self.cache.delete(&path).await {
                    warn!(path = %path.display(), error = %e, "Local cleanup failed");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Local cleanup stat failed"),
        }

        self.refresh.refresh();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use drawbridge_core::domain::credentials::TargetCredentials;
    use drawbridge_core::ports::frontend::{ICredentialPrompt, NullRefreshSink};
    use drawbridge_core::ports::object_store::{
        IObjectStore, IStoreConnector, ObjectPage,
    };
    use drawbridge_core::ports::secret_store::ISecretStore;
    use drawbridge_core::ports::target_list::ITargetListRepository;
    use drawbridge_store::registry::TargetRegistry;

    use crate::filesystem::CacheFs;

    /// Single-bucket in-memory store with a fetch counter
    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<BTreeMap<String, (Vec<u8>, ObjectMetadata)>>,
        fetches: AtomicU32,
    }

    impl MemoryStore {
        fn insert(&self, key: &str, data: &[u8], metadata: ObjectMetadata) {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (data.to_vec(), metadata));
        }

        fn metadata_of(&self, key: &str) -> Option<ObjectMetadata> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .map(|(_, m)| m.clone())
        }

        fn data_of(&self, key: &str) -> Option<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .map(|(d, _)| d.clone())
        }
    }

    #[async_trait::async_trait]
    impl IObjectStore for MemoryStore {
        async fn list_buckets(&self) -> anyhow::Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn create_bucket(&self, _bucket: &BucketName) -> anyhow::Result<()> {
            Ok(())
        }
        async fn delete_bucket(&self, _bucket: &BucketName) -> anyhow::Result<()> {
            Ok(())
        }
        async fn list_objects(
            &self,
            _bucket: &BucketName,
            _prefix: &str,
            _delimiter: Option<&str>,
            _continuation: Option<String>,
        ) -> anyhow::Result<ObjectPage> {
            Ok(ObjectPage::default())
        }

        async fn get_object(
            &self,
            _bucket: &BucketName,
            key: &ObjectKey,
        ) -> anyhow::Result<(Vec<u8>, ObjectMetadata)> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.objects
                .lock()
                .unwrap()
                .get(key.as_str())
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such object: {key}"))
        }

        async fn head_object(
            &self,
            _bucket: &BucketName,
            key: &ObjectKey,
        ) -> anyhow::Result<Option<ObjectMetadata>> {
            Ok(self.metadata_of(key.as_str()))
        }

        async fn put_object(
            &self,
            _bucket: &BucketName,
            key: &ObjectKey,
            data: Vec<u8>,
            metadata: ObjectMetadata,
        ) -> anyhow::Result<()> {
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (data, metadata));
            Ok(())
        }

        async fn delete_object(
            &self,
            _bucket: &BucketName,
            key: &ObjectKey,
        ) -> anyhow::Result<()> {
            self.objects.lock().unwrap().remove(key.as_str());
            Ok(())
        }
    }

    struct FixedConnector(Arc<MemoryStore>);

    impl IStoreConnector for FixedConnector {
        fn connect(
            &self,
            _credentials: &TargetCredentials,
        ) -> anyhow::Result<Arc<dyn IObjectStore>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct MemorySecrets {
        values: Mutex<HashMap<String, String>>,
    }

    impl ISecretStore for MemorySecrets {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }
        fn store(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
        fn delete(&self, key: &str) -> anyhow::Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryTargetList {
        saved: Mutex<Vec<TargetName>>,
    }

    impl ITargetListRepository for MemoryTargetList {
        fn load(&self) -> anyhow::Result<Vec<TargetName>> {
            Ok(self.saved.lock().unwrap().clone())
        }
        fn save(&self, targets: &[TargetName]) -> anyhow::Result<()> {
            *self.saved.lock().unwrap() = targets.to_vec();
            Ok(())
        }
    }

    struct AcceptingPrompt;

    #[async_trait::async_trait]
    impl ICredentialPrompt for AcceptingPrompt {
        async fn prompt(
            &self,
            _target: &TargetName,
            _existing: Option<&TargetCredentials>,
        ) -> Option<TargetCredentials> {
            Some(TargetCredentials::new("AK", "SK", "http://h"))
        }
    }

    #[derive(Default)]
    struct CountingRefresh {
        count: AtomicU32,
    }

    impl IRefreshSink for CountingRefresh {
        fn refresh(&self) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Fixture {
        sync: CacheSync,
        store: Arc<MemoryStore>,
        session: Arc<RwLock<Session>>,
        refresh: Arc<CountingRefresh>,
        _root: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        fixture_with_selection(true).await
    }

    async fn fixture_with_selection(selected: bool) -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let registry = TargetRegistry::new(
            Arc::new(MemorySecrets::default()),
            Arc::new(FixedConnector(store.clone())),
            Arc::new(MemoryTargetList::default()),
        )
        .unwrap();
        let mut session = Session::new(registry, Arc::new(NullRefreshSink));
        if selected {
            let t1 = TargetName::new("t1").unwrap();
            session.add_target(&t1, &AcceptingPrompt).await.unwrap();
            session.select_target(&t1).unwrap();
            session
                .select_bucket(&BucketName::new("b1").unwrap())
                .unwrap();
        }
        let session = Arc::new(RwLock::new(session));
        let root = tempfile::tempdir().unwrap();
        let refresh = Arc::new(CountingRefresh::default());
        let sync = CacheSync::new(
            session.clone(),
            Arc::new(CacheFs::new()),
            root.path(),
            refresh.clone(),
        );
        Fixture {
            sync,
            store,
            session,
            refresh,
            _root: root,
        }
    }

    fn file(name: &str) -> FileNode {
        FileNode::new(
            name,
            Some(Directory::new("docs", None).unwrap()),
            None,
        )
        .unwrap()
    }

    fn millis(dt: DateTime<Utc>) -> String {
        dt.timestamp_millis().to_string()
    }

    #[tokio::test]
    async fn test_resolve_fetches_missing_copy_once() {
        let f = fixture().await;
        f.store
            .insert("docs/a.excalidraw.json", b"content", ObjectMetadata::new());
        let node = file("a.excalidraw.json");

        let path = f.sync.resolve(&node).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"content");
        assert!(path.starts_with(f._root.path().join("t1").join("b1")));

        // Idempotent: same path, no second fetch
        let again = f.sync.resolve(&node).await.unwrap();
        assert_eq!(again, path);
        assert_eq!(f.store.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_refetches_when_remote_newer() {
        let f = fixture().await;
        let node = file("a.excalidraw.json");

        f.store
            .insert("docs/a.excalidraw.json", b"old", ObjectMetadata::new());
        let path = f.sync.resolve(&node).await.unwrap();

        let mut metadata = ObjectMetadata::new();
        metadata.insert(
            METADATA_LOCAL_MTIME.to_string(),
            millis(Utc::now() + chrono::Duration::hours(1)),
        );
        f.store.insert("docs/a.excalidraw.json", b"new", metadata);

        f.sync.resolve(&node).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_resolve_prefers_local_without_metadata() {
        let f = fixture().await;
        let node = file("a.excalidraw.json");

        f.store
            .insert("docs/a.excalidraw.json", b"v1", ObjectMetadata::new());
        let path = f.sync.resolve(&node).await.unwrap();

        // Remote changed but carries no freshness mark
        f.store
            .insert("docs/a.excalidraw.json", b"v2", ObjectMetadata::new());

        f.sync.resolve(&node).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"v1");
    }

    #[tokio::test]
    async fn test_resolve_without_selection_fails() {
        let f = fixture_with_selection(false).await;
        assert!(matches!(
            f.sync.resolve(&file("a.excalidraw.json")).await,
            Err(EngineError::NoTargetSelected)
        ));
    }

    #[tokio::test]
    async fn test_push_records_local_mtime() {
        let f = fixture().await;
        let node = file("a.excalidraw.json");
        f.store
            .insert("docs/a.excalidraw.json", b"content", ObjectMetadata::new());
        let path = f.sync.resolve(&node).await.unwrap();

        f.sync.push(&node, b"edited").await.unwrap();

        assert_eq!(
            f.store.data_of("docs/a.excalidraw.json").unwrap(),
            b"edited"
        );
        let metadata = f.store.metadata_of("docs/a.excalidraw.json").unwrap();
        let recorded: i64 = metadata[METADATA_LOCAL_MTIME].parse().unwrap();
        let mtime = DateTime::<Utc>::from(
            std::fs::metadata(&path).unwrap().modified().unwrap(),
        );
        assert_eq!(recorded, mtime.timestamp_millis());
    }

    #[tokio::test]
    async fn test_push_without_selection_is_noop() {
        let f = fixture_with_selection(false).await;
        f.sync.push(&file("a.excalidraw.json"), b"x").await.unwrap();
        assert!(f.store.objects.lock().unwrap().is_empty());
        // Nothing changed, so no refresh either
        assert_eq!(f.refresh.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_push_fires_refresh_on_upload() {
        let f = fixture().await;
        let node = file("a.excalidraw.json");
        f.store
            .insert("docs/a.excalidraw.json", b"content", ObjectMetadata::new());
        f.sync.resolve(&node).await.unwrap();
        let before = f.refresh.count.load(Ordering::SeqCst);

        f.sync.push(&node, b"edited").await.unwrap();

        assert_eq!(f.refresh.count.load(Ordering::SeqCst), before + 1);
    }

    #[tokio::test]
    async fn test_create_file_seeds_empty_diagram() {
        let f = fixture().await;
        let docs = Directory::new("docs", None).unwrap();

        let node = f
            .sync
            .create_file(Some(&docs), "new.excalidraw.json")
            .await
            .unwrap();
        assert_eq!(node.object_key().as_str(), "docs/new.excalidraw.json");

        let data = f.store.data_of("docs/new.excalidraw.json").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["type"], "excalidraw");
        assert_eq!(value["version"], 2);
        assert!(value["elements"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_file_rejects_bad_name() {
        let f = fixture().await;
        assert!(f.sync.create_file(None, "a/b").await.is_err());
    }

    #[tokio::test]
    async fn test_create_directory_writes_placeholder() {
        let f = fixture().await;
        let dir = f.sync.create_directory(None, "docs").await.unwrap();
        assert_eq!(dir.object_key().as_str(), "docs/");
        assert_eq!(f.store.data_of("docs/").unwrap(), Vec::<u8>::new());
    }

    #[tokio::test]
    async fn test_delete_removes_remote_and_local() {
        let f = fixture().await;
        let node = file("a.excalidraw.json");
        f.store
            .insert("docs/a.excalidraw.json", b"content", ObjectMetadata::new());
        let path = f.sync.resolve(&node).await.unwrap();

        f.sync.delete_remote_and_local(&node).await.unwrap();

        assert!(f.store.data_of("docs/a.excalidraw.json").is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_delete_with_no_local_copy_still_succeeds() {
        let f = fixture().await;
        let node = file("a.excalidraw.json");
        f.store
            .insert("docs/a.excalidraw.json", b"content", ObjectMetadata::new());

        f.sync.delete_remote_and_local(&node).await.unwrap();
        assert!(f.store.data_of("docs/a.excalidraw.json").is_none());
    }
}
