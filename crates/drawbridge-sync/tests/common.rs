//! Shared in-memory collaborators for engine integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::RwLock;

use drawbridge_core::domain::credentials::TargetCredentials;
use drawbridge_core::domain::newtypes::{BucketName, ObjectKey, TargetName};
use drawbridge_core::ports::frontend::{ICredentialPrompt, IEditorVisibility, IRefreshSink};
use drawbridge_core::ports::object_store::{
    IObjectStore, IStoreConnector, ObjectEntry, ObjectMetadata, ObjectPage,
};
use drawbridge_core::ports::secret_store::ISecretStore;
use drawbridge_core::ports::target_list::ITargetListRepository;
use drawbridge_store::registry::TargetRegistry;
use drawbridge_store::session::Session;
use drawbridge_sync::cache_sync::CacheSync;
use drawbridge_sync::engine::WatchEngine;
use drawbridge_sync::filesystem::CacheFs;

/// Single-bucket in-memory object store with a fetch counter
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<BTreeMap<String, (Vec<u8>, ObjectMetadata)>>,
    pub fetches: AtomicU32,
}

impl MemoryStore {
    pub fn insert(&self, key: &str, data: &[u8], metadata: ObjectMetadata) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), metadata));
    }

    pub fn data_of(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(d, _)| d.clone())
    }

    pub fn metadata_of(&self, key: &str) -> Option<ObjectMetadata> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, m)| m.clone())
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
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
        prefix: &str,
        delimiter: Option<&str>,
        _continuation: Option<String>,
    ) -> anyhow::Result<ObjectPage> {
        let objects = self.objects.lock().unwrap();
        let mut entries = Vec::new();
        let mut common_prefixes: Vec<String> = Vec::new();

        for (key, (data, _)) in objects.iter().filter(|(k, _)| k.starts_with(prefix)) {
            let rest = &key[prefix.len()..];
            let group = delimiter
                .filter(|_| !rest.is_empty())
                .and_then(|d| rest.find(d).map(|idx| (d, idx)));
            match group {
                Some((d, idx)) => {
                    let common = format!("{prefix}{}{d}", &rest[..idx]);
                    if !common_prefixes.contains(&common) {
                        common_prefixes.push(common);
                    }
                }
                None => entries.push(ObjectEntry {
                    key: key.clone(),
                    size: data.len() as u64,
                    modified: None,
                }),
            }
        }

        Ok(ObjectPage {
            entries,
            common_prefixes,
            next_continuation: None,
        })
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

pub struct FixedConnector(pub Arc<MemoryStore>);

impl IStoreConnector for FixedConnector {
    fn connect(
        &self,
        _credentials: &TargetCredentials,
    ) -> anyhow::Result<Arc<dyn IObjectStore>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct MemorySecrets {
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
pub struct MemoryTargetList {
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

pub struct AcceptingPrompt;

#[async_trait::async_trait]
impl ICredentialPrompt for AcceptingPrompt {
    async fn prompt(
        &self,
        _target: &TargetName,
        _existing: Option<&TargetCredentials>,
    ) -> Option<TargetCredentials> {
        Some(TargetCredentials::new("AK", "SK", "http://localhost:9000"))
    }
}

/// Editor visibility with an externally-controlled open set
#[derive(Default)]
pub struct StaticVisibility {
    open: Mutex<HashSet<String>>,
}

impl StaticVisibility {
    pub fn set_open(&self, ids: impl IntoIterator<Item = String>) {
        *self.open.lock().unwrap() = ids.into_iter().collect();
    }
}

impl IEditorVisibility for StaticVisibility {
    fn open_artifact_ids(&self) -> HashSet<String> {
        self.open.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct CountingRefresh {
    count: AtomicU32,
}

impl CountingRefresh {
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

impl IRefreshSink for CountingRefresh {
    fn refresh(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fully-wired engine over in-memory collaborators and a temp cache root
pub struct Harness {
    pub engine: Arc<WatchEngine>,
    pub sync: Arc<CacheSync>,
    pub store: Arc<MemoryStore>,
    pub session: Arc<RwLock<Session>>,
    pub visibility: Arc<StaticVisibility>,
    pub refresh: Arc<CountingRefresh>,
    pub root: tempfile::TempDir,
}

pub async fn harness() -> Harness {
    let store = Arc::new(MemoryStore::default());
    let refresh = Arc::new(CountingRefresh::default());
    let visibility = Arc::new(StaticVisibility::default());

    let registry = TargetRegistry::new(
        Arc::new(MemorySecrets::default()),
        Arc::new(FixedConnector(store.clone())),
        Arc::new(MemoryTargetList::default()),
    )
    .unwrap();
    let mut session = Session::new(registry, refresh.clone());
    let t1 = TargetName::new("t1").unwrap();
    session.add_target(&t1, &AcceptingPrompt).await.unwrap();
    session.select_target(&t1).unwrap();
    session
        .select_bucket(&BucketName::new("b1").unwrap())
        .unwrap();
    let session = Arc::new(RwLock::new(session));

    let root = tempfile::tempdir().unwrap();
    let cache: Arc<CacheFs> = Arc::new(CacheFs::new());
    let sync = Arc::new(CacheSync::new(
        session.clone(),
        cache.clone(),
        root.path(),
        refresh.clone(),
    ));
    let engine = Arc::new(WatchEngine::new(
        session.clone(),
        sync.clone(),
        cache,
        visibility.clone(),
        refresh.clone(),
        Duration::from_secs(2),
        Duration::from_secs(15),
    ));

    Harness {
        engine,
        sync,
        store,
        session,
        visibility,
        refresh,
        root,
    }
}

/// Pushes a file's mtime forward so a change is observed regardless of
/// filesystem timestamp granularity
pub fn age_forward(path: &std::path::Path, secs: u64) {
    let file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .unwrap();
    file.set_modified(std::time::SystemTime::now() + Duration::from_secs(secs))
        .unwrap();
}
