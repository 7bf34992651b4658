//! The watch set - locally-open artifacts under periodic sync
//!
//! Keyed by the resolved local path string, which is unique per
//! target/bucket/key triple, so entries from a previous selection can
//! never alias entries from the current one.
//!
//! Each entry carries a `syncing` flag shared with whoever is pushing it;
//! the flag is the single-writer-per-entry guard and doubles as the
//! progress signal for external observers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use drawbridge_core::domain::node::FileNode;

/// One watched artifact
#[derive(Clone)]
pub struct WatchEntry {
    /// The logical file this working copy belongs to
    pub node: FileNode,
    /// Local mtime as of the last successful push (or open)
    pub last_synced: DateTime<Utc>,
    /// Set while a push for this entry is in flight
    pub syncing: Arc<AtomicBool>,
}

/// Concurrent set of watched artifacts
#[derive(Default)]
pub struct WatchSet {
    entries: DashMap<String, WatchEntry>,
}

impl WatchSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) an entry with `last_synced = now`
    pub fn insert(&self, id: impl Into<String>, node: FileNode) {
        self.entries.insert(
            id.into(),
            WatchEntry {
                node,
                last_synced: Utc::now(),
                syncing: Arc::new(AtomicBool::new(false)),
            },
        );
    }

    pub fn remove(&self, id: &str) {
        self.entries.remove(id);
    }

    /// Drops every entry; used on target/bucket switches
    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether a push for this entry is currently in flight
    #[must_use]
    pub fn is_syncing(&self, id: &str) -> bool {
        self.entries
            .get(id)
            .map(|entry| entry.syncing.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Snapshot of all entries, detached from the map
    ///
    /// Callers iterate the snapshot instead of the map so that awaits
    /// during a pass never hold a shard lock.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, WatchEntry)> {
        self.entries
            .iter()
            .map(|item| (item.key().clone(), item.value().clone()))
            .collect()
    }

    /// Advances an entry's `last_synced` mark after a successful push
    pub fn mark_synced(&self, id: &str, mtime: DateTime<Utc>) {
        if let Some(mut entry) = self.entries.get_mut(id) {
            entry.last_synced = mtime;
        }
    }

    /// Drops every entry whose id is not accepted by `keep`
    pub fn retain_ids(&self, keep: impl Fn(&str) -> bool) {
        self.entries.retain(|id, _| keep(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> FileNode {
        FileNode::new(name, None, None).unwrap()
    }

    #[test]
    fn test_insert_and_snapshot() {
        let set = WatchSet::new();
        set.insert("/cache/t1/b1/a", node("a"));
        set.insert("/cache/t1/b1/b", node("b"));

        let snapshot = set.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(set.contains("/cache/t1/b1/a"));
    }

    #[test]
    fn test_reinsert_resets_flag() {
        let set = WatchSet::new();
        set.insert("id", node("a"));
        set.snapshot()[0].1.syncing.store(true, Ordering::SeqCst);
        assert!(set.is_syncing("id"));

        set.insert("id", node("a"));
        assert!(!set.is_syncing("id"));
    }

    #[test]
    fn test_mark_synced_advances_timestamp() {
        let set = WatchSet::new();
        set.insert("id", node("a"));
        let later = Utc::now() + chrono::Duration::seconds(30);

        set.mark_synced("id", later);
        assert_eq!(set.snapshot()[0].1.last_synced, later);
    }

    #[test]
    fn test_retain_ids_prunes() {
        let set = WatchSet::new();
        set.insert("keep", node("a"));
        set.insert("drop", node("b"));

        set.retain_ids(|id| id == "keep");

        assert!(set.contains("keep"));
        assert!(!set.contains("drop"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_clear_empties() {
        let set = WatchSet::new();
        set.insert("id", node("a"));
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_is_syncing_unknown_id_is_false() {
        assert!(!WatchSet::new().is_syncing("nope"));
    }
}
