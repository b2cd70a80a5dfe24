use async_trait::async_trait;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::document::{Document, DocumentSet, Fields, Subscription, SubscriptionId};
use crate::error::StoreError;
use crate::traits::DocumentStore;

/// Process-local document store.
///
/// Every successful write publishes a complete [`DocumentSet`] to each live
/// subscription of the touched collection. Contents can be loaded from and
/// saved to a JSON file so separate console runs share one catalog. Saving
/// merges into whatever the file holds at that moment and refuses to
/// overwrite a document another run changed since this store last saw it.
pub struct InMemoryStore {
    name: String,
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    collections: HashMap<String, CollectionState>,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    next_subscription: u64,
    /// Document versions as of the last load or save, per collection
    saved_versions: HashMap<String, HashMap<String, u64>>,
}

#[derive(Default)]
struct CollectionState {
    documents: HashMap<String, StoredDocument>,
    next_seq: u64,
}

struct StoredDocument {
    seq: u64,
    document: Document,
}

struct Subscriber {
    collection: String,
    sender: watch::Sender<Arc<DocumentSet>>,
}

/// On-disk layout of a saved store
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedStore {
    #[serde(default)]
    collections: BTreeMap<String, Vec<Document>>,
}

impl CollectionState {
    fn snapshot(&self, collection: &str) -> DocumentSet {
        let mut stored: Vec<&StoredDocument> = self.documents.values().collect();
        stored.sort_by_key(|s| s.seq);
        DocumentSet {
            collection: collection.to_string(),
            documents: stored.into_iter().map(|s| s.document.clone()).collect(),
        }
    }

    fn insert(&mut self, document: Document) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.documents.insert(document.id.clone(), StoredDocument { seq, document });
    }
}

impl StoreState {
    fn snapshot(&self, collection: &str) -> DocumentSet {
        self.collections
            .get(collection)
            .map(|c| c.snapshot(collection))
            .unwrap_or_else(|| DocumentSet::empty(collection))
    }

    /// Push the current contents of `collection` to its subscribers, dropping
    /// any whose receiver is gone
    fn publish(&mut self, collection: &str) {
        let snapshot = Arc::new(self.snapshot(collection));
        let mut closed = Vec::new();
        for (id, subscriber) in &self.subscribers {
            if subscriber.collection != collection {
                continue;
            }
            if subscriber.sender.is_closed() {
                closed.push(*id);
                continue;
            }
            subscriber.sender.send_replace(snapshot.clone());
        }
        for id in closed {
            debug!("Dropping subscription {} on {}: receiver gone", id, collection);
            self.subscribers.remove(&id);
        }
        trace!("Published {} documents to {} subscribers", snapshot.len(), collection);
    }

    fn current_versions(&self) -> HashMap<String, HashMap<String, u64>> {
        self.collections
            .iter()
            .map(|(name, collection)| {
                let versions = collection
                    .documents
                    .iter()
                    .map(|(id, stored)| (id.clone(), stored.document.version))
                    .collect();
                (name.clone(), versions)
            })
            .collect()
    }

    /// Apply what changed here since the last load or save on top of the
    /// file contents. A document this store updated or deleted must still be
    /// at the version it had back then.
    fn merge_into(&self, mut on_disk: PersistedStore) -> Result<PersistedStore, StoreError> {
        let no_versions = HashMap::new();
        let names: BTreeSet<&String> = self.collections.keys().chain(self.saved_versions.keys()).collect();

        for name in names {
            let local = self.snapshot(name).documents;
            let baseline = self.saved_versions.get(name).unwrap_or(&no_versions);
            let disk = on_disk.collections.entry(name.clone()).or_default();

            for (id, base_version) in baseline {
                let local_doc = local.iter().find(|d| &d.id == id);
                if local_doc.map(|d| d.version) == Some(*base_version) {
                    continue;
                }

                let position = disk.iter().position(|d| &d.id == id);
                let moved = match position {
                    Some(i) => disk[i].version != *base_version,
                    None => local_doc.is_some(),
                };
                if moved {
                    return Err(StoreError::SaveConflict {
                        collection: name.clone(),
                        id: id.clone(),
                    });
                }

                match (local_doc, position) {
                    (Some(document), Some(i)) => disk[i] = document.clone(),
                    (None, Some(i)) => {
                        disk.remove(i);
                    }
                    _ => {}
                }
            }

            disk.extend(local.iter().filter(|d| !baseline.contains_key(&d.id)).cloned());
        }

        Ok(on_disk)
    }
}

fn read_persisted(path: &Path) -> Result<PersistedStore, StoreError> {
    if !path.exists() {
        return Ok(PersistedStore::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Sidecar file the advisory lock is taken on; the store file itself is
/// replaced by rename on every save
fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("lock")
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_name("memory")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Load a store saved with [`InMemoryStore::save_to_file`]. A missing file
    /// yields an empty store.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let store = Self::with_name(path.display().to_string());
        if !path.exists() {
            debug!("Store file {} does not exist, starting empty", path.display());
            return Ok(store);
        }

        let persisted = read_persisted(path)?;
        {
            let mut state = store.state();
            for (collection, documents) in persisted.collections {
                let entry = state.collections.entry(collection).or_default();
                for document in documents {
                    entry.insert(document);
                }
            }
            state.saved_versions = state.current_versions();
        }
        info!("Loaded store from {}", path.display());
        Ok(store)
    }

    /// Write this store's changes into `path`.
    ///
    /// Saves from separate processes are serialized by an advisory lock. The
    /// file is re-read under the lock, so documents other runs added or
    /// changed survive; a document both sides changed fails the whole save
    /// with [`StoreError::SaveConflict`] and leaves the file untouched.
    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(lock_path(path))?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock.write()?;

        let mut state = self.state();
        let merged = state.merge_into(read_persisted(path)?)?;
        let json = serde_json::to_string_pretty(&merged)?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, path)?;

        state.saved_versions = state.current_versions();
        debug!("Saved store to {}", path.display());
        Ok(())
    }

    /// Number of subscriptions currently receiving snapshots
    pub fn active_subscriptions(&self) -> usize {
        self.state().subscribers.len()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn store_name(&self) -> &str {
        &self.name
    }

    fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        let mut state = self.state();
        let id = SubscriptionId(state.next_subscription);
        state.next_subscription += 1;

        let (sender, receiver) = watch::channel(Arc::new(state.snapshot(collection)));
        state.subscribers.insert(
            id,
            Subscriber {
                collection: collection.to_string(),
                sender,
            },
        );
        debug!("Subscription {} opened on {}", id, collection);
        Ok(Subscription::new(id, collection, receiver))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let removed = self.state().subscribers.remove(&subscription);
        if let Some(subscriber) = &removed {
            debug!("Subscription {} closed on {}", subscription, subscriber.collection);
        }
        removed.is_some()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let state = self.state();
        Ok(state
            .collections
            .get(collection)
            .and_then(|c| c.documents.get(id))
            .map(|s| s.document.clone()))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self.state().snapshot(collection).documents)
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut state = self.state();
        state.collections.entry(collection.to_string()).or_default().insert(Document {
            id: id.clone(),
            version: 1,
            fields,
        });
        state.publish(collection);
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut state = self.state();
        let stored = state
            .collections
            .get_mut(collection)
            .and_then(|c| c.documents.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        if let Some(expected) = expected_version {
            if stored.document.version != expected {
                return Err(StoreError::VersionConflict {
                    collection: collection.to_string(),
                    id: id.to_string(),
                    expected,
                    actual: stored.document.version,
                });
            }
        }

        for (key, value) in fields {
            stored.document.fields.insert(key, value);
        }
        stored.document.version += 1;
        let version = stored.document.version;

        state.publish(collection);
        Ok(version)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|c| c.documents.remove(id))
            .is_some();

        if removed {
            state.publish(collection);
        } else {
            debug!("Delete of absent document {}/{} ignored", collection, id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_add_assigns_id_and_version() {
        let store = InMemoryStore::new();
        let id = store.add("movies", fields(json!({"title": "Nocturne"}))).await.unwrap();

        let doc = store.get("movies", &id).await.unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.version, 1);
        assert_eq!(doc.fields["title"], "Nocturne");
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = InMemoryStore::new();
        let a = store.add("movies", fields(json!({"n": 1}))).await.unwrap();
        let b = store.add("movies", fields(json!({"n": 2}))).await.unwrap();
        let c = store.add("movies", fields(json!({"n": 3}))).await.unwrap();

        let ids: Vec<String> = store.list("movies").await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[tokio::test]
    async fn test_update_merges_and_bumps_version() {
        let store = InMemoryStore::new();
        let id = store.add("movies", fields(json!({"title": "A", "fill": false}))).await.unwrap();

        let version = store.update("movies", &id, fields(json!({"fill": true})), None).await.unwrap();
        assert_eq!(version, 2);

        let doc = store.get("movies", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], "A");
        assert_eq!(doc.fields["fill"], true);
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let store = InMemoryStore::new();
        let id = store.add("movies", fields(json!({"title": "A"}))).await.unwrap();
        store.update("movies", &id, fields(json!({"title": "B"})), Some(1)).await.unwrap();

        let err = store
            .update("movies", &id, fields(json!({"title": "C"})), Some(1))
            .await
            .unwrap_err();
        assert!(err.is_version_conflict());

        let doc = store.get("movies", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], "B");
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = InMemoryStore::new();
        let err = store.update("movies", "nope", Fields::new(), None).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_absent_is_ok() {
        let store = InMemoryStore::new();
        assert!(store.delete("movies", "nope").await.is_ok());
    }

    #[tokio::test]
    async fn test_subscription_receives_full_snapshots() {
        let store = InMemoryStore::new();
        let subscription = store.subscribe("movies").unwrap();
        let (_, mut rx) = subscription.into_parts();
        assert!(rx.borrow_and_update().is_empty());

        let id = store.add("movies", fields(json!({"title": "A"}))).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().contains(&id));

        store.delete("movies", &id).await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn test_subscription_ignores_other_collections() {
        let store = InMemoryStore::new();
        let (_, mut rx) = store.subscribe("users").unwrap().into_parts();
        rx.borrow_and_update();

        store.add("movies", fields(json!({"title": "A"}))).await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_channel() {
        let store = InMemoryStore::new();
        let (id, mut rx) = store.subscribe("movies").unwrap().into_parts();
        assert_eq!(store.active_subscriptions(), 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        assert_eq!(store.active_subscriptions(), 0);
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("store.json");

        let store = InMemoryStore::new();
        let first = store.add("movies", fields(json!({"title": "First"}))).await.unwrap();
        let second = store.add("movies", fields(json!({"title": "Second"}))).await.unwrap();
        store.add("users", fields(json!({"name": "ada"}))).await.unwrap();
        store.update("movies", &second, fields(json!({"fill": true})), None).await.unwrap();
        store.save_to_file(&path).unwrap();

        let loaded = InMemoryStore::load_from_file(&path).unwrap();
        let movies = loaded.list("movies").await.unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].id, first);
        assert_eq!(movies[1].id, second);
        assert_eq!(movies[1].version, 2);
        assert_eq!(loaded.list("users").await.unwrap().len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = InMemoryStore::load_from_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(store.active_subscriptions(), 0);
    }

    async fn saved_with_one_movie(path: &Path) -> String {
        let store = InMemoryStore::new();
        let id = store.add("movies", fields(json!({"title": "Lighthouse"}))).await.unwrap();
        store.save_to_file(path).unwrap();
        id
    }

    #[tokio::test]
    async fn test_second_save_of_same_document_conflicts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let id = saved_with_one_movie(&path).await;

        let first = InMemoryStore::load_from_file(&path).unwrap();
        let second = InMemoryStore::load_from_file(&path).unwrap();
        first.update("movies", &id, fields(json!({"title": "First"})), Some(1)).await.unwrap();
        second.update("movies", &id, fields(json!({"title": "Second"})), Some(1)).await.unwrap();

        first.save_to_file(&path).unwrap();
        let err = second.save_to_file(&path).unwrap_err();
        assert!(err.is_save_conflict());

        let reloaded = InMemoryStore::load_from_file(&path).unwrap();
        let doc = reloaded.get("movies", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], "First");
        assert_eq!(doc.version, 2);
    }

    #[tokio::test]
    async fn test_update_after_delete_elsewhere_conflicts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let id = saved_with_one_movie(&path).await;

        let deleter = InMemoryStore::load_from_file(&path).unwrap();
        let updater = InMemoryStore::load_from_file(&path).unwrap();
        deleter.delete("movies", &id).await.unwrap();
        updater.update("movies", &id, fields(json!({"fill": true})), None).await.unwrap();

        deleter.save_to_file(&path).unwrap();
        assert!(updater.save_to_file(&path).unwrap_err().is_save_conflict());

        let reloaded = InMemoryStore::load_from_file(&path).unwrap();
        assert!(reloaded.get("movies", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_independent_changes_from_two_loads_merge() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let id = saved_with_one_movie(&path).await;

        let adder = InMemoryStore::load_from_file(&path).unwrap();
        let updater = InMemoryStore::load_from_file(&path).unwrap();
        let added = adder.add("movies", fields(json!({"title": "Nocturne"}))).await.unwrap();
        updater.update("movies", &id, fields(json!({"fill": true})), None).await.unwrap();

        adder.save_to_file(&path).unwrap();
        updater.save_to_file(&path).unwrap();

        let reloaded = InMemoryStore::load_from_file(&path).unwrap();
        let movies = reloaded.list("movies").await.unwrap();
        let ids: Vec<&str> = movies.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![id.as_str(), added.as_str()]);
        assert_eq!(movies[0].fields["fill"], true);
    }

    #[tokio::test]
    async fn test_repeated_saves_from_one_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let id = saved_with_one_movie(&path).await;

        let store = InMemoryStore::load_from_file(&path).unwrap();
        store.update("movies", &id, fields(json!({"title": "A"})), None).await.unwrap();
        store.save_to_file(&path).unwrap();
        store.update("movies", &id, fields(json!({"title": "B"})), None).await.unwrap();
        store.save_to_file(&path).unwrap();

        let reloaded = InMemoryStore::load_from_file(&path).unwrap();
        assert_eq!(reloaded.get("movies", &id).await.unwrap().unwrap().fields["title"], "B");
    }

    #[tokio::test]
    async fn test_leftover_temp_file_does_not_break_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let id = saved_with_one_movie(&path).await;
        std::fs::write(path.with_extension("tmp"), "{\"collections\": {\"movies\": [").unwrap();

        let store = InMemoryStore::load_from_file(&path).unwrap();
        assert!(store.get("movies", &id).await.unwrap().is_some());

        store.save_to_file(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(InMemoryStore::load_from_file(&path).unwrap().list("movies").await.unwrap().len(), 1);
    }
}
