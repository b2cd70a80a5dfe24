use catalog_config::Config;
use catalog_models::{CatalogItem, UserRecord};
use catalog_store::{Document, DocumentStore, SubscriptionId};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, Operation, Result};
use crate::reconcile::{decode_document, decode_user};

/// Turns one stored document into its local record. Must not fail.
pub type Decoder<T> = fn(&Document) -> T;

/// Read-only local copy of one store collection.
///
/// The mirror subscribes on [`Mirror::open`] and replaces its whole snapshot
/// on every push from the store, in the order the store published them. Fast
/// successive pushes may coalesce into one visible change; the latest always
/// wins. If the feed closes the last snapshot stays in place.
///
/// The subscription is released by [`Mirror::close`] or on drop, whichever
/// comes first.
pub struct Mirror<T> {
    store: Arc<dyn DocumentStore>,
    collection: String,
    subscription: Option<SubscriptionId>,
    receiver: watch::Receiver<Arc<Vec<T>>>,
    task: Option<JoinHandle<()>>,
}

impl<T> Mirror<T>
where
    T: Send + Sync + 'static,
{
    /// Subscribe to `collection` and start mirroring it. The current store
    /// contents are available from [`Mirror::snapshot`] right away.
    ///
    /// Fails with [`CatalogError::NoRuntime`] outside a Tokio runtime, before
    /// anything is subscribed.
    pub fn open(store: Arc<dyn DocumentStore>, collection: &str, decoder: Decoder<T>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| CatalogError::NoRuntime)?;
        let subscription = store
            .subscribe(collection)
            .map_err(|e| CatalogError::store(Operation::Subscribe, e))?;
        let (id, mut feed) = subscription.into_parts();

        let initial: Vec<T> = feed.borrow_and_update().documents.iter().map(decoder).collect();
        debug!("Mirror of {} opened with {} documents ({})", collection, initial.len(), id);
        let (sender, receiver) = watch::channel(Arc::new(initial));

        let name = collection.to_string();
        let task = runtime.spawn(async move {
            loop {
                if feed.changed().await.is_err() {
                    warn!("Feed for {} closed; keeping the last snapshot", name);
                    break;
                }
                let items: Vec<T> = {
                    let set = feed.borrow_and_update();
                    set.documents.iter().map(decoder).collect()
                };
                debug!("Mirror of {} replaced with {} documents", name, items.len());
                if sender.send(Arc::new(items)).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            store,
            collection: collection.to_string(),
            subscription: Some(id),
            receiver,
            task: Some(task),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The subscription backing this mirror, `None` once released
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    /// Latest complete snapshot
    pub fn snapshot(&self) -> Arc<Vec<T>> {
        self.receiver.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.receiver.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.borrow().is_empty()
    }

    /// Wait for the next snapshot. Returns `None` when no further snapshots
    /// will arrive, either because the feed closed or the mirror was closed.
    pub async fn changed(&mut self) -> Option<Arc<Vec<T>>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

impl<T> Mirror<T> {
    /// Release the subscription. Safe to call more than once.
    pub fn close(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(id) = self.subscription.take() {
            if self.store.unsubscribe(id) {
                info!("Released subscription {} on {}", id, self.collection);
            } else {
                debug!("Subscription {} on {} was already gone", id, self.collection);
            }
        }
    }
}

impl<T> Drop for Mirror<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// The two mirrors the dashboard reads from
pub struct ConsoleMirrors {
    pub catalog: Mirror<CatalogItem>,
    pub users: Mirror<UserRecord>,
}

impl ConsoleMirrors {
    pub fn open(store: Arc<dyn DocumentStore>, catalog_collection: &str, users_collection: &str) -> Result<Self> {
        let catalog = Mirror::open(store.clone(), catalog_collection, decode_document)?;
        let users = Mirror::open(store, users_collection, decode_user)?;
        Ok(Self { catalog, users })
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &Config) -> Result<Self> {
        Self::open(store, &config.store.catalog_collection, &config.store.users_collection)
    }

    pub fn close(&mut self) {
        self.catalog.close();
        self.users.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_models::CatalogKind;
    use catalog_store::{Fields, InMemoryStore};
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_open_outside_runtime_fails_without_subscribing() {
        let store = Arc::new(InMemoryStore::new());
        let result = Mirror::open(store.clone(), "movies", decode_document);
        assert!(matches!(result, Err(CatalogError::NoRuntime)));
        assert_eq!(store.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_open_sees_existing_documents() {
        let store = Arc::new(InMemoryStore::new());
        store.add("movies", fields(json!({"title": "Nocturne"}))).await.unwrap();

        let mirror = Mirror::open(store.clone(), "movies", decode_document).unwrap();
        let snapshot = mirror.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].title, "Nocturne");
        assert_eq!(snapshot[0].kind(), CatalogKind::Movie);
    }

    #[tokio::test]
    async fn test_snapshot_replaced_on_write() {
        let store = Arc::new(InMemoryStore::new());
        let mut mirror = Mirror::open(store.clone(), "movies", decode_document).unwrap();
        assert!(mirror.is_empty());

        let id = store.add("movies", fields(json!({"title": "Nocturne"}))).await.unwrap();
        let snapshot = mirror.changed().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, id);

        store.delete("movies", &id).await.unwrap();
        let snapshot = mirror.changed().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_other_collections_do_not_touch_mirror() {
        let store = Arc::new(InMemoryStore::new());
        let mut users = Mirror::open(store.clone(), "users", decode_user).unwrap();

        store.add("movies", fields(json!({"title": "Nocturne"}))).await.unwrap();
        store.add("users", fields(json!({"email": "ada@example.com"}))).await.unwrap();

        let snapshot = users.changed().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].attribute("email"), Some(&json!("ada@example.com")));
    }

    #[tokio::test]
    async fn test_closed_feed_freezes_snapshot() {
        let store = Arc::new(InMemoryStore::new());
        store.add("movies", fields(json!({"title": "Nocturne"}))).await.unwrap();
        let mut mirror = Mirror::open(store.clone(), "movies", decode_document).unwrap();

        let id = mirror.subscription().unwrap();
        assert!(store.unsubscribe(id));

        assert!(mirror.changed().await.is_none());
        store.add("movies", fields(json!({"title": "Later"}))).await.unwrap();
        assert_eq!(mirror.snapshot().len(), 1);
        assert_eq!(mirror.snapshot()[0].title, "Nocturne");
    }

    #[tokio::test]
    async fn test_close_and_drop_release_subscription() {
        let store = Arc::new(InMemoryStore::new());
        let mut mirror = Mirror::open(store.clone(), "movies", decode_document).unwrap();
        let other = Mirror::open(store.clone(), "users", decode_user).unwrap();
        assert_eq!(store.active_subscriptions(), 2);

        mirror.close();
        mirror.close();
        assert_eq!(store.active_subscriptions(), 1);
        assert!(mirror.subscription().is_none());

        drop(other);
        assert_eq!(store.active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_console_mirrors_from_config() {
        let store = Arc::new(InMemoryStore::new());
        store.add("users", fields(json!({"email": "a@example.com"}))).await.unwrap();
        store.add("users", fields(json!({"email": "b@example.com"}))).await.unwrap();

        let mut mirrors = ConsoleMirrors::from_config(store.clone(), &Config::default()).unwrap();
        assert_eq!(mirrors.catalog.collection(), "movies");
        assert_eq!(mirrors.users.len(), 2);

        mirrors.close();
        assert_eq!(store.active_subscriptions(), 0);
    }
}
