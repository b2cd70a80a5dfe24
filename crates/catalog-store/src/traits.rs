use async_trait::async_trait;

use crate::document::{Document, Fields, Subscription, SubscriptionId};
use crate::error::StoreError;

/// Boundary to the hosted document store.
///
/// Everything behind this trait is treated as opaque: replication,
/// durability and consistency are the store's business.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // Store metadata
    fn store_name(&self) -> &str;

    // Push feed
    /// Start receiving full snapshots of `collection`; the current contents
    /// are available immediately
    fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError>;

    /// Stop pushing snapshots to the subscription. Returns false when the id
    /// was not (or no longer) registered.
    fn unsubscribe(&self, subscription: SubscriptionId) -> bool;

    // Reads
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    // Writes
    /// Insert a new document; the store assigns and returns its id
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Shallow-merge `fields` into an existing document and return the new
    /// version. With `expected_version` set the write only lands if the
    /// stored version still matches.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
