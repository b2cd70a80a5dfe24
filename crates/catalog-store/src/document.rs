use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Raw document body as the store sees it
pub type Fields = Map<String, Value>;

/// A stored document with its store-assigned id and write version.
///
/// `version` starts at 1 and increases by one on every successful update; it
/// is the token used for compare-and-swap writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub fields: Fields,
}

impl Document {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Full contents of one collection at a point in time, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet {
    pub collection: String,
    pub documents: Vec<Document>,
}

impl DocumentSet {
    pub fn empty(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            documents: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.iter().any(|d| d.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Live feed of full collection snapshots.
///
/// The receiver always holds the latest snapshot; intermediate snapshots may
/// be skipped when writes land faster than the reader. The channel closes when
/// the store drops the subscription.
pub struct Subscription {
    id: SubscriptionId,
    collection: String,
    receiver: watch::Receiver<Arc<DocumentSet>>,
}

impl Subscription {
    pub fn new(id: SubscriptionId, collection: impl Into<String>, receiver: watch::Receiver<Arc<DocumentSet>>) -> Self {
        Self {
            id,
            collection: collection.into(),
            receiver,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Split into the id (needed to unsubscribe) and the snapshot receiver
    pub fn into_parts(self) -> (SubscriptionId, watch::Receiver<Arc<DocumentSet>>) {
        (self.id, self.receiver)
    }
}
