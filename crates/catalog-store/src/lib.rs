pub mod document;
pub mod error;
pub mod memory;
pub mod traits;

pub use document::{Document, DocumentSet, Fields, Subscription, SubscriptionId};
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use traits::DocumentStore;
