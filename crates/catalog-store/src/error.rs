use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    #[error("version conflict on {collection}/{id}: expected {expected}, found {actual}")]
    VersionConflict {
        collection: String,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// Another writer saved a change to a document this store also changed
    #[error("{collection}/{id} changed in the store file since it was loaded")]
    SaveConflict { collection: String, id: String },

    #[error("store rejected the request: {0}")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to (de)serialize store data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }

    pub fn is_save_conflict(&self) -> bool {
        matches!(self, StoreError::SaveConflict { .. })
    }
}
