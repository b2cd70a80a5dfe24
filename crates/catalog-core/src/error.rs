use catalog_store::StoreError;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Store-facing operations, used to scope failures to the action that
/// triggered them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Subscribe,
    Create,
    Delete,
    BulkDelete,
    AppendEpisode,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Subscribe => "subscribe",
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::BulkDelete => "bulk delete",
            Operation::AppendEpisode => "append episode",
        }
    }

    /// Message shown to staff when this operation fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::Subscribe => "Failed to load the catalog.",
            Operation::Create => "Failed to add movie.",
            Operation::Delete => "Failed to delete movie.",
            Operation::BulkDelete => "Failed to delete movies.",
            Operation::AppendEpisode => "Failed to add episode.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Required input missing or malformed; nothing was sent to the store
    #[error("validation failed, missing or invalid: {}", .fields.join(", "))]
    ValidationFailure { fields: Vec<String> },

    #[error("{operation} failed: {source}")]
    StoreCallFailure {
        operation: Operation,
        #[source]
        source: StoreError,
    },

    /// Some deletes of a bulk delete landed and some did not. There is no
    /// rollback; the next snapshot is the only source of truth.
    #[error("bulk delete failed: {} not deleted, {} deleted", .failed.len(), .deleted.len())]
    PartialBulkFailure {
        deleted: Vec<String>,
        failed: Vec<String>,
    },

    #[error("catalog item {id} not found")]
    NotFound { id: String },

    #[error("episode append on {id} gave up after {attempts} conflicting attempts")]
    AppendContention { id: String, attempts: u32 },

    #[error("failed to encode document: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("mirrors need a running Tokio runtime")]
    NoRuntime,
}

impl CatalogError {
    pub fn store(operation: Operation, source: StoreError) -> Self {
        CatalogError::StoreCallFailure { operation, source }
    }

    pub fn validation<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CatalogError::ValidationFailure {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Generic message for the console. Partial and total bulk failures read
    /// the same.
    pub fn user_message(&self) -> &'static str {
        match self {
            CatalogError::ValidationFailure { .. } => "Please fill in all required fields.",
            CatalogError::StoreCallFailure { operation, .. } => operation.failure_message(),
            CatalogError::PartialBulkFailure { .. } => Operation::BulkDelete.failure_message(),
            CatalogError::NotFound { .. } | CatalogError::AppendContention { .. } => {
                Operation::AppendEpisode.failure_message()
            }
            CatalogError::Encoding(_) => "Failed to save changes.",
            CatalogError::NoRuntime => Operation::Subscribe.failure_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = CatalogError::validation(["title", "synopsis"]);
        assert_eq!(err.to_string(), "validation failed, missing or invalid: title, synopsis");
        assert_eq!(err.user_message(), "Please fill in all required fields.");
    }

    #[test]
    fn test_partial_bulk_failure_reads_like_total_failure() {
        let partial = CatalogError::PartialBulkFailure {
            deleted: vec!["a".into(), "c".into()],
            failed: vec!["b".into()],
        };
        let total = CatalogError::store(Operation::BulkDelete, StoreError::Unavailable("offline".into()));
        assert_eq!(partial.to_string(), "bulk delete failed: 1 not deleted, 2 deleted");
        assert_eq!(partial.user_message(), total.user_message());
    }

    #[test]
    fn test_store_failure_keeps_source() {
        let err = CatalogError::store(Operation::Create, StoreError::Rejected("quota".into()));
        assert_eq!(err.to_string(), "create failed: store rejected the request: quota");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.user_message(), "Failed to add movie.");
    }
}
