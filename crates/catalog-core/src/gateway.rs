use catalog_config::{AppendStrategy, Config};
use catalog_models::AdminAppendedEpisode;
use catalog_store::{DocumentStore, Fields};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{CatalogError, Operation, Result};
use crate::reconcile::{appended_episodes, encode_appended_episodes, encode_submission, fields};
use crate::submission::CatalogSubmission;

const DEFAULT_MAX_APPEND_ATTEMPTS: u32 = 5;

/// Outcome of a bulk delete in which every delete landed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteReport {
    pub deleted: Vec<String>,
}

/// The only write path from the console into the catalog collection
pub struct CatalogGateway {
    store: Arc<dyn DocumentStore>,
    collection: String,
    append_strategy: AppendStrategy,
    max_append_attempts: u32,
}

impl CatalogGateway {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            append_strategy: AppendStrategy::Versioned,
            max_append_attempts: DEFAULT_MAX_APPEND_ATTEMPTS,
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self::new(store, config.store.catalog_collection.clone())
            .with_append_strategy(config.mutations.append_strategy, config.mutations.max_append_attempts)
    }

    pub fn with_append_strategy(mut self, strategy: AppendStrategy, max_attempts: u32) -> Self {
        self.append_strategy = strategy;
        self.max_append_attempts = max_attempts.max(1);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn append_strategy(&self) -> AppendStrategy {
        self.append_strategy
    }

    /// Insert a new catalog entry and return the id the store assigned.
    /// Validation failures never reach the store.
    #[instrument(skip(self, submission), fields(title = %submission.common.title, kind = %submission.kind()))]
    pub async fn create(&self, submission: &CatalogSubmission) -> Result<String> {
        let document = encode_submission(submission, Utc::now()).map_err(|e| {
            warn!(operation = "create", status = "invalid", error = %e, "Submission rejected before store call");
            e
        })?;

        match self.store.add(&self.collection, document).await {
            Ok(id) => {
                info!(operation = "create", status = "success", id = %id, "Catalog item created");
                Ok(id)
            }
            Err(e) => {
                error!(operation = "create", status = "error", error = %e, "Failed to add catalog item");
                Err(CatalogError::store(Operation::Create, e))
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        match self.store.delete(&self.collection, id).await {
            Ok(()) => {
                info!(operation = "delete", status = "success", "Catalog item deleted");
                Ok(())
            }
            Err(e) => {
                error!(operation = "delete", status = "error", error = %e, "Failed to delete catalog item");
                Err(CatalogError::store(Operation::Delete, e))
            }
        }
    }

    /// Delete every id independently and concurrently. Deletes that landed
    /// stay deleted when others fail.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn bulk_delete(&self, ids: &[String]) -> Result<BulkDeleteReport> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();
        if unique.is_empty() {
            debug!("Bulk delete with no ids, nothing to do");
            return Ok(BulkDeleteReport::default());
        }

        let deletes = unique.iter().map(|id| {
            let store = self.store.clone();
            let collection = self.collection.clone();
            async move { store.delete(&collection, id).await }
        });
        let results = join_all(deletes).await;

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for (id, result) in unique.into_iter().zip(results) {
            match result {
                Ok(()) => deleted.push(id.clone()),
                Err(e) => {
                    error!(operation = "bulk_delete", status = "error", id = %id, error = %e, "Failed to delete catalog item");
                    failed.push(id.clone());
                }
            }
        }

        if failed.is_empty() {
            info!(operation = "bulk_delete", status = "success", deleted = deleted.len(), "Bulk delete complete");
            Ok(BulkDeleteReport { deleted })
        } else {
            warn!(
                operation = "bulk_delete",
                status = "partial",
                deleted = deleted.len(),
                failed = failed.len(),
                "Bulk delete incomplete; no rollback of landed deletes"
            );
            Err(CatalogError::PartialBulkFailure { deleted, failed })
        }
    }

    /// Append to the item's flat `episodes` list and return its new length.
    #[instrument(skip(self, episode), fields(strategy = ?self.append_strategy))]
    pub async fn append_episode(&self, item_id: &str, episode: AdminAppendedEpisode) -> Result<usize> {
        let missing = episode.missing_fields();
        if !missing.is_empty() {
            warn!(operation = "append_episode", status = "invalid", missing = ?missing, "Episode rejected before store call");
            return Err(CatalogError::validation(missing));
        }

        let result = match self.append_strategy {
            AppendStrategy::Versioned => self.append_versioned(item_id, &episode).await,
            AppendStrategy::Overwrite => self.append_overwrite(item_id, &episode).await,
        };

        match &result {
            Ok(len) => info!(operation = "append_episode", status = "success", episodes = len, "Episode appended"),
            Err(e) => error!(operation = "append_episode", status = "error", error = %e, "Failed to add episode"),
        }
        result
    }

    async fn append_versioned(&self, item_id: &str, episode: &AdminAppendedEpisode) -> Result<usize> {
        for attempt in 1..=self.max_append_attempts {
            let (mut episodes, version) = self.read_episodes(item_id).await?;
            episodes.push(episode.clone());

            let update = episodes_update(&episodes)?;
            match self.store.update(&self.collection, item_id, update, Some(version)).await {
                Ok(_) => return Ok(episodes.len()),
                Err(e) if e.is_version_conflict() => {
                    debug!(attempt, max = self.max_append_attempts, "Version moved during append, re-reading");
                }
                Err(e) => return Err(CatalogError::store(Operation::AppendEpisode, e)),
            }
        }

        Err(CatalogError::AppendContention {
            id: item_id.to_string(),
            attempts: self.max_append_attempts,
        })
    }

    /// Read, extend, overwrite. A concurrent append between the read and the
    /// write is lost.
    async fn append_overwrite(&self, item_id: &str, episode: &AdminAppendedEpisode) -> Result<usize> {
        let (mut episodes, _) = self.read_episodes(item_id).await?;
        episodes.push(episode.clone());

        let update = episodes_update(&episodes)?;
        self.store
            .update(&self.collection, item_id, update, None)
            .await
            .map_err(|e| CatalogError::store(Operation::AppendEpisode, e))?;
        Ok(episodes.len())
    }

    async fn read_episodes(&self, item_id: &str) -> Result<(Vec<AdminAppendedEpisode>, u64)> {
        let document = self
            .store
            .get(&self.collection, item_id)
            .await
            .map_err(|e| CatalogError::store(Operation::AppendEpisode, e))?
            .ok_or_else(|| CatalogError::NotFound { id: item_id.to_string() })?;
        Ok((appended_episodes(&document), document.version))
    }
}

fn episodes_update(episodes: &[AdminAppendedEpisode]) -> Result<Fields> {
    let mut update = Fields::new();
    update.insert(fields::EPISODES.to_string(), encode_appended_episodes(episodes)?);
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::CommonFields;
    use catalog_models::{Categories, Episode, Season};
    use catalog_store::InMemoryStore;

    fn common(title: &str) -> CommonFields {
        CommonFields {
            title: title.to_string(),
            synopsis: "...".to_string(),
            release_date: "2024-05-01".to_string(),
            categories: Categories::from_values(["Thriller"]),
            ..CommonFields::default()
        }
    }

    fn gateway(store: &Arc<InMemoryStore>) -> CatalogGateway {
        CatalogGateway::new(store.clone(), "movies")
    }

    fn pilot() -> AdminAppendedEpisode {
        AdminAppendedEpisode::new("Pilot", "1", "1", "https://x/e1")
    }

    #[tokio::test]
    async fn test_create_movie() {
        let store = Arc::new(InMemoryStore::new());
        let id = gateway(&store)
            .create(&CatalogSubmission::movie(common("Nocturne"), "https://x/d", false))
            .await
            .unwrap();

        let doc = store.get("movies", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], "Nocturne");
        assert_eq!(doc.fields["kind"], "Movie");
        assert!(doc.fields.contains_key("createdAt"));
    }

    #[tokio::test]
    async fn test_invalid_create_never_reaches_store() {
        let store = Arc::new(InMemoryStore::new());
        let err = gateway(&store)
            .create(&CatalogSubmission::movie(common(""), "", false))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::ValidationFailure { .. }));
        assert!(store.list("movies").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_series() {
        let store = Arc::new(InMemoryStore::new());
        let season = Season::new("1", vec![Episode::new("1", "Pilot", "https://x/e1")]);
        let id = gateway(&store)
            .create(&CatalogSubmission::series(common("Lighthouse"), vec![season]))
            .await
            .unwrap();

        let doc = store.get("movies", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["seriesData"][0]["episodes"][0]["episodeTitle"], "Pilot");
        assert!(!doc.fields.contains_key("downloadUrl"));
    }

    #[tokio::test]
    async fn test_delete_and_bulk_delete() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = gateway(&store);
        let mut ids = Vec::new();
        for title in ["A", "B", "C"] {
            ids.push(
                gateway
                    .create(&CatalogSubmission::movie(common(title), "https://x/d", false))
                    .await
                    .unwrap(),
            );
        }

        gateway.delete(&ids[0]).await.unwrap();
        let report = gateway.bulk_delete(&ids[1..]).await.unwrap();
        assert_eq!(report.deleted, ids[1..].to_vec());
        assert!(store.list("movies").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_empty_and_duplicate_ids() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = gateway(&store);
        assert_eq!(gateway.bulk_delete(&[]).await.unwrap(), BulkDeleteReport::default());

        let id = gateway
            .create(&CatalogSubmission::movie(common("A"), "https://x/d", false))
            .await
            .unwrap();
        let report = gateway.bulk_delete(&[id.clone(), id.clone()]).await.unwrap();
        assert_eq!(report.deleted, vec![id]);
    }

    #[tokio::test]
    async fn test_append_returns_new_length() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = gateway(&store);
        let id = store.add("movies", Fields::new()).await.unwrap();

        assert_eq!(gateway.append_episode(&id, pilot()).await.unwrap(), 1);
        let second = AdminAppendedEpisode::new("Second", "1", "2", "https://x/e2");
        assert_eq!(gateway.append_episode(&id, second).await.unwrap(), 2);

        let doc = store.get("movies", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["episodes"][0]["title"], "Pilot");
        assert_eq!(doc.fields["episodes"][1]["downloadLink"], "https://x/e2");
    }

    #[tokio::test]
    async fn test_append_leaves_series_data_alone() {
        let store = Arc::new(InMemoryStore::new());
        let gateway = gateway(&store);
        let season = Season::new("1", vec![Episode::new("1", "Pilot", "https://x/e1")]);
        let id = gateway
            .create(&CatalogSubmission::series(common("Lighthouse"), vec![season]))
            .await
            .unwrap();

        gateway.append_episode(&id, AdminAppendedEpisode::new("Bonus", "1", "2", "https://x/b")).await.unwrap();

        let doc = store.get("movies", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["seriesData"][0]["episodes"].as_array().unwrap().len(), 1);
        assert_eq!(doc.fields["episodes"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_requires_all_fields() {
        let store = Arc::new(InMemoryStore::new());
        let id = store.add("movies", Fields::new()).await.unwrap();

        let err = gateway(&store)
            .append_episode(&id, AdminAppendedEpisode::new("", "1", "", "https://x"))
            .await
            .unwrap_err();
        match err {
            CatalogError::ValidationFailure { fields } => assert_eq!(fields, vec!["title", "episode"]),
            other => panic!("expected validation failure, got {:?}", other),
        }
        let doc = store.get("movies", &id).await.unwrap().unwrap();
        assert_eq!(doc.version, 1);
    }

    #[tokio::test]
    async fn test_append_to_missing_item() {
        let store = Arc::new(InMemoryStore::new());
        for strategy in [AppendStrategy::Versioned, AppendStrategy::Overwrite] {
            let gateway = gateway(&store).with_append_strategy(strategy, 3);
            let err = gateway.append_episode("nope", pilot()).await.unwrap_err();
            assert!(matches!(err, CatalogError::NotFound { ref id } if id == "nope"));
        }
    }

    #[tokio::test]
    async fn test_from_config() {
        let store = Arc::new(InMemoryStore::new());
        let mut config = Config::default();
        config.store.catalog_collection = "catalog".to_string();
        config.mutations.append_strategy = AppendStrategy::Overwrite;

        let gateway = CatalogGateway::from_config(store.clone(), &config);
        assert_eq!(gateway.collection(), "catalog");
        assert_eq!(gateway.append_strategy(), AppendStrategy::Overwrite);
    }
}
