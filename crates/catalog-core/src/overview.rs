use catalog_models::{CatalogItem, CatalogKind, UserRecord};
use serde::Serialize;
use std::collections::BTreeSet;

/// Dashboard stat cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverviewCounts {
    pub total_items: usize,
    pub movies: usize,
    pub series: usize,
    pub users: usize,
}

impl OverviewCounts {
    pub fn from_snapshots(items: &[CatalogItem], users: &[UserRecord]) -> Self {
        let series = items.iter().filter(|i| i.kind() == CatalogKind::Series).count();
        Self {
            total_items: items.len(),
            movies: items.len() - series,
            series,
            users: users.len(),
        }
    }
}

/// One line of the catalog table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewRow {
    pub id: String,
    pub title: String,
    pub kind: CatalogKind,
    pub seasons: usize,
    /// Admin-appended episodes; wizard seasons are counted separately
    pub episodes: usize,
    /// Whether the row offers the "add episode" action
    pub can_append: bool,
}

impl From<&CatalogItem> for OverviewRow {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            kind: item.kind(),
            seasons: item.series_data().len(),
            episodes: item.appended_episode_count(),
            can_append: item.kind() == CatalogKind::Series,
        }
    }
}

pub fn rows(items: &[CatalogItem]) -> Vec<OverviewRow> {
    items.iter().map(OverviewRow::from).collect()
}

/// Case-insensitive title filter. A blank query keeps everything.
pub fn search_items<'a>(items: &'a [CatalogItem], query: &str) -> Vec<&'a CatalogItem> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&query))
        .collect()
}

/// Ids checked for bulk deletion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one id; returns whether it is selected afterwards
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    /// Select every item in `visible`, typically the filtered list
    pub fn select_all<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a CatalogItem>,
    {
        self.ids.extend(visible.into_iter().map(|item| item.id.clone()));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    /// Drop ids that are no longer in the snapshot, e.g. after a delete
    pub fn retain_existing(&mut self, items: &[CatalogItem]) {
        self.ids.retain(|id| items.iter().any(|item| &item.id == id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_models::{AdminAppendedEpisode, CatalogVariant, Categories, Episode, Season};
    use serde_json::Map;

    fn item(id: &str, title: &str, variant: CatalogVariant) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: title.to_string(),
            trailer_url: String::new(),
            poster_url: String::new(),
            banner_url: String::new(),
            synopsis: String::new(),
            release_date: String::new(),
            categories: Categories::new(),
            created_at: None,
            variant,
            appended_episodes: Vec::new(),
        }
    }

    fn movie(id: &str, title: &str) -> CatalogItem {
        item(id, title, CatalogVariant::Movie { download_url: String::new(), fill: false })
    }

    fn series(id: &str, title: &str) -> CatalogItem {
        let season = Season::new("1", vec![Episode::new("1", "Pilot", "https://x/e1")]);
        item(id, title, CatalogVariant::Series { series_data: vec![season] })
    }

    fn catalog() -> Vec<CatalogItem> {
        vec![movie("a", "Nocturne"), series("b", "Lighthouse"), movie("c", "Night Shift")]
    }

    #[test]
    fn test_counts() {
        let users = vec![UserRecord::new("u1", Map::new())];
        let counts = OverviewCounts::from_snapshots(&catalog(), &users);
        assert_eq!(
            counts,
            OverviewCounts { total_items: 3, movies: 2, series: 1, users: 1 }
        );
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let items = catalog();
        let found: Vec<&str> = search_items(&items, "NIGHT").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(found, vec!["c"]);

        let found: Vec<&str> = search_items(&items, "n").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(found, vec!["a", "c"]);

        assert_eq!(search_items(&items, "  ").len(), 3);
    }

    #[test]
    fn test_rows_count_appended_episodes() {
        let mut show = series("b", "Lighthouse");
        show.appended_episodes.push(AdminAppendedEpisode::new("Bonus", "1", "2", "https://x/e2"));

        let rows = rows(&[movie("a", "Nocturne"), show]);
        assert!(!rows[0].can_append);
        assert_eq!(rows[0].seasons, 0);
        assert!(rows[1].can_append);
        assert_eq!(rows[1].seasons, 1);
        assert_eq!(rows[1].episodes, 1);
    }

    #[test]
    fn test_selection() {
        let items = catalog();
        let mut selection = Selection::new();
        assert!(selection.toggle("a"));
        assert!(!selection.toggle("a"));
        assert!(selection.is_empty());

        selection.select_all(search_items(&items, "n"));
        assert_eq!(selection.ids(), vec!["a".to_string(), "c".to_string()]);

        let remaining: Vec<CatalogItem> = items.into_iter().filter(|i| i.id != "a").collect();
        selection.retain_existing(&remaining);
        assert_eq!(selection.ids(), vec!["c".to_string()]);

        selection.clear();
        assert_eq!(selection.len(), 0);
    }
}
