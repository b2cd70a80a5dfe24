use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::admin_episode::AdminAppendedEpisode;
use crate::categories::Categories;
use crate::season::Season;

/// A decoded catalog document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub trailer_url: String,
    pub poster_url: String,
    pub banner_url: String,
    pub synopsis: String,
    pub release_date: String,
    pub categories: Categories,
    /// Missing on documents whose timestamp was absent or unreadable
    pub created_at: Option<DateTime<Utc>>,
    pub variant: CatalogVariant,
    /// Flat `episodes` list grown by the admin append path
    #[serde(default)]
    pub appended_episodes: Vec<AdminAppendedEpisode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CatalogVariant {
    Movie { download_url: String, fill: bool },
    Series { series_data: Vec<Season> },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Movie,
    Series,
}

impl CatalogKind {
    /// Value written to the `kind` field
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Movie => "Movie",
            CatalogKind::Series => "Series",
        }
    }

    /// Parses a stored `kind` value; unknown values yield None
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Movie" => Some(CatalogKind::Movie),
            "Series" => Some(CatalogKind::Series),
            _ => None,
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CatalogVariant {
    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogVariant::Movie { .. } => CatalogKind::Movie,
            CatalogVariant::Series { .. } => CatalogKind::Series,
        }
    }
}

impl CatalogItem {
    pub fn kind(&self) -> CatalogKind {
        self.variant.kind()
    }

    pub fn series_data(&self) -> &[Season] {
        match &self.variant {
            CatalogVariant::Series { series_data } => series_data,
            CatalogVariant::Movie { .. } => &[],
        }
    }

    /// Episodes nested under `seriesData`
    pub fn seasonal_episode_count(&self) -> usize {
        self.series_data().iter().map(|s| s.episodes.len()).sum()
    }

    /// Episodes in the flat admin-appended list
    pub fn appended_episode_count(&self) -> usize {
        self.appended_episodes.len()
    }

    /// True when both episode representations are populated on one document.
    ///
    /// The two lists are never merged; callers that display episodes decide
    /// which one they trust.
    pub fn has_parallel_episode_lists(&self) -> bool {
        !self.appended_episodes.is_empty() && !self.series_data().is_empty()
    }
}
