use serde::{Deserialize, Serialize};

/// One season of a series, sealed by the submission wizard.
///
/// `season` is a free-form label ("1", "Specials", "2024") and is never
/// sorted; seasons keep the order in which they were finalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Season {
    pub season: String,
    pub episodes: Vec<Episode>,
}

/// An episode as entered in the wizard.
///
/// Stored documents name the title `episodeTitle`; the rename happens in the
/// reconciler, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Episode {
    pub episode: String,
    pub title: String,
    pub download_link: String,
}

impl Episode {
    pub fn new(episode: impl Into<String>, title: impl Into<String>, download_link: impl Into<String>) -> Self {
        Self {
            episode: episode.into(),
            title: title.into(),
            download_link: download_link.into(),
        }
    }

    /// All three fields carry something other than whitespace
    pub fn is_complete(&self) -> bool {
        !self.episode.trim().is_empty()
            && !self.title.trim().is_empty()
            && !self.download_link.trim().is_empty()
    }
}

impl Season {
    pub fn new(season: impl Into<String>, episodes: Vec<Episode>) -> Self {
        Self {
            season: season.into(),
            episodes,
        }
    }
}
