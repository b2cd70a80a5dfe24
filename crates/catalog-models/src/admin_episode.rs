use serde::{Deserialize, Serialize};

/// Flat episode record appended from the overview screen.
///
/// Lives in the document's top-level `episodes` list, next to (and independent
/// of) the nested `seriesData` written at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminAppendedEpisode {
    pub title: String,
    pub season: String,
    pub episode: String,
    pub download_link: String,
}

impl AdminAppendedEpisode {
    pub fn new(
        title: impl Into<String>,
        season: impl Into<String>,
        episode: impl Into<String>,
        download_link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            season: season.into(),
            episode: episode.into(),
            download_link: download_link.into(),
        }
    }

    /// Names of the fields that are blank, in form order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.season.trim().is_empty() {
            missing.push("season");
        }
        if self.episode.trim().is_empty() {
            missing.push("episode");
        }
        if self.download_link.trim().is_empty() {
            missing.push("downloadLink");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_flat_camel_case() {
        let episode = AdminAppendedEpisode::new("Pilot", "1", "1", "https://x/e1");
        let value = serde_json::to_value(&episode).unwrap();
        assert_eq!(value["title"], "Pilot");
        assert_eq!(value["downloadLink"], "https://x/e1");
        assert!(value.get("download_link").is_none());
    }

    #[test]
    fn test_missing_fields() {
        let episode = AdminAppendedEpisode::new("Pilot", " ", "", "https://x/e1");
        assert_eq!(episode.missing_fields(), vec!["season", "episode"]);
        assert!(AdminAppendedEpisode::new("a", "b", "c", "d").missing_fields().is_empty());
    }
}
