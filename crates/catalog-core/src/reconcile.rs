// Schema reconciliation between the two submission shapes and the one stored
// document shape. Encoding validates and writes; decoding is total.

use catalog_models::{
    AdminAppendedEpisode, CatalogItem, CatalogKind, CatalogVariant, Categories, Episode, Season, UserRecord,
};
use catalog_store::{Document, Fields};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::submission::{CatalogSubmission, CommonFields};


/// Stored field names. These are part of the boundary contract with every
/// other client of the collection.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const TRAILER_URL: &str = "trailerUrl";
    pub const POSTER_URL: &str = "posterUrl";
    pub const BANNER_URL: &str = "bannerUrl";
    pub const SYNOPSIS: &str = "synopsis";
    pub const RELEASE_DATE: &str = "releaseDate";
    pub const CATEGORIES: &str = "categories";
    pub const CREATED_AT: &str = "createdAt";
    pub const KIND: &str = "kind";
    pub const DOWNLOAD_URL: &str = "downloadUrl";
    pub const FILL: &str = "fill";
    pub const SERIES_DATA: &str = "seriesData";
    /// Flat admin-appended list, independent of `seriesData`
    pub const EPISODES: &str = "episodes";
    pub const SEASON: &str = "season";
    pub const EPISODE: &str = "episode";
    pub const EPISODE_TITLE: &str = "episodeTitle";
    pub const DOWNLOAD_LINK: &str = "downloadLink";
}

const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredCommon<'a> {
    title: &'a str,
    trailer_url: &'a str,
    poster_url: &'a str,
    banner_url: &'a str,
    synopsis: &'a str,
    release_date: &'a str,
    categories: &'a Categories,
    created_at: String,
    kind: &'static str,
}

#[derive(Serialize)]
struct StoredSeason<'a> {
    season: &'a str,
    episodes: Vec<StoredEpisode<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredEpisode<'a> {
    episode: &'a str,
    episode_title: &'a str,
    download_link: &'a str,
}

impl<'a> From<&'a Season> for StoredSeason<'a> {
    fn from(season: &'a Season) -> Self {
        Self {
            season: &season.season,
            episodes: season
                .episodes
                .iter()
                .map(|e| StoredEpisode {
                    episode: &e.episode,
                    episode_title: &e.title,
                    download_link: &e.download_link,
                })
                .collect(),
        }
    }
}

/// Required common fields that are blank or malformed, in form order
pub fn missing_common_fields(common: &CommonFields) -> Vec<String> {
    let mut missing = Vec::new();
    if common.title.trim().is_empty() {
        missing.push(fields::TITLE.to_string());
    }
    if NaiveDate::parse_from_str(common.release_date.trim(), RELEASE_DATE_FORMAT).is_err() {
        missing.push(fields::RELEASE_DATE.to_string());
    }
    if common.synopsis.trim().is_empty() {
        missing.push(fields::SYNOPSIS.to_string());
    }
    missing
}

/// Check everything the store write needs before any store call is made.
/// All problems are reported at once.
pub fn validate_submission(submission: &CatalogSubmission) -> Result<()> {
    let mut missing = missing_common_fields(&submission.common);
    match &submission.variant {
        CatalogVariant::Movie { download_url, .. } => {
            if download_url.trim().is_empty() {
                missing.push(fields::DOWNLOAD_URL.to_string());
            }
        }
        CatalogVariant::Series { series_data } => {
            if series_data.iter().all(|s| s.episodes.is_empty()) {
                missing.push(fields::SERIES_DATA.to_string());
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::ValidationFailure { fields: missing })
    }
}

/// Build the stored document for a submission.
///
/// Movie documents get `downloadUrl` and `fill` and never `seriesData`;
/// series documents get `seriesData` and never the movie fields. Episode
/// titles are written as `episodeTitle`.
pub fn encode_submission(submission: &CatalogSubmission, created_at: DateTime<Utc>) -> Result<Fields> {
    validate_submission(submission)?;

    let common = &submission.common;
    let stored = StoredCommon {
        title: common.title.trim(),
        trailer_url: common.trailer_url.trim(),
        poster_url: common.poster_url.trim(),
        banner_url: common.banner_url.trim(),
        synopsis: common.synopsis.trim(),
        release_date: common.release_date.trim(),
        categories: &common.categories,
        created_at: created_at.to_rfc3339(),
        kind: submission.kind().as_str(),
    };

    let mut document = match serde_json::to_value(stored)? {
        Value::Object(map) => map,
        _ => Fields::new(),
    };

    match &submission.variant {
        CatalogVariant::Movie { download_url, fill } => {
            document.insert(fields::DOWNLOAD_URL.to_string(), Value::String(download_url.trim().to_string()));
            document.insert(fields::FILL.to_string(), Value::Bool(*fill));
        }
        CatalogVariant::Series { series_data } => {
            // Seasons sealed with no episodes carry nothing worth storing
            let seasons: Vec<StoredSeason> = series_data
                .iter()
                .filter(|s| !s.episodes.is_empty())
                .map(StoredSeason::from)
                .collect();
            document.insert(fields::SERIES_DATA.to_string(), serde_json::to_value(seasons)?);
        }
    }

    Ok(document)
}

/// Stored form of the flat admin episode list
pub fn encode_appended_episodes(episodes: &[AdminAppendedEpisode]) -> Result<Value> {
    Ok(serde_json::to_value(episodes)?)
}

/// Decide the variant of a stored document.
///
/// Non-empty episode lists win over everything, then an explicit `kind`,
/// then Movie. Documents older than the `kind` field land here too.
pub fn infer_kind(data: &Fields) -> CatalogKind {
    if non_empty_array(data, fields::EPISODES) || non_empty_array(data, fields::SERIES_DATA) {
        return CatalogKind::Series;
    }
    data
        .get(fields::KIND)
        .and_then(Value::as_str)
        .and_then(CatalogKind::parse)
        .unwrap_or(CatalogKind::Movie)
}

/// Decode a stored catalog document. Never fails: missing or ill-typed
/// fields fall back to empty values.
pub fn decode_document(document: &Document) -> CatalogItem {
    let data = &document.fields;

    let variant = match infer_kind(data) {
        CatalogKind::Movie => CatalogVariant::Movie {
            download_url: string_field(data, fields::DOWNLOAD_URL),
            fill: data.get(fields::FILL).and_then(Value::as_bool).unwrap_or(false),
        },
        CatalogKind::Series => CatalogVariant::Series {
            series_data: decode_series_data(data.get(fields::SERIES_DATA)),
        },
    };

    let item = CatalogItem {
        id: document.id.clone(),
        title: string_field(data, fields::TITLE),
        trailer_url: string_field(data, fields::TRAILER_URL),
        poster_url: string_field(data, fields::POSTER_URL),
        banner_url: string_field(data, fields::BANNER_URL),
        synopsis: string_field(data, fields::SYNOPSIS),
        release_date: string_field(data, fields::RELEASE_DATE),
        categories: decode_categories(data.get(fields::CATEGORIES)),
        created_at: data.get(fields::CREATED_AT).and_then(decode_timestamp),
        variant,
        appended_episodes: decode_appended_episodes(data.get(fields::EPISODES)),
    };

    if item.has_parallel_episode_lists() {
        debug!(
            "Catalog item {} carries both seriesData ({} seasons) and {} appended episodes; keeping both",
            item.id,
            item.series_data().len(),
            item.appended_episodes.len()
        );
    }

    item
}

pub fn decode_user(document: &Document) -> UserRecord {
    UserRecord::new(document.id.clone(), document.fields.clone())
}

/// The flat admin list of a stored document, used by the append path
pub fn appended_episodes(document: &Document) -> Vec<AdminAppendedEpisode> {
    decode_appended_episodes(document.field(fields::EPISODES))
}

fn non_empty_array(data: &Fields, key: &str) -> bool {
    data.get(key)
        .and_then(Value::as_array)
        .map(|a| !a.is_empty())
        .unwrap_or(false)
}

fn scalar_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn string_field(data: &Fields, key: &str) -> String {
    scalar_to_string(data.get(key))
}

fn decode_categories(value: Option<&Value>) -> Categories {
    let values = value
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();
    Categories::from_values(values)
}

/// Accepts RFC 3339 strings, `{seconds, nanoseconds}` objects and epoch
/// milliseconds
fn decode_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)),
        Value::Object(map) => {
            let seconds = map.get("seconds").and_then(Value::as_i64)?;
            let nanos = map.get("nanoseconds").and_then(Value::as_u64).unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?).single()
        }
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn decode_series_data(value: Option<&Value>) -> Vec<Season> {
    let Some(seasons) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    seasons
        .iter()
        .filter_map(Value::as_object)
        .map(|season| Season {
            season: scalar_to_string(season.get(fields::SEASON)),
            episodes: season
                .get(fields::EPISODES)
                .and_then(Value::as_array)
                .map(|episodes| episodes.iter().filter_map(Value::as_object).map(decode_episode).collect())
                .unwrap_or_default(),
        })
        .collect()
}

fn decode_episode(episode: &Fields) -> Episode {
    // Older documents stored the wizard's `title` key unchanged
    let title = episode
        .get(fields::EPISODE_TITLE)
        .or_else(|| episode.get(fields::TITLE));
    Episode {
        episode: scalar_to_string(episode.get(fields::EPISODE)),
        title: scalar_to_string(title),
        download_link: scalar_to_string(episode.get(fields::DOWNLOAD_LINK)),
    }
}

fn decode_appended_episodes(value: Option<&Value>) -> Vec<AdminAppendedEpisode> {
    let Some(episodes) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    episodes
        .iter()
        .filter_map(Value::as_object)
        .map(|episode| AdminAppendedEpisode {
            title: scalar_to_string(episode.get(fields::TITLE)),
            season: scalar_to_string(episode.get(fields::SEASON)),
            episode: scalar_to_string(episode.get(fields::EPISODE)),
            download_link: scalar_to_string(episode.get(fields::DOWNLOAD_LINK)),
        })
        .collect()
}
