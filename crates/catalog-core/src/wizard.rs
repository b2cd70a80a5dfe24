use catalog_models::{Categories, Episode, Season};
use std::fmt;
use thiserror::Error;

use crate::error::CatalogError;
use crate::reconcile::{missing_common_fields, validate_submission};
use crate::submission::{CatalogSubmission, CommonFields};

/// Where the two-step submission form currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    /// Step 0: title, dates, synopsis, categories, artwork, and the movie download URL
    CollectingCommon,
    /// Step 1: season/episode entry, only reachable for series
    CollectingSeriesDetail,
    Submitted,
}

impl WizardStep {
    pub fn index(&self) -> u8 {
        match self {
            WizardStep::CollectingCommon => 0,
            WizardStep::CollectingSeriesDetail => 1,
            WizardStep::Submitted => 2,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStep::CollectingCommon => f.write_str("collecting common fields"),
            WizardStep::CollectingSeriesDetail => f.write_str("collecting series detail"),
            WizardStep::Submitted => f.write_str("submitted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    SetTitle(String),
    SetReleaseDate(String),
    SetSynopsis(String),
    SetTrailerUrl(String),
    SetPosterUrl(String),
    SetBannerUrl(String),
    SetDownloadUrl(String),
    ToggleFill,
    SetSeries(bool),
    AddCategory(String),
    RemoveCategory(String),
    Next,
    Back,
    SetSeasonLabel(String),
    AddEpisode(Episode),
    RemoveEpisode(usize),
    FinalizeSeason,
    Reset,
}

impl WizardAction {
    pub fn name(&self) -> &'static str {
        match self {
            WizardAction::SetTitle(_) => "set title",
            WizardAction::SetReleaseDate(_) => "set release date",
            WizardAction::SetSynopsis(_) => "set synopsis",
            WizardAction::SetTrailerUrl(_) => "set trailer URL",
            WizardAction::SetPosterUrl(_) => "set poster URL",
            WizardAction::SetBannerUrl(_) => "set banner URL",
            WizardAction::SetDownloadUrl(_) => "set download URL",
            WizardAction::ToggleFill => "toggle fill",
            WizardAction::SetSeries(_) => "set series",
            WizardAction::AddCategory(_) => "add category",
            WizardAction::RemoveCategory(_) => "remove category",
            WizardAction::Next => "next",
            WizardAction::Back => "back",
            WizardAction::SetSeasonLabel(_) => "set season label",
            WizardAction::AddEpisode(_) => "add episode",
            WizardAction::RemoveEpisode(_) => "remove episode",
            WizardAction::FinalizeSeason => "finalize season",
            WizardAction::Reset => "reset",
        }
    }

    fn allowed_in(&self, step: WizardStep) -> bool {
        use WizardAction::*;
        match self {
            Reset => true,
            SetTitle(_) | SetReleaseDate(_) | SetSynopsis(_) | SetTrailerUrl(_) | SetPosterUrl(_)
            | SetBannerUrl(_) | SetDownloadUrl(_) | ToggleFill | SetSeries(_) | AddCategory(_)
            | RemoveCategory(_) | Next => step == WizardStep::CollectingCommon,
            Back | SetSeasonLabel(_) | AddEpisode(_) | RemoveEpisode(_) | FinalizeSeason => {
                step == WizardStep::CollectingSeriesDetail
            }
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum WizardError {
    #[error("'{action}' is not allowed while {step}")]
    InvalidAction { action: &'static str, step: WizardStep },

    #[error("only series have a second step; submit movies directly")]
    NotASeries,

    #[error("a series has to go through the episode step before submitting")]
    SeriesDetailPending,

    #[error("episode needs an episode label, a title and a download link")]
    IncompleteEpisode,

    #[error("no working episode at index {0}")]
    NoSuchEpisode(usize),

    #[error("missing or invalid: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// The submission could not be built for a reason other than its fields
    #[error("submission rejected: {0}")]
    Rejected(String),
}

impl From<CatalogError> for WizardError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ValidationFailure { fields } => WizardError::Validation(fields),
            other => WizardError::Rejected(other.to_string()),
        }
    }
}

/// Form state for creating one catalog entry.
///
/// All form data lives in this one value and only changes through
/// [`SubmissionWizard::apply`] and [`SubmissionWizard::submit`]. Starting over
/// means `Reset`, which replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionWizard {
    step: WizardStep,
    common: CommonFields,
    download_url: String,
    fill: bool,
    series: bool,
    season_label: String,
    working_episodes: Vec<Episode>,
    series_data: Vec<Season>,
}

impl Default for SubmissionWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::CollectingCommon,
            common: CommonFields::default(),
            download_url: String::new(),
            fill: false,
            series: false,
            season_label: String::new(),
            working_episodes: Vec::new(),
            series_data: Vec::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn common(&self) -> &CommonFields {
        &self.common
    }

    pub fn categories(&self) -> &Categories {
        &self.common.categories
    }

    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    pub fn fill(&self) -> bool {
        self.fill
    }

    pub fn is_series(&self) -> bool {
        self.series
    }

    pub fn season_label(&self) -> &str {
        &self.season_label
    }

    pub fn working_episodes(&self) -> &[Episode] {
        &self.working_episodes
    }

    pub fn series_data(&self) -> &[Season] {
        &self.series_data
    }

    /// Apply one form event. Rejected actions leave the wizard untouched.
    pub fn apply(&mut self, action: WizardAction) -> Result<(), WizardError> {
        if !action.allowed_in(self.step) {
            return Err(WizardError::InvalidAction {
                action: action.name(),
                step: self.step,
            });
        }

        match action {
            WizardAction::SetTitle(v) => self.common.title = v,
            WizardAction::SetReleaseDate(v) => self.common.release_date = v,
            WizardAction::SetSynopsis(v) => self.common.synopsis = v,
            WizardAction::SetTrailerUrl(v) => self.common.trailer_url = v,
            WizardAction::SetPosterUrl(v) => self.common.poster_url = v,
            WizardAction::SetBannerUrl(v) => self.common.banner_url = v,
            WizardAction::SetDownloadUrl(v) => self.download_url = v,
            WizardAction::ToggleFill => self.fill = !self.fill,
            WizardAction::SetSeries(v) => self.series = v,
            WizardAction::AddCategory(v) => {
                // Blank and duplicate genres are ignored, as in the form
                self.common.categories.insert(&v);
            }
            WizardAction::RemoveCategory(v) => {
                self.common.categories.remove(&v);
            }
            WizardAction::Next => {
                if !self.series {
                    return Err(WizardError::NotASeries);
                }
                let missing = missing_common_fields(&self.common);
                if !missing.is_empty() {
                    return Err(WizardError::Validation(missing));
                }
                self.step = WizardStep::CollectingSeriesDetail;
            }
            WizardAction::Back => self.step = WizardStep::CollectingCommon,
            WizardAction::SetSeasonLabel(v) => self.season_label = v,
            WizardAction::AddEpisode(episode) => {
                if !episode.is_complete() {
                    return Err(WizardError::IncompleteEpisode);
                }
                self.working_episodes.push(Episode {
                    episode: episode.episode.trim().to_string(),
                    title: episode.title.trim().to_string(),
                    download_link: episode.download_link.trim().to_string(),
                });
            }
            WizardAction::RemoveEpisode(index) => {
                if index >= self.working_episodes.len() {
                    return Err(WizardError::NoSuchEpisode(index));
                }
                self.working_episodes.remove(index);
            }
            WizardAction::FinalizeSeason => {
                self.finalize_season();
            }
            WizardAction::Reset => *self = Self::new(),
        }
        Ok(())
    }

    /// Seal the working episode list into a season. Returns false (and changes
    /// nothing) when there is nothing to seal.
    fn finalize_season(&mut self) -> bool {
        match sealed_season(&self.season_label, &self.working_episodes, self.series_data.len()) {
            Some(season) => {
                self.series_data.push(season);
                self.working_episodes.clear();
                self.season_label.clear();
                true
            }
            None => false,
        }
    }

    /// Produce the finished submission and enter `Submitted`.
    ///
    /// A series seals its pending working list first. On any error the wizard
    /// stays exactly as it was.
    pub fn submit(&mut self) -> Result<CatalogSubmission, WizardError> {
        let submission = match (self.step, self.series) {
            (WizardStep::CollectingCommon, false) => {
                CatalogSubmission::movie(self.common.clone(), self.download_url.clone(), self.fill)
            }
            (WizardStep::CollectingCommon, true) => return Err(WizardError::SeriesDetailPending),
            (WizardStep::CollectingSeriesDetail, _) => {
                let mut series_data = self.series_data.clone();
                if let Some(season) = sealed_season(&self.season_label, &self.working_episodes, series_data.len()) {
                    series_data.push(season);
                }
                CatalogSubmission::series(self.common.clone(), series_data)
            }
            (WizardStep::Submitted, _) => {
                return Err(WizardError::InvalidAction {
                    action: "submit",
                    step: self.step,
                })
            }
        };

        validate_submission(&submission)?;

        if let catalog_models::CatalogVariant::Series { series_data } = &submission.variant {
            self.series_data = series_data.clone();
            self.working_episodes.clear();
            self.season_label.clear();
        }
        self.step = WizardStep::Submitted;
        Ok(submission)
    }
}

fn sealed_season(label: &str, episodes: &[Episode], sealed_so_far: usize) -> Option<Season> {
    if episodes.is_empty() {
        return None;
    }
    let label = label.trim();
    let label = if label.is_empty() {
        (sealed_so_far + 1).to_string()
    } else {
        label.to_string()
    };
    Some(Season::new(label, episodes.to_vec()))
}
