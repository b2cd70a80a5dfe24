use super::prompts::{prompt_list, prompt_required, prompt_string, prompt_yes_no};
use super::{fail, Console};
use crate::output::Output;
use catalog_core::{CatalogError, CatalogSubmission, SubmissionWizard, WizardAction, WizardError};
use catalog_models::{CatalogKind, Episode};
use clap::Args;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;

/// Fields shared by `add-movie` and `add-series`
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long)]
    pub title: String,

    /// Release date as YYYY-MM-DD
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub release_date: String,

    #[arg(long)]
    pub synopsis: String,

    #[arg(long, default_value = "")]
    pub trailer_url: String,

    #[arg(long, default_value = "")]
    pub poster_url: String,

    #[arg(long, default_value = "")]
    pub banner_url: String,

    /// Genre (repeatable)
    #[arg(long = "category", value_name = "GENRE")]
    pub categories: Vec<String>,
}

impl CommonArgs {
    fn into_actions(self) -> Vec<WizardAction> {
        let mut actions = vec![
            WizardAction::SetTitle(self.title),
            WizardAction::SetReleaseDate(self.release_date),
            WizardAction::SetSynopsis(self.synopsis),
            WizardAction::SetTrailerUrl(self.trailer_url),
            WizardAction::SetPosterUrl(self.poster_url),
            WizardAction::SetBannerUrl(self.banner_url),
        ];
        actions.extend(self.categories.into_iter().map(WizardAction::AddCategory));
        actions
    }
}

/// One `--episode SEASON:EPISODE:TITLE:LINK` value
#[derive(Debug, Clone, PartialEq)]
struct EpisodeSpec {
    season: String,
    episode: Episode,
}

/// The link is the last part, so it may contain colons itself
fn parse_episode_spec(raw: &str) -> std::result::Result<EpisodeSpec, String> {
    let parts: Vec<&str> = raw.splitn(4, ':').map(str::trim).collect();
    match parts.as_slice() {
        [season, episode, title, link] if parts.iter().all(|p| !p.is_empty()) => Ok(EpisodeSpec {
            season: season.to_string(),
            episode: Episode::new(*episode, *title, *link),
        }),
        _ => Err(format!("Invalid episode '{}', expected SEASON:EPISODE:TITLE:LINK", raw)),
    }
}

fn movie_submission(
    common: CommonArgs,
    download_url: String,
    fill: bool,
) -> std::result::Result<CatalogSubmission, WizardError> {
    let mut wizard = SubmissionWizard::new();
    for action in common.into_actions() {
        wizard.apply(action)?;
    }
    wizard.apply(WizardAction::SetDownloadUrl(download_url))?;
    if fill {
        wizard.apply(WizardAction::ToggleFill)?;
    }
    wizard.submit()
}

/// Consecutive episodes sharing a season label are sealed into one season
fn series_submission(
    common: CommonArgs,
    episodes: &[EpisodeSpec],
) -> std::result::Result<CatalogSubmission, WizardError> {
    let mut wizard = SubmissionWizard::new();
    for action in common.into_actions() {
        wizard.apply(action)?;
    }
    wizard.apply(WizardAction::SetSeries(true))?;
    wizard.apply(WizardAction::Next)?;

    let mut current: Option<&str> = None;
    for spec in episodes {
        if current != Some(spec.season.as_str()) {
            wizard.apply(WizardAction::FinalizeSeason)?;
            wizard.apply(WizardAction::SetSeasonLabel(spec.season.clone()))?;
            current = Some(spec.season.as_str());
        }
        wizard.apply(WizardAction::AddEpisode(spec.episode.clone()))?;
    }
    wizard.submit()
}

fn wizard_fail(output: &Output, err: WizardError) -> color_eyre::Report {
    match err {
        WizardError::Validation(fields) => fail(output, CatalogError::ValidationFailure { fields }),
        other => {
            output.error(other.to_string());
            color_eyre::Report::new(other)
        }
    }
}

async fn create(console: &Console, submission: CatalogSubmission, output: &Output) -> Result<()> {
    let kind = submission.kind();
    let title = submission.common.title.trim().to_string();

    let id = console
        .gateway()
        .create(&submission)
        .await
        .map_err(|e| fail(output, e))?;
    console.save()?;

    let noun = match kind {
        CatalogKind::Movie => "Movie",
        CatalogKind::Series => "Series",
    };
    output.success(format!("{} '{}' added with id {}", noun, title, id));
    output.json(&json!({ "type": "created", "id": id, "kind": kind, "title": title }));
    Ok(())
}

pub async fn run_add_movie(
    console: &Console,
    common: CommonArgs,
    download_url: String,
    fill: bool,
    output: &Output,
) -> Result<()> {
    let submission = movie_submission(common, download_url, fill).map_err(|e| wizard_fail(output, e))?;
    create(console, submission, output).await
}

pub async fn run_add_series(
    console: &Console,
    common: CommonArgs,
    episodes: Vec<String>,
    output: &Output,
) -> Result<()> {
    let specs = episodes
        .iter()
        .map(|raw| parse_episode_spec(raw))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            output.error(&e);
            eyre!(e)
        })?;

    let submission = series_submission(common, &specs).map_err(|e| wizard_fail(output, e))?;
    create(console, submission, output).await
}

pub async fn run_add_interactive(console: &Console, output: &Output) -> Result<()> {
    if !output.is_human() {
        return Err(eyre!("Interactive add needs --output human"));
    }

    let mut wizard = SubmissionWizard::new();
    let submission = loop {
        prompt_common(&mut wizard, output)?;

        if !wizard.is_series() {
            match wizard.submit() {
                Ok(submission) => break submission,
                Err(WizardError::Validation(fields)) => {
                    output.catalog_error(&CatalogError::ValidationFailure { fields });
                    continue;
                }
                Err(e) => return Err(wizard_fail(output, e)),
            }
        }

        match wizard.apply(WizardAction::Next) {
            Ok(()) => break prompt_seasons(&mut wizard, output)?,
            Err(WizardError::Validation(fields)) => {
                output.catalog_error(&CatalogError::ValidationFailure { fields });
            }
            Err(e) => return Err(wizard_fail(output, e)),
        }
    };

    create(console, submission, output).await
}

fn apply(wizard: &mut SubmissionWizard, action: WizardAction, output: &Output) -> Result<()> {
    wizard.apply(action).map_err(|e| wizard_fail(output, e))
}

/// First step; current values are offered as defaults when re-prompting
fn prompt_common(wizard: &mut SubmissionWizard, output: &Output) -> Result<()> {
    output.info(format!("Step {} of 2: details", wizard.step().index() + 1));
    let common = wizard.common().clone();

    let title = prompt_required("Title", Some(&common.title))?;
    apply(wizard, WizardAction::SetTitle(title), output)?;
    let release_date = prompt_required("Release date (YYYY-MM-DD)", Some(&common.release_date))?;
    apply(wizard, WizardAction::SetReleaseDate(release_date), output)?;
    let synopsis = prompt_required("Synopsis", Some(&common.synopsis))?;
    apply(wizard, WizardAction::SetSynopsis(synopsis), output)?;
    let trailer = prompt_string("Trailer URL", Some(&common.trailer_url))?;
    apply(wizard, WizardAction::SetTrailerUrl(trailer), output)?;
    let poster = prompt_string("Poster URL", Some(&common.poster_url))?;
    apply(wizard, WizardAction::SetPosterUrl(poster), output)?;
    let banner = prompt_string("Banner URL", Some(&common.banner_url))?;
    apply(wizard, WizardAction::SetBannerUrl(banner), output)?;

    let categories = prompt_list("Categories (comma separated)", common.categories.as_slice())?;
    for existing in common.categories.iter() {
        apply(wizard, WizardAction::RemoveCategory(existing.to_string()), output)?;
    }
    for category in categories {
        apply(wizard, WizardAction::AddCategory(category), output)?;
    }

    let series = prompt_yes_no("Is this a series?", Some(wizard.is_series()))?;
    apply(wizard, WizardAction::SetSeries(series), output)?;

    if !series {
        let download_url = prompt_required("Download URL", Some(wizard.download_url()))?;
        apply(wizard, WizardAction::SetDownloadUrl(download_url), output)?;
        let fill = prompt_yes_no("Show poster in fill mode?", Some(wizard.fill()))?;
        if fill != wizard.fill() {
            apply(wizard, WizardAction::ToggleFill, output)?;
        }
    }
    Ok(())
}

/// Second step: seasons of episodes, then submit
fn prompt_seasons(wizard: &mut SubmissionWizard, output: &Output) -> Result<CatalogSubmission> {
    output.info(format!("Step {} of 2: seasons and episodes", wizard.step().index() + 1));
    loop {
        let ordinal = (wizard.series_data().len() + 1).to_string();
        let label = prompt_string("Season", Some(&ordinal))?;
        apply(wizard, WizardAction::SetSeasonLabel(label), output)?;

        loop {
            let episode = prompt_required("  Episode", None)?;
            let title = prompt_required("  Episode title", None)?;
            let link = prompt_required("  Download link", None)?;
            apply(wizard, WizardAction::AddEpisode(Episode::new(episode, title, link)), output)?;
            if !prompt_yes_no("  Add another episode to this season?", Some(true))? {
                break;
            }
        }
        apply(wizard, WizardAction::FinalizeSeason, output)?;
        output.info(format!("{} season(s) so far", wizard.series_data().len()));

        if !prompt_yes_no("Add another season?", Some(false))? {
            break;
        }
    }

    wizard.submit().map_err(|e| wizard_fail(output, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_models::CatalogVariant;

    fn common(title: &str) -> CommonArgs {
        CommonArgs {
            title: title.to_string(),
            release_date: "2024-05-01".to_string(),
            synopsis: "...".to_string(),
            trailer_url: String::new(),
            poster_url: String::new(),
            banner_url: String::new(),
            categories: vec!["Thriller".to_string(), "Thriller".to_string()],
        }
    }

    fn spec(raw: &str) -> EpisodeSpec {
        parse_episode_spec(raw).unwrap()
    }

    #[test]
    fn test_parse_episode_spec_keeps_link_colons() {
        let parsed = spec("1:1:Pilot:https://x/e1");
        assert_eq!(parsed.season, "1");
        assert_eq!(parsed.episode, Episode::new("1", "Pilot", "https://x/e1"));
    }

    #[test]
    fn test_parse_episode_spec_rejects_short_or_blank() {
        assert!(parse_episode_spec("1:1:Pilot").is_err());
        assert!(parse_episode_spec("1: :Pilot:https://x").is_err());
    }

    #[test]
    fn test_movie_submission_from_flags() {
        let submission = movie_submission(common("Nocturne"), "https://x/d".to_string(), true).unwrap();
        assert_eq!(submission.common.categories.len(), 1);
        assert_eq!(
            submission.variant,
            CatalogVariant::Movie { download_url: "https://x/d".to_string(), fill: true }
        );
    }

    #[test]
    fn test_movie_submission_reports_missing_fields() {
        let mut args = common("");
        args.release_date = "May 1".to_string();
        args.synopsis = " ".to_string();
        let err = movie_submission(args, String::new(), false).unwrap_err();
        assert_eq!(
            err,
            WizardError::Validation(vec![
                "title".to_string(),
                "releaseDate".to_string(),
                "synopsis".to_string(),
                "downloadUrl".to_string()
            ])
        );
    }

    #[test]
    fn test_series_submission_groups_consecutive_seasons() {
        let specs = vec![
            spec("1:1:Pilot:https://x/s1e1"),
            spec("1:2:Second:https://x/s1e2"),
            spec("2:1:Return:https://x/s2e1"),
        ];
        let submission = series_submission(common("Lighthouse"), &specs).unwrap();
        match submission.variant {
            CatalogVariant::Series { series_data } => {
                assert_eq!(series_data.len(), 2);
                assert_eq!(series_data[0].season, "1");
                assert_eq!(series_data[0].episodes.len(), 2);
                assert_eq!(series_data[1].season, "2");
                assert_eq!(series_data[1].episodes[0].title, "Return");
            }
            other => panic!("expected series, got {:?}", other),
        }
    }
}
