use super::{fail, Console};
use crate::output::Output;
use catalog_models::AdminAppendedEpisode;
use color_eyre::Result;
use serde_json::json;

pub async fn run_append_episode(
    console: &Console,
    id: String,
    title: String,
    season: String,
    episode: String,
    download_link: String,
    output: &Output,
) -> Result<()> {
    let episode = AdminAppendedEpisode::new(title, season, episode, download_link);
    let gateway = console.gateway();

    match gateway.append_episode(&id, episode).await {
        Ok(count) => {
            console.save()?;
            output.success(format!("Episode added to {} ({} appended episodes)", id, count));
            output.json(&json!({ "type": "episode_appended", "id": id, "episodes": count }));
            Ok(())
        }
        Err(err) => Err(fail(output, err)),
    }
}
