pub mod add;
pub mod check;
pub mod edit;
pub mod export;
pub mod info;
pub mod init;
pub mod probe;
pub mod track;

use std::path::Path;

use reelcut_common::AppConfig;
use reelcut_project_model::{load_project, save_project, EditOutcome, Project};
use reelcut_render_engine::EngineTools;

pub(crate) fn open(path: &Path) -> anyhow::Result<Project> {
    load_project(path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))
}

pub(crate) fn store(project: &Project, path: &Path) -> anyhow::Result<()> {
    save_project(project, path).map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))
}

pub(crate) fn tools(config: &AppConfig) -> anyhow::Result<EngineTools> {
    EngineTools::resolve(&config.tools).map_err(|e| {
        anyhow::anyhow!(
            "{e}. Install ffmpeg or set the tool paths in {}",
            reelcut_common::config_file_path().display()
        )
    })
}

/// Id of the track with this id or name.
pub(crate) fn track_id(project: &Project, id_or_name: &str) -> anyhow::Result<String> {
    project
        .find_track(id_or_name)
        .map(|t| t.id.clone())
        .ok_or_else(|| anyhow::anyhow!("Track not found: {id_or_name}"))
}

/// Write an edit back into `track_id` and save, or report why nothing
/// changed.
pub(crate) fn commit(
    project: &mut Project,
    path: &Path,
    track_id: &str,
    outcome: EditOutcome,
) -> anyhow::Result<()> {
    if !outcome.is_changed() {
        println!("{}", outcome.status);
        return Ok(());
    }

    let clip_count = outcome.clips.len();
    project.set_track_clips(track_id, outcome.clips)?;
    store(project, path)?;
    tracing::debug!(track = track_id, clips = clip_count, path = %path.display(), "Saved edit");
    match outcome.selected {
        Some(id) => println!("{} (clip {id})", outcome.status),
        None => println!("{}", outcome.status),
    }
    Ok(())
}
