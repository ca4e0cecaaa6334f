//! Add a source file to a track.

use std::path::PathBuf;

use reelcut_common::AppConfig;
use reelcut_project_model::{add_clip_end, insert_clip_before, TrackKind};
use reelcut_render_engine::MediaProbe;

pub fn run(
    config: &AppConfig,
    path: PathBuf,
    src: PathBuf,
    track: String,
    before: Option<String>,
) -> anyhow::Result<()> {
    let mut project = super::open(&path)?;
    let track_id = super::track_id(&project, &track)?;

    let tools = super::tools(config)?;
    let src = std::fs::canonicalize(&src)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", src.display()))?
        .display()
        .to_string();
    let info = tools.probe().probe(&src)?;

    let Some(target) = project.track(&track_id) else {
        anyhow::bail!("Track not found: {track}");
    };
    if target.kind == TrackKind::Video && !info.has_video {
        anyhow::bail!("{} requires a video stream: {src}", target.name);
    }
    if target.kind == TrackKind::Audio && !info.has_audio {
        anyhow::bail!("{} requires an audio stream: {src}", target.name);
    }
    if info.duration <= 0.0 {
        anyhow::bail!("Could not determine the duration of {src}");
    }

    let outcome = match before {
        Some(clip_id) => {
            insert_clip_before(&target.clips, &clip_id, &src, info.duration, info.has_audio)
        }
        None => add_clip_end(&target.clips, &src, info.duration, info.has_audio),
    };
    super::commit(&mut project, &path, &track_id, outcome)
}
