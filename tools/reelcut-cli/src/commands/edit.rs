//! Single-clip timeline edits.
//!
//! Every command loads the project, runs one edit against the track holding
//! the clip, and saves only when the edit changed something.

use std::path::PathBuf;

use reelcut_common::AppConfig;
use reelcut_project_model::{
    duplicate_clip, move_clip_before, remove_clip, set_audio, set_speed, set_transition,
    split_at_timeline_sec, split_clip, trim_clip, Clip, EditOutcome, TransitionKind,
};

fn edit_clip(
    path: PathBuf,
    clip_id: &str,
    edit: impl FnOnce(&[Clip]) -> EditOutcome,
) -> anyhow::Result<()> {
    let mut project = super::open(&path)?;
    let (track_id, clips) = project
        .find_clip(clip_id)
        .map(|(track, _)| (track.id.clone(), track.clips.clone()))
        .ok_or_else(|| anyhow::anyhow!("Clip not found: {clip_id}"))?;

    let outcome = edit(&clips);
    super::commit(&mut project, &path, &track_id, outcome)
}

pub fn split(
    config: &AppConfig,
    path: PathBuf,
    clip: Option<String>,
    at: f64,
    track: String,
) -> anyhow::Result<()> {
    let min_piece = config.editing.min_piece_sec;
    match clip {
        Some(clip_id) => edit_clip(path, &clip_id, |clips| {
            split_clip(clips, &clip_id, at, min_piece)
        }),
        None => {
            let mut project = super::open(&path)?;
            let track_id = super::track_id(&project, &track)?;
            let clips = project
                .track(&track_id)
                .map(|t| t.clips.clone())
                .unwrap_or_default();
            let outcome = split_at_timeline_sec(&clips, at, min_piece);
            super::commit(&mut project, &path, &track_id, outcome)
        }
    }
}

pub fn trim(
    config: &AppConfig,
    path: PathBuf,
    clip: String,
    in_sec: f64,
    out_sec: f64,
) -> anyhow::Result<()> {
    let min_piece = config.editing.min_piece_sec;
    edit_clip(path, &clip, |clips| {
        trim_clip(clips, &clip, in_sec, out_sec, min_piece)
    })
}

pub fn duplicate(path: PathBuf, clip: String) -> anyhow::Result<()> {
    edit_clip(path, &clip, |clips| duplicate_clip(clips, &clip))
}

pub fn move_before(path: PathBuf, clip: String, before: Option<String>) -> anyhow::Result<()> {
    // An id that matches no clip moves to the end.
    let target = before.unwrap_or_default();
    edit_clip(path, &clip, |clips| move_clip_before(clips, &clip, &target))
}

pub fn remove(path: PathBuf, clip: String) -> anyhow::Result<()> {
    edit_clip(path, &clip, |clips| remove_clip(clips, &clip))
}

pub fn transition(
    config: &AppConfig,
    path: PathBuf,
    clip: String,
    kind: String,
    duration: Option<f64>,
) -> anyhow::Result<()> {
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "none" | "cut" => None,
        other => Some(other.parse::<TransitionKind>()?),
    };
    let duration = duration.unwrap_or(config.editing.default_transition_sec);
    edit_clip(path, &clip, |clips| set_transition(clips, &clip, kind, duration))
}

pub fn speed(path: PathBuf, clip: String, speed: f64) -> anyhow::Result<()> {
    edit_clip(path, &clip, |clips| set_speed(clips, &clip, speed))
}

pub fn audio(
    path: PathBuf,
    clip: String,
    volume: Option<f64>,
    muted: Option<bool>,
) -> anyhow::Result<()> {
    if volume.is_none() && muted.is_none() {
        anyhow::bail!("Nothing to change: pass --volume, --mute or --unmute");
    }
    edit_clip(path, &clip, |clips| set_audio(clips, &clip, volume, muted))
}
