//! Track management.

use std::path::PathBuf;

use reelcut_project_model::TrackKind;

pub fn add(path: PathBuf, kind: String) -> anyhow::Result<()> {
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "video" | "v" => TrackKind::Video,
        "audio" | "a" => TrackKind::Audio,
        other => anyhow::bail!("Unknown track kind: {other}. Use: video, audio"),
    };

    let mut project = super::open(&path)?;
    let id = project.add_track(kind);
    super::store(&project, &path)?;

    let name = project.track(&id).map(|t| t.name.as_str()).unwrap_or("?");
    println!("Added track {name} ({id})");
    Ok(())
}

pub fn remove(path: PathBuf, track: String) -> anyhow::Result<()> {
    let mut project = super::open(&path)?;
    let id = super::track_id(&project, &track)?;
    let removed = project.remove_track(&id)?;
    super::store(&project, &path)?;

    println!(
        "Removed track {} ({} clip(s))",
        removed.name,
        removed.clips.len()
    );
    Ok(())
}

pub fn move_by(path: PathBuf, track: String, delta: isize) -> anyhow::Result<()> {
    let mut project = super::open(&path)?;
    let id = super::track_id(&project, &track)?;
    if !project.move_track(&id, delta)? {
        println!("Track order unchanged");
        return Ok(());
    }
    super::store(&project, &path)?;

    let order: Vec<&str> = project.tracks.iter().map(|t| t.name.as_str()).collect();
    println!("Track order: {}", order.join(", "));
    Ok(())
}
