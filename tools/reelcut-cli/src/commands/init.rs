//! Create a new empty project.

use std::path::PathBuf;

use reelcut_project_model::Project;

pub fn run(path: PathBuf, fps: u32, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if fps == 0 {
        anyhow::bail!("fps must be positive");
    }

    let project = Project {
        fps,
        ..Project::new()
    };
    super::store(&project, &path)?;

    println!("Created project: {}", path.display());
    println!("  FPS: {fps}");
    for track in &project.tracks {
        println!("  Track {} ({})", track.name, track.id);
    }
    Ok(())
}
