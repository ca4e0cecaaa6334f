//! Show project information.

use std::path::PathBuf;

use reelcut_common::format_clock_stamp;
use reelcut_project_model::TrackKind;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project = super::open(&path)?;

    println!("Project: {}", path.display());
    println!("  FPS: {}", project.fps);
    println!(
        "  Export duration: {}",
        format_clock_stamp(project.export_duration())
    );
    println!("  Sources: {}", project.source_files().len());
    println!();

    for track in &project.tracks {
        let kind = match track.kind {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
        };
        let mut flags = Vec::new();
        if track.muted {
            flags.push("muted");
        }
        if !track.visible {
            flags.push("hidden");
        }
        println!(
            "{} [{}] {kind}, {} clip(s), {}{}",
            track.name,
            track.id,
            track.clips.len(),
            format_clock_stamp(track.duration()),
            if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            }
        );

        let mut start = 0.0;
        for (i, clip) in track.clips.iter().enumerate() {
            if i > 0 {
                start -= reelcut_project_model::transition_overlap(&track.clips[i - 1], clip);
            }
            let transition = clip
                .transition_in
                .map(|t| format!(" <{} {:.2}s>", t.kind.as_str(), t.duration))
                .unwrap_or_default();
            println!(
                "  {:>2}. {} {} [{:.3}-{:.3}] at {} x{:.2} vol {:.2}{}{}",
                i + 1,
                clip.id,
                clip.name(),
                clip.in_sec,
                clip.out_sec,
                format_clock_stamp(start),
                clip.effective_speed(),
                clip.volume,
                if clip.muted { " muted" } else { "" },
                transition
            );
            start += clip.duration();
        }
    }

    Ok(())
}
