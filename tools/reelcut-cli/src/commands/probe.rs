//! Show media stream information.

use std::path::PathBuf;

use reelcut_common::{format_clock_stamp, AppConfig};
use reelcut_render_engine::MediaProbe;

pub fn run(config: &AppConfig, src: PathBuf) -> anyhow::Result<()> {
    let tools = super::tools(config)?;
    let info = tools.probe().probe(&src.display().to_string())?;

    println!("File: {}", src.display());
    println!("  Duration: {}", format_clock_stamp(info.duration));
    println!("  Size: {} bytes", info.file_size_bytes);

    if info.has_video {
        println!(
            "  Video: {} {}x{} @ {:.3}fps, {} ({} kb/s)",
            info.video_codec,
            info.width,
            info.height,
            info.fps,
            info.pixel_format,
            info.video_bitrate / 1000
        );
    } else {
        println!("  Video: none");
    }

    if info.has_audio {
        println!(
            "  Audio: {} {} Hz, {} channel(s) ({} kb/s)",
            info.audio_codec,
            info.sample_rate,
            info.channels,
            info.audio_bitrate / 1000
        );
    } else {
        println!("  Audio: none");
    }

    Ok(())
}
