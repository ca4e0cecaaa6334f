//! Encoder arguments and full ffmpeg command assembly.

use std::path::Path;

use reelcut_project_model::{ExportSettings, VideoCodec};

use crate::compiler::{CompiledExport, AUDIO_SINK, VIDEO_SINK};
use crate::runner::EngineCommand;

/// Codec, quality, pixel-format and container arguments.
///
/// x264/x265 use `-crf` with a `-preset`; VP9 uses `-crf` with an
/// unconstrained bitrate (`-b:v 0`), which is its constant-quality mode.
pub fn encode_args(settings: &ExportSettings) -> Vec<String> {
    let mut args = vec!["-c:v".to_string(), settings.video_codec().as_str().to_string()];

    match settings.video_codec() {
        VideoCodec::Libx264 | VideoCodec::Libx265 => args.extend([
            "-crf".to_string(),
            settings.crf().to_string(),
            "-preset".to_string(),
            settings.preset().as_str().to_string(),
        ]),
        VideoCodec::LibvpxVp9 => args.extend([
            "-crf".to_string(),
            settings.crf().to_string(),
            "-b:v".to_string(),
            "0".to_string(),
        ]),
    }

    args.extend(
        ["-pix_fmt", "yuv420p", "-c:a", settings.audio_codec().as_str(), "-b:a"].map(String::from),
    );
    args.push(settings.audio_bitrate().to_string());

    if settings.format().supports_faststart() {
        args.extend(["-movflags", "+faststart"].map(String::from));
    }
    args.extend(["-f", settings.format().as_str()].map(String::from));
    args
}

impl CompiledExport {
    /// The complete ffmpeg invocation writing this export to `output`.
    ///
    /// The output path is always the last argument.
    pub fn command(&self, ffmpeg: impl AsRef<Path>, output: impl AsRef<Path>) -> EngineCommand {
        let mut args = vec!["-y".to_string(), "-hide_banner".to_string()];
        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.clone());
        }
        args.extend([
            "-filter_complex".to_string(),
            self.filter_complex.clone(),
            "-map".to_string(),
            format!("[{VIDEO_SINK}]"),
            "-map".to_string(),
            format!("[{AUDIO_SINK}]"),
        ]);
        if let Some(fps) = self.fps {
            args.push("-r".to_string());
            args.push(fps.to_string());
        }
        args.extend(encode_args(&self.settings));
        args.push(output.as_ref().display().to_string());

        EngineCommand::new(ffmpeg.as_ref(), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcut_project_model::{normalize, RawExportSettings};
    use serde_json::json;

    fn settings(value: serde_json::Value) -> ExportSettings {
        normalize(&RawExportSettings::from_value(&value))
    }

    #[test]
    fn test_default_mp4_args() {
        assert_eq!(
            encode_args(&ExportSettings::default()),
            vec![
                "-c:v", "libx264", "-crf", "23", "-preset", "medium", "-pix_fmt", "yuv420p",
                "-c:a", "aac", "-b:a", "192k", "-movflags", "+faststart", "-f", "mp4"
            ]
        );
    }

    #[test]
    fn test_webm_args_use_vp9_quality_mode() {
        let args = encode_args(&settings(json!({"format": "webm", "crf": 30})));
        let joined = args.join(" ");
        assert!(joined.starts_with("-c:v libvpx-vp9 -crf 30 -b:v 0"));
        assert!(joined.contains("-c:a libopus"));
        assert!(!joined.contains("-preset"));
        assert!(!joined.contains("+faststart"));
        assert!(joined.ends_with("-f webm"));
    }

    #[test]
    fn test_invalid_raw_values_are_normalized_before_encoding() {
        let args = encode_args(&settings(json!({
            "format": "webm",
            "video_codec": "libx264",
            "audio_codec": "aac",
            "crf": 200,
            "audio_bitrate": "lots",
        })));
        let joined = args.join(" ");
        assert!(joined.starts_with("-c:v libvpx-vp9 -crf 51 -b:v 0"));
        assert!(joined.contains("-c:a libopus -b:a 192k"));
        assert!(!joined.contains("libx264"));
        assert!(!joined.contains("lots"));
    }

    #[test]
    fn test_command_layout() {
        let compiled = CompiledExport {
            inputs: vec!["a.mp4".into(), "b.mov".into()],
            filter_complex: "[0:v]null[vout];[1:a]anull[aout]".into(),
            duration: 1.0,
            settings: settings(json!({"format": "mov"})),
            fps: Some(25),
        };
        let command = compiled.command("/usr/bin/ffmpeg", "/tmp/out.mov");
        let argv = command.argv();
        assert_eq!(&argv[..4], ["/usr/bin/ffmpeg", "-y", "-hide_banner", "-i"]);
        assert_eq!(argv[4], "a.mp4");
        assert_eq!(argv[6], "b.mov");
        assert!(argv.windows(2).any(|w| w == ["-map", "[vout]"]));
        assert!(argv.windows(2).any(|w| w == ["-map", "[aout]"]));
        assert!(argv.windows(2).any(|w| w == ["-r", "25"]));
        assert!(argv.windows(2).any(|w| w == ["-f", "mov"]));
        assert_eq!(argv.last().map(String::as_str), Some("/tmp/out.mov"));
    }
}
