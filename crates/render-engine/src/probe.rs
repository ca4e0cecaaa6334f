//! Media probing via ffprobe.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use reelcut_common::{ReelcutError, ReelcutResult};

/// Stream and container facts about one source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Container duration in seconds.
    pub duration: f64,
    pub has_video: bool,
    pub has_audio: bool,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub video_codec: String,
    pub audio_codec: String,
    /// Bits per second, 0 when unknown.
    pub video_bitrate: u64,
    pub audio_bitrate: u64,
    pub file_size_bytes: u64,
    pub pixel_format: String,
    pub sample_rate: u32,
    pub channels: u32,
}

/// Anything that can describe a source file.
///
/// The compiler only needs stream presence; it takes a probe so tests can
/// substitute canned answers.
pub trait MediaProbe {
    fn probe(&self, src: &str) -> ReelcutResult<MediaInfo>;
}

/// Probe that shells out to `ffprobe -print_format json`.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    ffprobe: PathBuf,
}

impl FfprobeProbe {
    pub fn new(ffprobe: impl AsRef<Path>) -> Self {
        Self {
            ffprobe: ffprobe.as_ref().to_path_buf(),
        }
    }
}

impl MediaProbe for FfprobeProbe {
    fn probe(&self, src: &str) -> ReelcutResult<MediaInfo> {
        let path = Path::new(src);
        if !path.exists() {
            return Err(ReelcutError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let args = [
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ];
        let output = Command::new(&self.ffprobe)
            .args(args)
            .arg(path)
            .output()
            .map_err(|e| {
                ReelcutError::probe(format!(
                    "Failed to start {}: {e}",
                    self.ffprobe.display()
                ))
            })?;

        if !output.status.success() {
            let mut argv = vec![self.ffprobe.display().to_string()];
            argv.extend(args.iter().map(|a| a.to_string()));
            argv.push(src.to_string());
            return Err(ReelcutError::ProcessFailed {
                code: output.status.code(),
                args: argv,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut info = parse_probe_json(&stdout)?;
        if info.file_size_bytes == 0 {
            info.file_size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        }
        tracing::debug!(
            src,
            duration = info.duration,
            has_video = info.has_video,
            has_audio = info.has_audio,
            "Probed media"
        );
        Ok(info)
    }
}

fn float(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite() && *f >= 0.0).unwrap_or(0.0)
}

fn unsigned(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

fn text(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Frame rate from a rational such as `30000/1001`.
fn frame_rate(value: Option<&Value>) -> f64 {
    let Some(raw) = value.and_then(Value::as_str) else {
        return 0.0;
    };
    let (num, den) = raw.split_once('/').unwrap_or((raw, "1"));
    match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
        (Ok(num), Ok(den)) if den != 0.0 && (num / den).is_finite() => (num / den).max(0.0),
        _ => 0.0,
    }
}

/// Read ffprobe's `-show_format -show_streams` JSON.
///
/// Numbers may arrive as JSON numbers or strings; anything unreadable
/// becomes zero or empty. The first video and the first audio stream supply
/// the per-kind fields.
pub fn parse_probe_json(json: &str) -> ReelcutResult<MediaInfo> {
    let data: Value = serde_json::from_str(json)
        .map_err(|e| ReelcutError::probe(format!("Invalid ffprobe output: {e}")))?;

    let format = data.get("format");
    let mut info = MediaInfo {
        duration: float(format.and_then(|f| f.get("duration"))),
        file_size_bytes: unsigned(format.and_then(|f| f.get("size"))),
        ..MediaInfo::default()
    };

    let streams = data
        .get("streams")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for stream in streams {
        match stream.get("codec_type").and_then(Value::as_str) {
            Some("video") if !info.has_video => {
                info.has_video = true;
                info.width = unsigned(stream.get("width")).min(u64::from(u32::MAX)) as u32;
                info.height = unsigned(stream.get("height")).min(u64::from(u32::MAX)) as u32;
                info.fps = match frame_rate(stream.get("r_frame_rate")) {
                    fps if fps > 0.0 => fps,
                    _ => frame_rate(stream.get("avg_frame_rate")),
                };
                info.video_codec = text(stream.get("codec_name"));
                info.pixel_format = text(stream.get("pix_fmt"));
                info.video_bitrate = unsigned(stream.get("bit_rate"));
            }
            Some("audio") if !info.has_audio => {
                info.has_audio = true;
                info.audio_codec = text(stream.get("codec_name"));
                info.sample_rate = unsigned(stream.get("sample_rate")).min(u64::from(u32::MAX)) as u32;
                info.channels = unsigned(stream.get("channels")).min(u64::from(u32::MAX)) as u32;
                info.audio_bitrate = unsigned(stream.get("bit_rate"));
            }
            _ => {}
        }
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extended_fields() {
        let json = r#"{
            "format": {"duration": "12.34", "size": "1234567"},
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080,
                 "r_frame_rate": "30000/1001", "codec_name": "h264",
                 "pix_fmt": "yuv420p", "bit_rate": "8000000"},
                {"codec_type": "audio", "codec_name": "aac", "sample_rate": "48000",
                 "channels": 2, "bit_rate": "192000"}
            ]
        }"#;
        let info = parse_probe_json(json).unwrap();
        assert!((info.duration - 12.34).abs() < 1e-9);
        assert!(info.has_video);
        assert!(info.has_audio);
        assert_eq!((info.width, info.height), (1920, 1080));
        assert!((info.fps - 30000.0 / 1001.0).abs() < 1e-6);
        assert_eq!(info.video_codec, "h264");
        assert_eq!(info.audio_codec, "aac");
        assert_eq!(info.video_bitrate, 8_000_000);
        assert_eq!(info.audio_bitrate, 192_000);
        assert_eq!(info.file_size_bytes, 1_234_567);
        assert_eq!(info.pixel_format, "yuv420p");
        assert_eq!(info.sample_rate, 48_000);
        assert_eq!(info.channels, 2);
    }

    #[test]
    fn test_parse_video_only_with_garbage() {
        let json = r#"{
            "format": {"duration": "n/a"},
            "streams": [
                {"codec_type": "video", "width": "wide", "r_frame_rate": "0/0",
                 "avg_frame_rate": "25/1"},
                {"codec_type": "video", "codec_name": "second"}
            ]
        }"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.duration, 0.0);
        assert!(info.has_video);
        assert!(!info.has_audio);
        assert_eq!(info.width, 0);
        assert!((info.fps - 25.0).abs() < 1e-9);
        assert_eq!(info.video_codec, "");
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_probe_json("not json").is_err());
    }

    #[test]
    fn test_probe_missing_file() {
        let probe = FfprobeProbe::new("ffprobe");
        let err = probe.probe("/no/such/media.mp4").unwrap_err();
        assert!(matches!(err, ReelcutError::FileNotFound { .. }));
    }
}
