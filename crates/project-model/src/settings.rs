//! Export settings and their normalizer.
//!
//! Settings arrive as a loosely-typed [`RawExportSettings`] record (from a
//! dialog, a config file, or command-line flags). [`normalize`] is the only
//! way to obtain an [`ExportSettings`], so the compiler never sees an
//! out-of-range number or an unsupported codec.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient;

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Mov,
    Webm,
}

impl Container {
    pub fn as_str(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mov => "mov",
            Container::Webm => "webm",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "mp4" => Some(Container::Mp4),
            "mov" => Some(Container::Mov),
            "webm" => Some(Container::Webm),
            _ => None,
        }
    }

    /// Codec pair the container mandates, if it mandates one.
    pub fn fixed_codecs(&self) -> Option<(VideoCodec, AudioCodec)> {
        match self {
            Container::Webm => Some((VideoCodec::LibvpxVp9, AudioCodec::Libopus)),
            Container::Mp4 | Container::Mov => None,
        }
    }

    /// Whether the container benefits from moving the index to the front.
    pub fn supports_faststart(&self) -> bool {
        matches!(self, Container::Mp4 | Container::Mov)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodec {
    #[serde(rename = "libx264")]
    Libx264,
    #[serde(rename = "libx265")]
    Libx265,
    #[serde(rename = "libvpx-vp9")]
    LibvpxVp9,
}

impl VideoCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoCodec::Libx264 => "libx264",
            VideoCodec::Libx265 => "libx265",
            VideoCodec::LibvpxVp9 => "libvpx-vp9",
        }
    }

    /// Codecs of the x26x family take a `-preset`.
    pub fn uses_preset(&self) -> bool {
        matches!(self, VideoCodec::Libx264 | VideoCodec::Libx265)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Aac,
    Libopus,
}

impl AudioCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCodec::Aac => "aac",
            AudioCodec::Libopus => "libopus",
        }
    }
}

/// x264/x265 speed/quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl Preset {
    pub const ALL: [Preset; 9] = [
        Preset::Ultrafast,
        Preset::Superfast,
        Preset::Veryfast,
        Preset::Faster,
        Preset::Fast,
        Preset::Medium,
        Preset::Slow,
        Preset::Slower,
        Preset::Veryslow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Ultrafast => "ultrafast",
            Preset::Superfast => "superfast",
            Preset::Veryfast => "veryfast",
            Preset::Faster => "faster",
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Slower => "slower",
            Preset::Veryslow => "veryslow",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Preset::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// Default constant-quality factor.
pub const DEFAULT_CRF: u8 = 23;

/// Highest constant-quality factor any offered codec accepts.
pub const MAX_CRF: u8 = 51;

/// Default audio bitrate.
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

/// Normalized encode parameters.
///
/// Only [`normalize`] builds these; every field is already valid. The
/// fields are private and the type is serialize-only, so a record cannot
/// be assembled or deserialized around the normalizer:
///
/// ```compile_fail
/// use reelcut_project_model::ExportSettings;
/// let s = ExportSettings::default();
/// let _ = ExportSettings { crf: 200, ..s };
/// ```
///
/// ```compile_fail
/// use reelcut_project_model::ExportSettings;
/// let _: ExportSettings = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSettings {
    width: u32,
    height: u32,
    video_codec: VideoCodec,
    crf: u8,
    audio_codec: AudioCodec,
    audio_bitrate: String,
    format: Container,
    preset: Preset,
}

impl ExportSettings {
    /// Target width; 0 together with `height() == 0` keeps the source size.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn video_codec(&self) -> VideoCodec {
        self.video_codec
    }

    pub fn crf(&self) -> u8 {
        self.crf
    }

    pub fn audio_codec(&self) -> AudioCodec {
        self.audio_codec
    }

    /// Lowercase bitrate such as `192k`.
    pub fn audio_bitrate(&self) -> &str {
        &self.audio_bitrate
    }

    pub fn format(&self) -> Container {
        self.format
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Whether the output should be scaled and padded to a fixed size.
    pub fn has_target_size(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        normalize(&RawExportSettings::default())
    }
}

/// Export settings as supplied by a caller, before validation.
///
/// Each field may hold any JSON value; unusable values fall back to
/// defaults in [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawExportSettings {
    pub width: Value,
    pub height: Value,
    pub video_codec: Value,
    pub crf: Value,
    pub audio_codec: Value,
    pub audio_bitrate: Value,
    pub format: Value,
    pub preset: Value,
}

impl RawExportSettings {
    /// Read a raw record from an arbitrary JSON value. Anything other than
    /// an object yields an empty record.
    pub fn from_value(value: &Value) -> Self {
        RawExportSettings::deserialize(value).unwrap_or_default()
    }

    /// Overlay the non-null fields of `other` onto this record.
    pub fn merged_with(mut self, other: &RawExportSettings) -> Self {
        let pairs = [
            (&mut self.width, &other.width),
            (&mut self.height, &other.height),
            (&mut self.video_codec, &other.video_codec),
            (&mut self.crf, &other.crf),
            (&mut self.audio_codec, &other.audio_codec),
            (&mut self.audio_bitrate, &other.audio_bitrate),
            (&mut self.format, &other.format),
            (&mut self.preset, &other.preset),
        ];
        for (mine, theirs) in pairs {
            if !theirs.is_null() {
                *mine = theirs.clone();
            }
        }
        self
    }
}

fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
}

fn dimension(value: &Value) -> u32 {
    lenient::integer(value)
        .map(|n| n.clamp(0, i64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}

fn is_bitrate(s: &str) -> bool {
    match s.strip_suffix(&['k', 'm'][..]) {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Turn a raw settings record into valid encode parameters.
///
/// - `format` must be mp4, mov or webm (default mp4).
/// - Width and height are non-negative; if either is 0 both become 0.
/// - `crf` is clamped to `0..=51` (default 23).
/// - `preset` must be a known x26x preset (default medium).
/// - `audio_bitrate` must look like `<digits>k` or `<digits>m` (default 192k).
/// - A container with a fixed codec pair overrides both codec fields.
///   Otherwise the video codec is libx264 or libx265 and audio is AAC.
pub fn normalize(raw: &RawExportSettings) -> ExportSettings {
    let format = text(&raw.format)
        .and_then(|s| Container::parse(&s))
        .unwrap_or(Container::Mp4);

    let (mut width, mut height) = (dimension(&raw.width), dimension(&raw.height));
    if width == 0 || height == 0 {
        width = 0;
        height = 0;
    }

    let crf = match &raw.crf {
        Value::Null => DEFAULT_CRF,
        other => lenient::integer(other)
            .map(|n| n.clamp(0, i64::from(MAX_CRF)) as u8)
            .unwrap_or(DEFAULT_CRF),
    };

    let preset = text(&raw.preset)
        .and_then(|s| Preset::parse(&s))
        .unwrap_or(Preset::Medium);

    let audio_bitrate = text(&raw.audio_bitrate)
        .filter(|s| is_bitrate(s))
        .unwrap_or_else(|| DEFAULT_AUDIO_BITRATE.to_string());

    let (video_codec, audio_codec) = format.fixed_codecs().unwrap_or_else(|| {
        let video = match text(&raw.video_codec).as_deref() {
            Some("libx265") => VideoCodec::Libx265,
            _ => VideoCodec::Libx264,
        };
        (video, AudioCodec::Aac)
    });

    ExportSettings {
        width,
        height,
        video_codec,
        crf,
        audio_codec,
        audio_bitrate,
        format,
        preset,
    }
}
