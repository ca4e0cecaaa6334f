//! Tracks: ordered lanes of clips.

use serde::{Deserialize, Serialize};

use crate::clip::{new_id, Clip};
use crate::lenient;
use crate::timeline::total_duration;

/// What a track carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    /// Prefix used for auto-generated track names (`V1`, `A2`, ...).
    pub fn name_prefix(&self) -> &'static str {
        match self {
            TrackKind::Video => "V",
            TrackKind::Audio => "A",
        }
    }
}

/// An ordered lane of clips of one kind.
///
/// The track owns its clips exclusively; order is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default = "new_id", deserialize_with = "lenient::id")]
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    pub kind: TrackKind,

    #[serde(default, deserialize_with = "lenient::flag_or_false")]
    pub muted: bool,

    #[serde(default = "default_visible", deserialize_with = "lenient::flag_or_true")]
    pub visible: bool,

    #[serde(default)]
    pub clips: Vec<Clip>,
}

fn default_visible() -> bool {
    true
}

impl Track {
    /// Create an empty, audible, visible track.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            muted: false,
            visible: true,
            clips: Vec::new(),
        }
    }

    pub fn with_clips(mut self, clips: Vec<Clip>) -> Self {
        self.clips = clips;
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == TrackKind::Video
    }

    pub fn is_audio(&self) -> bool {
        self.kind == TrackKind::Audio
    }

    /// Whether the track's own audio reaches the output.
    pub fn is_audible(&self) -> bool {
        self.visible && !self.muted
    }

    /// Timeline length of the track, transitions included.
    pub fn duration(&self) -> f64 {
        total_duration(&self.clips)
    }
}
