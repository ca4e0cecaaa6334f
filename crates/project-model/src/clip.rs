//! Clips, transitions, and the duration arithmetic that joins them.
//!
//! A clip references a range of one source file; it never modifies the
//! source. Its `transition_in` blends it with whatever clip precedes it on
//! the same track. There is no back-pointer: "previous" is always the clip
//! one position earlier in the list being evaluated.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::lenient;

/// Slowest playback rate a clip may use.
pub const MIN_CLIP_SPEED: f64 = 0.25;

/// Fastest playback rate a clip may use.
pub const MAX_CLIP_SPEED: f64 = 4.0;

/// Margin kept between a transition and either clip's full length.
pub const TRANSITION_EPSILON_SEC: f64 = 0.01;

/// Duration given to transitions that were stored without one.
pub const DEFAULT_TRANSITION_SEC: f64 = 0.5;

/// Default guard against ultra-short pieces in split/trim.
pub const DEFAULT_MIN_PIECE_SEC: f64 = 0.08;

/// Generate a fresh clip/track identity.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Clamp a requested speed into the supported range.
///
/// Missing, non-finite, or non-positive values yield `default`.
pub fn normalize_speed(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(speed) if speed.is_finite() && speed > 0.0 => {
            speed.clamp(MIN_CLIP_SPEED, MAX_CLIP_SPEED)
        }
        _ => default.clamp(MIN_CLIP_SPEED, MAX_CLIP_SPEED),
    }
}

/// Blend applied where a clip overlaps its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Fade,
    Crossfade,
    Dissolve,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::Fade => "fade",
            TransitionKind::Crossfade => "crossfade",
            TransitionKind::Dissolve => "dissolve",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized transition kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transition kind: {0}")]
pub struct UnknownTransitionKind(pub String);

impl FromStr for TransitionKind {
    type Err = UnknownTransitionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fade" => Ok(TransitionKind::Fade),
            "crossfade" => Ok(TransitionKind::Crossfade),
            "dissolve" => Ok(TransitionKind::Dissolve),
            other => Err(UnknownTransitionKind(other.to_string())),
        }
    }
}

/// A timed cross-fade into a clip from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: TransitionKind,

    /// Requested overlap in seconds. The effective overlap is clamped
    /// against both neighbours whenever it is read.
    #[serde(alias = "duration_sec")]
    pub duration: f64,
}

impl Transition {
    pub fn new(kind: TransitionKind, duration: f64) -> Self {
        Self { kind, duration }
    }

    /// This transition limited to what a piece of `piece_duration` seconds
    /// can carry, or `None` if the piece is too short for any overlap.
    pub fn clamped_to(&self, piece_duration: f64) -> Option<Transition> {
        let limit = piece_duration - TRANSITION_EPSILON_SEC;
        let duration = self.duration.min(limit);
        (duration > 0.0).then_some(Transition::new(self.kind, duration))
    }
}

/// A non-destructive segment of one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Stable identity, unique within a project.
    #[serde(default = "new_id", deserialize_with = "lenient::id")]
    pub id: String,

    /// Path of the source media file.
    pub src: String,

    /// Absolute start offset into the source (seconds).
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub in_sec: f64,

    /// Absolute end offset into the source (seconds).
    #[serde(default, deserialize_with = "lenient::seconds")]
    pub out_sec: f64,

    /// Playback-rate multiplier in `[MIN_CLIP_SPEED, MAX_CLIP_SPEED]`.
    #[serde(default = "default_speed", deserialize_with = "lenient::speed")]
    pub speed: f64,

    /// Non-negative gain multiplier.
    #[serde(default = "default_volume", deserialize_with = "lenient::volume")]
    pub volume: f64,

    #[serde(default, deserialize_with = "lenient::flag_or_false")]
    pub muted: bool,

    /// Whether the source carries an audio stream, independent of `muted`.
    #[serde(default = "default_true", deserialize_with = "lenient::flag_or_true")]
    pub has_audio: bool,

    /// Cross-fade with the previous clip on the same track.
    #[serde(default, deserialize_with = "lenient::transition")]
    pub transition_in: Option<Transition>,
}

fn default_speed() -> f64 {
    1.0
}

fn default_volume() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Clip {
    /// Create a clip with a fresh identity and neutral playback settings.
    pub fn new(src: impl Into<String>, in_sec: f64, out_sec: f64) -> Self {
        Self {
            id: new_id(),
            src: src.into(),
            in_sec,
            out_sec,
            speed: 1.0,
            volume: 1.0,
            muted: false,
            has_audio: true,
            transition_in: None,
        }
    }

    /// Replace the identity (mostly for fixtures).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = normalize_speed(Some(speed), 1.0);
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition_in = Some(transition);
        self
    }

    pub fn with_has_audio(mut self, has_audio: bool) -> Self {
        self.has_audio = has_audio;
        self
    }

    /// Length of the source range in seconds, before speed is applied.
    pub fn source_duration(&self) -> f64 {
        (self.out_sec - self.in_sec).max(0.0)
    }

    /// Length on the output timeline: source range divided by speed.
    pub fn duration(&self) -> f64 {
        self.source_duration() / self.effective_speed()
    }

    /// Speed guarded against values set directly on the struct.
    pub fn effective_speed(&self) -> f64 {
        normalize_speed(Some(self.speed), 1.0)
    }

    /// Absolute source time for an offset measured on the output timeline.
    pub fn source_time_at(&self, timeline_offset_sec: f64) -> f64 {
        self.in_sec + timeline_offset_sec * self.effective_speed()
    }

    /// File name of the source, for display.
    pub fn name(&self) -> String {
        Path::new(&self.src)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.src.clone())
    }
}

/// Effective overlap between `prev` and `curr` in seconds.
///
/// Zero for a hard cut; otherwise the requested transition duration
/// clamped so that neither clip is consumed entirely.
pub fn transition_overlap(prev: &Clip, curr: &Clip) -> f64 {
    match &curr.transition_in {
        None => 0.0,
        Some(transition) => transition
            .duration
            .min(prev.duration() - TRANSITION_EPSILON_SEC)
            .min(curr.duration() - TRANSITION_EPSILON_SEC)
            .max(0.0),
    }
}
