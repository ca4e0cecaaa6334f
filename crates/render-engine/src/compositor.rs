//! Multi-track composition: overlaying video tracks, fitting the final
//! frame, and choosing which audio reaches the output.

use std::fmt;
use std::str::FromStr;

use reelcut_common::ReelcutError;
use reelcut_project_model::ExportSettings;

use crate::graph::{AudioOp, FilterGraph, Pad, VideoOp};

/// Which tracks' audio ends up in the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioMode {
    /// Every audible track: video tracks' own audio plus every audio track.
    #[default]
    Mix,
    /// Only the first non-empty audio track.
    FirstAudioTrackOnly,
    /// Only the base video track's own audio.
    VideoTrackOnly,
}

impl AudioMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioMode::Mix => "mix",
            AudioMode::FirstAudioTrackOnly => "a1_only",
            AudioMode::VideoTrackOnly => "v1_only",
        }
    }
}

impl fmt::Display for AudioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioMode {
    type Err = ReelcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mix" => Ok(AudioMode::Mix),
            "a1_only" => Ok(AudioMode::FirstAudioTrackOnly),
            "v1_only" => Ok(AudioMode::VideoTrackOnly),
            other => Err(ReelcutError::validation(format!(
                "Unknown audio mode: {other} (expected mix, a1_only or v1_only)"
            ))),
        }
    }
}

/// Stack `layers` over `base` in order; later layers end up on top.
///
/// Each layer is cut to `duration` first, so a longer overlay track cannot
/// carry the picture past the end of the base track.
pub fn overlay_tracks(graph: &mut FilterGraph, base: Pad, layers: &[Pad], duration: f64) -> Pad {
    let end = duration.max(0.0);
    layers.iter().fold(base, |below, &above| {
        let lane = graph.video(vec![above], vec![VideoOp::Trim { start: 0.0, end }]);
        graph.video(vec![below, lane], vec![VideoOp::Overlay])
    })
}

/// Final video stage: restart timestamps and, with a target size, scale to
/// fit and pad to exactly that size.
pub fn finalize_video(graph: &mut FilterGraph, video: Pad, settings: &ExportSettings) -> Pad {
    let mut ops = vec![VideoOp::ResetTimestamps];
    if settings.has_target_size() {
        ops.push(VideoOp::Fit {
            width: settings.width(),
            height: settings.height(),
        });
    }
    graph.video(vec![video], ops)
}

/// Silence lasting `duration` seconds.
pub fn silence(graph: &mut FilterGraph, duration: f64) -> Pad {
    graph.audio(
        vec![],
        vec![
            AudioOp::Silence,
            AudioOp::Trim {
                start: 0.0,
                end: duration.max(0.0),
            },
            AudioOp::ResetTimestamps,
        ],
    )
}

/// Combine the selected audio branches into one stream of exactly
/// `duration` seconds.
///
/// Each branch is padded with silence and cut to the duration before
/// mixing, so the mix never ends early or runs long. No branches at all
/// yields silence.
pub fn mix_audio(graph: &mut FilterGraph, selected: &[Pad], duration: f64) -> Pad {
    let duration = duration.max(0.0);
    if selected.is_empty() {
        return silence(graph, duration);
    }

    let fitted: Vec<Pad> = selected
        .iter()
        .map(|&pad| {
            graph.audio(
                vec![pad],
                vec![
                    AudioOp::PadSilence,
                    AudioOp::Trim {
                        start: 0.0,
                        end: duration,
                    },
                ],
            )
        })
        .collect();

    if fitted.len() == 1 {
        graph.audio(fitted, vec![AudioOp::ResetTimestamps])
    } else {
        let inputs = fitted.len();
        graph.audio(fitted, vec![AudioOp::Mix { inputs }])
    }
}
