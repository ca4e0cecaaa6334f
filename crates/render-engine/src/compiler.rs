//! Lowering an edit-decision list into an ffmpeg filter graph.
//!
//! Two entry points:
//! - [`compile_timeline`] renders one flat clip list, trusting each clip's
//!   `has_audio` flag (no probing).
//! - [`compile_project`] renders a multi-track project. Every source is
//!   probed once; video tracks are overlaid on the base track and audio is
//!   picked according to an [`AudioMode`].
//!
//! Each clip becomes a video node and/or an audio node. A track is then
//! folded left to right: hard cuts concatenate, transitions cross-fade at
//! `accumulated - overlap`.

use std::collections::HashMap;

use reelcut_common::{ReelcutError, ReelcutResult};
use reelcut_project_model::{
    transition_overlap, Clip, ExportSettings, Project, Track, TrackKind, TransitionKind,
    DEFAULT_FPS,
};

use crate::compositor::{finalize_video, mix_audio, overlay_tracks, AudioMode};
use crate::graph::{tempo_stages, AudioOp, FilterGraph, Pad, VideoOp, XfadeKind};
use crate::probe::{MediaInfo, MediaProbe};

/// Label of the final video stream.
pub const VIDEO_SINK: &str = "vout";

/// Label of the final audio stream.
pub const AUDIO_SINK: &str = "aout";

/// A compiled export, ready to become an ffmpeg command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExport {
    /// Source files in `-i` order.
    pub inputs: Vec<String>,
    /// `-filter_complex` text producing [`VIDEO_SINK`] and [`AUDIO_SINK`].
    pub filter_complex: String,
    /// Output length in seconds.
    pub duration: f64,
    pub settings: ExportSettings,
    /// Output frame rate, when the caller pins one.
    pub fps: Option<u32>,
}

/// Unique sources in first-use order.
#[derive(Debug, Default)]
struct SourceTable {
    paths: Vec<String>,
    index: HashMap<String, usize>,
}

impl SourceTable {
    fn from_clips<'a>(clips: impl IntoIterator<Item = &'a Clip>) -> Self {
        let mut table = Self::default();
        for clip in clips {
            if !table.index.contains_key(&clip.src) {
                table.index.insert(clip.src.clone(), table.paths.len());
                table.paths.push(clip.src.clone());
            }
        }
        table
    }

    fn index_of(&self, src: &str) -> ReelcutResult<usize> {
        self.index
            .get(src)
            .copied()
            .ok_or_else(|| ReelcutError::render(format!("source not registered: {src}")))
    }
}

/// Output pads of one clip or of a folded track.
#[derive(Debug, Clone, Copy)]
struct Lane {
    video: Option<Pad>,
    audio: Option<Pad>,
    duration: f64,
}

fn xfade_kind(kind: TransitionKind) -> XfadeKind {
    match kind {
        TransitionKind::Dissolve => XfadeKind::Dissolve,
        TransitionKind::Fade | TransitionKind::Crossfade => XfadeKind::Fade,
    }
}

fn is_retimed(clip: &Clip) -> bool {
    (clip.effective_speed() - 1.0).abs() > 1e-9
}

fn lower_video(graph: &mut FilterGraph, input: usize, clip: &Clip) -> Pad {
    let timestamps = if is_retimed(clip) {
        VideoOp::RetimeTimestamps {
            speed: clip.effective_speed(),
        }
    } else {
        VideoOp::ResetTimestamps
    };
    graph.video(
        vec![Pad::input_video(input)],
        vec![
            VideoOp::Trim {
                start: clip.in_sec,
                end: clip.out_sec,
            },
            timestamps,
        ],
    )
}

/// Real audio of the clip, or silence of the clip's duration when
/// `audible` is false.
fn lower_audio(graph: &mut FilterGraph, input: usize, clip: &Clip, audible: bool) -> Pad {
    if !audible {
        return crate::compositor::silence(graph, clip.duration());
    }

    let mut ops = vec![
        AudioOp::Trim {
            start: clip.in_sec,
            end: clip.out_sec,
        },
        AudioOp::ResetTimestamps,
        AudioOp::Canonicalize,
        AudioOp::Volume {
            gain: clip.volume.max(0.0),
        },
    ];
    ops.extend(tempo_stages(clip.effective_speed()));
    graph.audio(vec![Pad::input_audio(input)], ops)
}

fn join(
    graph: &mut FilterGraph,
    acc: Option<Pad>,
    next: Option<Pad>,
    build: impl FnOnce(&mut FilterGraph, Pad, Pad) -> Pad,
) -> Option<Pad> {
    match (acc, next) {
        (Some(acc), Some(next)) => Some(build(graph, acc, next)),
        (acc, _) => acc,
    }
}

/// Fold a track's per-clip lanes into one, left to right.
fn fold_track(graph: &mut FilterGraph, clips: &[Clip], lanes: Vec<Lane>) -> ReelcutResult<Lane> {
    if clips.is_empty() || clips.len() != lanes.len() {
        return Err(ReelcutError::validation("Timeline is empty"));
    }

    let mut lanes = lanes.into_iter();
    let mut acc = match lanes.next() {
        Some(first) => first,
        None => return Err(ReelcutError::validation("Timeline is empty")),
    };

    for (pair, next) in clips.windows(2).zip(lanes) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let overlap = transition_overlap(prev, curr);

        if overlap > 0.0 {
            let kind = curr
                .transition_in
                .map(|t| xfade_kind(t.kind))
                .unwrap_or(XfadeKind::Fade);
            let offset = (acc.duration - overlap).max(0.0);
            acc.video = join(graph, acc.video, next.video, |g, a, b| {
                g.video(
                    vec![a, b],
                    vec![VideoOp::Xfade {
                        kind,
                        duration: overlap,
                        offset,
                    }],
                )
            });
            acc.audio = join(graph, acc.audio, next.audio, |g, a, b| {
                g.audio(vec![a, b], vec![AudioOp::CrossFade { duration: overlap }])
            });
            acc.duration += next.duration - overlap;
        } else {
            acc.video = join(graph, acc.video, next.video, |g, a, b| {
                g.video(vec![a, b], vec![VideoOp::Concat { segments: 2 }])
            });
            acc.audio = join(graph, acc.audio, next.audio, |g, a, b| {
                g.audio(vec![a, b], vec![AudioOp::Concat { segments: 2 }])
            });
            acc.duration += next.duration;
        }
    }

    acc.duration = acc.duration.max(0.0);
    Ok(acc)
}

/// Compile a single linear timeline.
///
/// Each clip's audio is used unless it is muted or flagged `has_audio =
/// false`, in which case silence of the same length stands in.
pub fn compile_timeline(clips: &[Clip], settings: &ExportSettings) -> ReelcutResult<CompiledExport> {
    if clips.is_empty() {
        return Err(ReelcutError::validation("Timeline is empty"));
    }

    let sources = SourceTable::from_clips(clips);
    let mut graph = FilterGraph::new();

    let mut lanes = Vec::with_capacity(clips.len());
    for clip in clips {
        let input = sources.index_of(&clip.src)?;
        let video = lower_video(&mut graph, input, clip);
        let audio = lower_audio(&mut graph, input, clip, clip.has_audio && !clip.muted);
        lanes.push(Lane {
            video: Some(video),
            audio: Some(audio),
            duration: clip.duration(),
        });
    }

    let folded = fold_track(&mut graph, clips, lanes)?;
    let (video, audio) = match (folded.video, folded.audio) {
        (Some(video), Some(audio)) => (video, audio),
        _ => return Err(ReelcutError::render("timeline produced no streams")),
    };
    let video_out = finalize_video(&mut graph, video, settings);
    let audio_out = graph.audio(vec![audio], vec![AudioOp::ResetTimestamps]);

    let filter_complex = graph.render(&[(video_out, VIDEO_SINK), (audio_out, AUDIO_SINK)])?;
    tracing::info!(
        inputs = sources.paths.len(),
        clips = clips.len(),
        duration = folded.duration,
        "Compiled timeline export"
    );

    Ok(CompiledExport {
        inputs: sources.paths,
        filter_complex,
        duration: folded.duration,
        settings: settings.clone(),
        fps: None,
    })
}

/// Lower and fold one track. Video tracks yield video plus their own
/// audio; audio tracks yield audio only.
fn compile_track(
    graph: &mut FilterGraph,
    track: &Track,
    sources: &SourceTable,
    infos: &HashMap<String, MediaInfo>,
) -> ReelcutResult<Lane> {
    let mut lanes = Vec::with_capacity(track.clips.len());
    for clip in &track.clips {
        let input = sources.index_of(&clip.src)?;
        let source_has_audio = infos.get(&clip.src).is_some_and(|info| info.has_audio);
        let audible = !clip.muted && clip.has_audio && source_has_audio && track.is_audible();

        let video = match track.kind {
            TrackKind::Video => Some(lower_video(graph, input, clip)),
            TrackKind::Audio => None,
        };
        let audio = lower_audio(graph, input, clip, audible);
        lanes.push(Lane {
            video,
            audio: Some(audio),
            duration: clip.duration(),
        });
    }
    fold_track(graph, &track.clips, lanes)
}

/// Compile a multi-track project.
///
/// - The base video track (first visible non-empty one, else first
///   non-empty one) sets the canvas and the export duration.
/// - Other visible, non-empty video tracks are overlaid in track order.
/// - Audio is chosen by `audio_mode` and fitted to the export duration.
///
/// Fails before anything runs when the project has nothing to export, when
/// a video-track clip's source has no video stream, or when probing fails.
pub fn compile_project(
    project: &Project,
    settings: &ExportSettings,
    audio_mode: AudioMode,
    probe: &dyn MediaProbe,
) -> ReelcutResult<CompiledExport> {
    let base = project
        .base_video_track()
        .ok_or_else(|| ReelcutError::validation("Timeline is empty"))?;

    let sources = SourceTable::from_clips(project.tracks.iter().flat_map(|t| t.clips.iter()));
    let mut infos = HashMap::with_capacity(sources.paths.len());
    for src in &sources.paths {
        infos.insert(src.clone(), probe.probe(src)?);
    }

    for track in project.video_tracks() {
        for clip in &track.clips {
            if !infos.get(&clip.src).is_some_and(|info| info.has_video) {
                return Err(ReelcutError::validation(format!(
                    "{} requires a video stream: {}",
                    track.name,
                    clip.name()
                )));
            }
        }
    }

    let mut graph = FilterGraph::new();

    let mut video_lanes: Vec<(&Track, Lane)> = Vec::new();
    for track in project.video_tracks().filter(|t| !t.clips.is_empty()) {
        let lane = compile_track(&mut graph, track, &sources, &infos)?;
        video_lanes.push((track, lane));
    }
    let mut audio_lanes: Vec<(&Track, Lane)> = Vec::new();
    for track in project.audio_tracks().filter(|t| !t.clips.is_empty()) {
        let lane = compile_track(&mut graph, track, &sources, &infos)?;
        audio_lanes.push((track, lane));
    }

    let base_lane = video_lanes
        .iter()
        .find(|(track, _)| track.id == base.id)
        .map(|(_, lane)| *lane)
        .ok_or_else(|| ReelcutError::render("base video track was not compiled"))?;
    let base_video = base_lane
        .video
        .ok_or_else(|| ReelcutError::render("base video track has no video"))?;
    let duration = base_lane.duration;

    let layers: Vec<Pad> = video_lanes
        .iter()
        .filter(|(track, _)| track.id != base.id && track.visible)
        .filter_map(|(_, lane)| lane.video)
        .collect();
    let composed = overlay_tracks(&mut graph, base_video, &layers, duration);
    let video_out = finalize_video(&mut graph, composed, settings);

    let selected: Vec<Pad> = match audio_mode {
        AudioMode::VideoTrackOnly => base_lane.audio.into_iter().collect(),
        AudioMode::FirstAudioTrackOnly => audio_lanes
            .first()
            .and_then(|(_, lane)| lane.audio)
            .into_iter()
            .collect(),
        AudioMode::Mix => video_lanes
            .iter()
            .chain(audio_lanes.iter())
            .filter(|(track, _)| track.is_audible())
            .filter_map(|(_, lane)| lane.audio)
            .collect(),
    };
    let audio_out = mix_audio(&mut graph, &selected, duration);

    let filter_complex = graph.render(&[(video_out, VIDEO_SINK), (audio_out, AUDIO_SINK)])?;
    tracing::info!(
        inputs = sources.paths.len(),
        video_tracks = video_lanes.len(),
        audio_tracks = audio_lanes.len(),
        overlays = layers.len(),
        audio_inputs = selected.len(),
        audio_mode = %audio_mode,
        duration,
        "Compiled project export"
    );

    Ok(CompiledExport {
        inputs: sources.paths,
        filter_complex,
        duration,
        settings: settings.clone(),
        fps: Some(if project.fps > 0 { project.fps } else { DEFAULT_FPS }),
    })
}

/// Compile the older two-list layout: one video lane and one audio lane.
pub fn compile_clip_lists(
    video_clips: &[Clip],
    audio_clips: &[Clip],
    settings: &ExportSettings,
    audio_mode: AudioMode,
    probe: &dyn MediaProbe,
) -> ReelcutResult<CompiledExport> {
    let project = Project {
        fps: DEFAULT_FPS,
        tracks: vec![
            Track::new("v1", "V1", TrackKind::Video).with_clips(video_clips.to_vec()),
            Track::new("a1", "A1", TrackKind::Audio).with_clips(audio_clips.to_vec()),
        ],
    };
    compile_project(&project, settings, audio_mode, probe)
}
