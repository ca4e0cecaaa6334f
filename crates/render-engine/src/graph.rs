//! Typed filter graph.
//!
//! The compiler builds an explicit node graph: each node consumes a list of
//! pads (raw input streams or earlier nodes) and applies a chain of typed
//! filters, producing exactly one output. Labels are only assigned when the
//! graph is rendered to ffmpeg's `-filter_complex` syntax, so the compiler
//! never juggles label strings.
//!
//! Rendering keeps only the nodes that feed a sink. A branch that was built
//! but not selected (say, the audio of a track excluded by the audio mode)
//! disappears instead of leaving a dangling output, and its source streams
//! are never referenced.

use std::collections::HashMap;
use std::fmt;

use reelcut_common::{ReelcutError, ReelcutResult};

/// Canonical audio format every real or synthetic audio branch is given.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;
pub const AUDIO_CHANNEL_LAYOUT: &str = "stereo";

/// Limits of a single `atempo` stage.
pub const ATEMPO_MIN: f64 = 0.5;
pub const ATEMPO_MAX: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn specifier(&self) -> &'static str {
        match self {
            StreamKind::Video => "v",
            StreamKind::Audio => "a",
        }
    }
}

/// Handle to a node inside a [`FilterGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Something a filter can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pad {
    /// Stream of the `index`-th `-i` input, e.g. `[2:a]`.
    Input { index: usize, kind: StreamKind },
    /// Output of a node in the same graph.
    Node(NodeId),
}

impl Pad {
    pub fn input_video(index: usize) -> Self {
        Pad::Input {
            index,
            kind: StreamKind::Video,
        }
    }

    pub fn input_audio(index: usize) -> Self {
        Pad::Input {
            index,
            kind: StreamKind::Audio,
        }
    }
}

/// Blend used by `xfade`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XfadeKind {
    Fade,
    Dissolve,
}

impl XfadeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            XfadeKind::Fade => "fade",
            XfadeKind::Dissolve => "dissolve",
        }
    }
}

/// Filters applied to video.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoOp {
    /// Keep `[start, end)` of the source, in source seconds.
    Trim { start: f64, end: f64 },
    /// Restart timestamps at zero.
    ResetTimestamps,
    /// Restart timestamps at zero and play `speed` times faster.
    RetimeTimestamps { speed: f64 },
    /// Cross-fade from the first input into the second.
    Xfade {
        kind: XfadeKind,
        duration: f64,
        offset: f64,
    },
    /// Join the inputs end to end.
    Concat { segments: usize },
    /// Draw the second input over the first.
    Overlay,
    /// Scale into `width`x`height` keeping aspect, pad the rest black.
    Fit { width: u32, height: u32 },
}

/// Filters applied to audio.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioOp {
    /// Synthesized stereo silence (a source: takes no inputs).
    Silence,
    Trim { start: f64, end: f64 },
    ResetTimestamps,
    /// Resample to the canonical rate and layout.
    Canonicalize,
    Volume { gain: f64 },
    /// One time-stretch stage; the factor must lie in `[0.5, 2.0]`.
    Tempo { factor: f64 },
    /// Equal-power cross-fade from the first input into the second.
    CrossFade { duration: f64 },
    Concat { segments: usize },
    /// Extend with silence indefinitely.
    PadSilence,
    Mix { inputs: usize },
}

impl fmt::Display for VideoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoOp::Trim { start, end } => write!(f, "trim=start={start:.6}:end={end:.6}"),
            VideoOp::ResetTimestamps => f.write_str("setpts=PTS-STARTPTS"),
            VideoOp::RetimeTimestamps { speed } => write!(f, "setpts=(PTS-STARTPTS)/{speed:.6}"),
            VideoOp::Xfade {
                kind,
                duration,
                offset,
            } => write!(
                f,
                "xfade=transition={}:duration={duration:.6}:offset={offset:.6}",
                kind.as_str()
            ),
            VideoOp::Concat { segments } => write!(f, "concat=n={segments}:v=1:a=0"),
            VideoOp::Overlay => f.write_str("overlay=eof_action=pass"),
            VideoOp::Fit { width, height } => write!(
                f,
                "scale=w={width}:h={height}:force_original_aspect_ratio=decrease,\
                 pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1"
            ),
        }
    }
}

impl fmt::Display for AudioOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioOp::Silence => write!(
                f,
                "anullsrc=channel_layout={AUDIO_CHANNEL_LAYOUT}:sample_rate={AUDIO_SAMPLE_RATE}"
            ),
            AudioOp::Trim { start, end } => write!(f, "atrim=start={start:.6}:end={end:.6}"),
            AudioOp::ResetTimestamps => f.write_str("asetpts=PTS-STARTPTS"),
            AudioOp::Canonicalize => write!(
                f,
                "aformat=sample_rates={AUDIO_SAMPLE_RATE}:channel_layouts={AUDIO_CHANNEL_LAYOUT}"
            ),
            AudioOp::Volume { gain } => write!(f, "volume={gain:.2}"),
            AudioOp::Tempo { factor } => write!(f, "atempo={factor:.6}"),
            AudioOp::CrossFade { duration } => write!(f, "acrossfade=d={duration:.6}:c1=qsin:c2=qsin"),
            AudioOp::Concat { segments } => write!(f, "concat=n={segments}:v=0:a=1"),
            AudioOp::PadSilence => f.write_str("apad"),
            AudioOp::Mix { inputs } => {
                write!(f, "amix=inputs={inputs}:duration=first:dropout_transition=2")
            }
        }
    }
}

/// Split a playback-rate change into `atempo` stages that each stay within
/// the filter's accepted range. A rate of 1 needs no stage.
pub fn tempo_stages(speed: f64) -> Vec<AudioOp> {
    let mut stages = Vec::new();
    if !speed.is_finite() || speed <= 0.0 {
        return stages;
    }
    let mut remaining = speed;
    while remaining > ATEMPO_MAX {
        stages.push(AudioOp::Tempo { factor: ATEMPO_MAX });
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        stages.push(AudioOp::Tempo { factor: ATEMPO_MIN });
        remaining /= ATEMPO_MIN;
    }
    if (remaining - 1.0).abs() > 1e-9 {
        stages.push(AudioOp::Tempo { factor: remaining });
    }
    stages
}

#[derive(Debug, Clone)]
enum Node {
    Video { inputs: Vec<Pad>, ops: Vec<VideoOp> },
    Audio { inputs: Vec<Pad>, ops: Vec<AudioOp> },
}

impl Node {
    fn inputs(&self) -> &[Pad] {
        match self {
            Node::Video { inputs, .. } | Node::Audio { inputs, .. } => inputs,
        }
    }

    fn kind(&self) -> StreamKind {
        match self {
            Node::Video { .. } => StreamKind::Video,
            Node::Audio { .. } => StreamKind::Audio,
        }
    }

    fn chain(&self) -> String {
        match self {
            Node::Video { ops, .. } => join_ops(ops),
            Node::Audio { ops, .. } => join_ops(ops),
        }
    }
}

fn join_ops<T: fmt::Display>(ops: &[T]) -> String {
    ops.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// An append-only graph of filter nodes.
#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    nodes: Vec<Node>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a video node and return its output pad.
    pub fn video(&mut self, inputs: Vec<Pad>, ops: Vec<VideoOp>) -> Pad {
        self.push(Node::Video { inputs, ops })
    }

    /// Add an audio node and return its output pad.
    pub fn audio(&mut self, inputs: Vec<Pad>, ops: Vec<AudioOp>) -> Pad {
        self.push(Node::Audio { inputs, ops })
    }

    fn push(&mut self, node: Node) -> Pad {
        self.nodes.push(node);
        Pad::Node(NodeId(self.nodes.len() - 1))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize the part of the graph that feeds `sinks` into
    /// `-filter_complex` syntax. Each sink's node is labeled with the given
    /// name; every other node gets `v<n>` or `a<n>`.
    ///
    /// Fails if a sink is not a node, a node is consumed more than once, or
    /// a node has no filters.
    pub fn render(&self, sinks: &[(Pad, &str)]) -> ReelcutResult<String> {
        let mut labels: HashMap<usize, String> = HashMap::new();
        let mut stack = Vec::new();
        for (pad, name) in sinks {
            let Pad::Node(NodeId(id)) = pad else {
                return Err(ReelcutError::render(format!(
                    "filter graph sink '{name}' must be a filter output"
                )));
            };
            self.node(*id)?;
            if labels.insert(*id, (*name).to_string()).is_some() {
                return Err(ReelcutError::render(format!(
                    "filter graph sink '{name}' is already mapped"
                )));
            }
            stack.push(*id);
        }

        let mut reachable = vec![false; self.nodes.len()];
        let mut consumers = vec![0usize; self.nodes.len()];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut reachable[id], true) {
                continue;
            }
            for pad in self.node(id)?.inputs() {
                if let Pad::Node(NodeId(input)) = pad {
                    self.node(*input)?;
                    consumers[*input] += 1;
                    stack.push(*input);
                }
            }
        }

        let mut counters = [0usize; 2];
        for (id, node) in self.nodes.iter().enumerate() {
            if !reachable[id] {
                continue;
            }
            if consumers[id] > 1 || (consumers[id] == 1 && labels.contains_key(&id)) {
                return Err(ReelcutError::render(format!(
                    "filter graph node {id} is consumed more than once"
                )));
            }
            if !labels.contains_key(&id) {
                let slot = &mut counters[usize::from(node.kind() == StreamKind::Audio)];
                labels.insert(id, format!("{}{}", node.kind().specifier(), *slot));
                *slot += 1;
            }
        }

        let mut chains = Vec::new();
        for (id, node) in self.nodes.iter().enumerate() {
            if !reachable[id] {
                continue;
            }
            let chain = node.chain();
            if chain.is_empty() {
                return Err(ReelcutError::render(format!(
                    "filter graph node {id} has no filters"
                )));
            }
            let mut text = String::new();
            for pad in node.inputs() {
                match pad {
                    Pad::Input { index, kind } => {
                        text.push_str(&format!("[{index}:{}]", kind.specifier()))
                    }
                    Pad::Node(NodeId(input)) => text.push_str(&format!("[{}]", labels[input])),
                }
            }
            text.push_str(&chain);
            text.push_str(&format!("[{}]", labels[&id]));
            chains.push(text);
        }

        Ok(chains.join(";"))
    }

    fn node(&self, id: usize) -> ReelcutResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| ReelcutError::render(format!("filter graph has no node {id}")))
    }
}
