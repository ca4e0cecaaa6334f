//! Reelcut Render Engine
//!
//! Turns an edit decision list into a single ffmpeg invocation and runs it.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Project ──┐
//!           ├── probe sources (ffprobe)
//! settings ─┘         │
//!                     ├── lower clips: trim / retime / volume / atempo
//!                     │
//!                     ├── fold each track: xfade + acrossfade or concat
//!                     │
//!                     ├── overlay video tracks, fit to target size
//!                     │
//!                     ├── select + mix audio (mix / a1_only / v1_only)
//!                     ▼
//!               -filter_complex
//!                     │
//!                     ▼
//!           ffmpeg with -progress pipe:1
//!                     │
//!                     ▼
//!                 output.mp4
//! ```

pub mod compiler;
pub mod compositor;
pub mod encode;
pub mod export;
pub mod graph;
pub mod probe;
pub mod runner;
pub mod tools;

pub use compiler::{compile_clip_lists, compile_project, compile_timeline, CompiledExport};
pub use compositor::AudioMode;
pub use encode::encode_args;
pub use export::*;
pub use probe::{parse_probe_json, FfprobeProbe, MediaInfo, MediaProbe};
pub use runner::{parse_progress_seconds, run, run_with_progress, EngineCommand};
pub use tools::EngineTools;
