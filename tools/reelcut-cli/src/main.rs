//! Reelcut CLI: command-line interface for timeline editing and export.
//!
//! Usage:
//!   reelcut init <PROJECT>              Create an empty project file
//!   reelcut info <PROJECT>              Show tracks and clips
//!   reelcut add <PROJECT> <SRC>         Add a source file to a track
//!   reelcut split|trim|duplicate|move|remove|transition|speed|audio ...
//!                                       Edit one clip
//!   reelcut track <PROJECT> add|remove|move
//!                                       Manage tracks
//!   reelcut export <PROJECT>            Render the project with ffmpeg
//!   reelcut probe <SRC>                 Show media stream information
//!   reelcut check                       Check that ffmpeg and ffprobe are available

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "reelcut",
    about = "Non-destructive timeline editing rendered through ffmpeg",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project file
    Init {
        /// Path of the project file to create
        path: PathBuf,

        /// Output frame rate
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show project information
    Info {
        /// Path to the project file
        path: PathBuf,
    },

    /// Add a source file as a full-length clip
    Add {
        /// Path to the project file
        path: PathBuf,

        /// Media file to add
        src: PathBuf,

        /// Track id or name
        #[arg(short, long, default_value = "v1")]
        track: String,

        /// Insert before this clip instead of appending
        #[arg(long)]
        before: Option<String>,
    },

    /// Split a clip in two
    Split {
        /// Path to the project file
        path: PathBuf,

        /// Clip to split; without it `--at` is a timeline position on `--track`
        clip: Option<String>,

        /// Split position in seconds
        #[arg(long)]
        at: f64,

        /// Track used for timeline positions
        #[arg(short, long, default_value = "v1")]
        track: String,
    },

    /// Set a clip's source in/out points
    Trim {
        /// Path to the project file
        path: PathBuf,

        /// Clip to trim
        clip: String,

        /// New source in point (seconds)
        #[arg(long = "in")]
        in_sec: f64,

        /// New source out point (seconds)
        #[arg(long = "out")]
        out_sec: f64,
    },

    /// Insert a copy of a clip right after it
    Duplicate {
        /// Path to the project file
        path: PathBuf,

        /// Clip to copy
        clip: String,
    },

    /// Move a clip within its track
    Move {
        /// Path to the project file
        path: PathBuf,

        /// Clip to move
        clip: String,

        /// Place it before this clip; omitted moves it to the end
        #[arg(long)]
        before: Option<String>,
    },

    /// Remove a clip
    Remove {
        /// Path to the project file
        path: PathBuf,

        /// Clip to remove
        clip: String,
    },

    /// Set or clear the transition into a clip
    Transition {
        /// Path to the project file
        path: PathBuf,

        /// Clip the transition leads into
        clip: String,

        /// fade, crossfade, dissolve or none
        kind: String,

        /// Transition length in seconds
        #[arg(short, long)]
        duration: Option<f64>,
    },

    /// Set a clip's playback speed (0.25 to 4.0)
    Speed {
        /// Path to the project file
        path: PathBuf,

        /// Clip to retime
        clip: String,

        /// Speed factor
        speed: f64,
    },

    /// Change a clip's volume or mute state
    Audio {
        /// Path to the project file
        path: PathBuf,

        /// Clip to change
        clip: String,

        /// Linear gain (1.0 = unchanged)
        #[arg(long)]
        volume: Option<f64>,

        /// Mute the clip
        #[arg(long, conflicts_with = "unmute")]
        mute: bool,

        /// Unmute the clip
        #[arg(long)]
        unmute: bool,
    },

    /// Add, remove or reorder tracks
    Track {
        /// Path to the project file
        path: PathBuf,

        #[command(subcommand)]
        action: TrackAction,
    },

    /// Export a project to video
    Export {
        /// Path to the project file
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Audio selection: mix, a1_only or v1_only
        #[arg(long)]
        audio_mode: Option<String>,

        /// Raw settings as a JSON object
        #[arg(long)]
        settings: Option<String>,

        /// Container: mp4, mov or webm
        #[arg(long)]
        format: Option<String>,

        /// Output width (0 keeps the source size)
        #[arg(long)]
        width: Option<u32>,

        /// Output height (0 keeps the source size)
        #[arg(long)]
        height: Option<u32>,

        /// Constant rate factor (0-51)
        #[arg(long)]
        crf: Option<u32>,

        /// Encoder preset
        #[arg(long)]
        preset: Option<String>,
    },

    /// Show media stream information
    Probe {
        /// Media file to inspect
        src: PathBuf,
    },

    /// Check that the media tools can be found
    Check,
}

#[derive(Subcommand)]
enum TrackAction {
    /// Add an empty track
    Add {
        /// video or audio
        kind: String,
    },

    /// Remove a track and its clips
    Remove {
        /// Track id or name
        track: String,
    },

    /// Move a track among tracks of the same kind
    Move {
        /// Track id or name
        track: String,

        /// Positions to move by (negative moves up)
        #[arg(allow_hyphen_values = true)]
        delta: isize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = reelcut_common::AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reelcut_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Init { path, fps, force } => commands::init::run(path, fps, force),
        Commands::Info { path } => commands::info::run(path),
        Commands::Add {
            path,
            src,
            track,
            before,
        } => commands::add::run(&config, path, src, track, before),
        Commands::Split {
            path,
            clip,
            at,
            track,
        } => commands::edit::split(&config, path, clip, at, track),
        Commands::Trim {
            path,
            clip,
            in_sec,
            out_sec,
        } => commands::edit::trim(&config, path, clip, in_sec, out_sec),
        Commands::Duplicate { path, clip } => commands::edit::duplicate(path, clip),
        Commands::Move { path, clip, before } => commands::edit::move_before(path, clip, before),
        Commands::Remove { path, clip } => commands::edit::remove(path, clip),
        Commands::Transition {
            path,
            clip,
            kind,
            duration,
        } => commands::edit::transition(&config, path, clip, kind, duration),
        Commands::Speed { path, clip, speed } => commands::edit::speed(path, clip, speed),
        Commands::Audio {
            path,
            clip,
            volume,
            mute,
            unmute,
        } => {
            let muted = match (mute, unmute) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::edit::audio(path, clip, volume, muted)
        }
        Commands::Track { path, action } => match action {
            TrackAction::Add { kind } => commands::track::add(path, kind),
            TrackAction::Remove { track } => commands::track::remove(path, track),
            TrackAction::Move { track, delta } => commands::track::move_by(path, track, delta),
        },
        Commands::Export {
            path,
            output,
            audio_mode,
            settings,
            format,
            width,
            height,
            crf,
            preset,
        } => {
            let overrides = commands::export::Overrides {
                settings,
                format,
                width,
                height,
                crf,
                preset,
            };
            commands::export::run(&config, path, output, audio_mode, overrides).await
        }
        Commands::Probe { src } => commands::probe::run(&config, src),
        Commands::Check => commands::check::run(&config),
    }
}
