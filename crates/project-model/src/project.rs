//! The project aggregate, its document shapes, and persistence.
//!
//! A project owns every track and, through them, every clip. Callers edit a
//! track by running a timeline operation on its clips and committing the
//! result with [`Project::set_track_clips`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clip::{new_id, Clip};
use crate::lenient;
use crate::track::{Track, TrackKind};

/// Frame rate used when a document does not carry a usable one.
pub const DEFAULT_FPS: u32 = 30;

fn default_fps() -> u32 {
    DEFAULT_FPS
}

/// The edit-decision list: a frame rate and an ordered set of tracks.
///
/// Always holds at least one video and one audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProjectDocument")]
pub struct Project {
    pub fps: u32,
    pub tracks: Vec<Track>,
}

/// Every on-disk shape a project has had.
///
/// Current files carry `tracks`. Older ones carry `v_clips`/`a_clips`, and
/// the oldest a single `clips` list of video clips.
#[derive(Deserialize)]
struct ProjectDocument {
    #[serde(default = "default_fps", deserialize_with = "lenient::fps")]
    fps: u32,

    #[serde(default)]
    tracks: Option<Vec<Track>>,

    #[serde(default)]
    v_clips: Option<Vec<Clip>>,

    #[serde(default)]
    a_clips: Option<Vec<Clip>>,

    #[serde(default)]
    clips: Option<Vec<Clip>>,
}

impl From<ProjectDocument> for Project {
    fn from(doc: ProjectDocument) -> Self {
        let tracks = match (doc.tracks, doc.v_clips, doc.a_clips, doc.clips) {
            (Some(tracks), ..) => tracks,
            (None, v_clips, a_clips, _) if v_clips.is_some() || a_clips.is_some() => vec![
                Track::new("v1", "V1", TrackKind::Video).with_clips(v_clips.unwrap_or_default()),
                Track::new("a1", "A1", TrackKind::Audio).with_clips(a_clips.unwrap_or_default()),
            ],
            (None, _, _, clips) => {
                vec![Track::new("v1", "V1", TrackKind::Video).with_clips(clips.unwrap_or_default())]
            }
        };

        let mut project = Project {
            fps: doc.fps,
            tracks,
        };
        project.normalize();
        project
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// Create an empty project with one video and one audio track.
    pub fn new() -> Self {
        Self {
            fps: DEFAULT_FPS,
            tracks: vec![
                Track::new("v1", "V1", TrackKind::Video),
                Track::new("a1", "A1", TrackKind::Audio),
            ],
        }
    }

    /// Restore the structural guarantees after loading.
    ///
    /// Adds missing default tracks, names unnamed tracks, gives duplicated
    /// track and clip identities fresh ones, and drops transitions sitting
    /// on the first clip of a track.
    fn normalize(&mut self) {
        if self.fps == 0 {
            self.fps = DEFAULT_FPS;
        }
        if !self.tracks.iter().any(Track::is_video) {
            let id = self.unused_track_id("v1");
            self.tracks.insert(0, Track::new(id, "", TrackKind::Video));
        }
        if !self.tracks.iter().any(Track::is_audio) {
            let id = self.unused_track_id("a1");
            self.tracks.push(Track::new(id, "", TrackKind::Audio));
        }

        let mut track_ids = HashSet::new();
        let mut clip_ids = HashSet::new();
        let mut counters = [0usize; 2];
        for track in &mut self.tracks {
            if !track_ids.insert(track.id.clone()) {
                track.id = new_id();
                track_ids.insert(track.id.clone());
            }

            let counter = &mut counters[usize::from(track.is_audio())];
            *counter += 1;
            if track.name.trim().is_empty() {
                track.name = format!("{}{}", track.kind.name_prefix(), counter);
            }

            for clip in &mut track.clips {
                if !clip_ids.insert(clip.id.clone()) {
                    clip.id = new_id();
                    clip_ids.insert(clip.id.clone());
                }
            }
            if let Some(first) = track.clips.first_mut() {
                first.transition_in = None;
            }
        }
    }

    fn unused_track_id(&self, preferred: &str) -> String {
        if self.track(preferred).is_some() {
            new_id()
        } else {
            preferred.to_string()
        }
    }

    pub fn track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn track_mut(&mut self, track_id: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }

    /// Look a track up by id, falling back to its display name
    /// (case-insensitive).
    pub fn find_track(&self, id_or_name: &str) -> Option<&Track> {
        self.track(id_or_name).or_else(|| {
            self.tracks
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(id_or_name))
        })
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.is_video())
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.is_audio())
    }

    /// First video track, the default target for new media.
    pub fn primary_video_track(&self) -> Option<&Track> {
        self.video_tracks().next()
    }

    pub fn primary_audio_track(&self) -> Option<&Track> {
        self.audio_tracks().next()
    }

    /// The video track that defines the export timeline: the first visible
    /// non-empty one, otherwise the first non-empty one.
    pub fn base_video_track(&self) -> Option<&Track> {
        self.video_tracks()
            .find(|t| t.visible && !t.clips.is_empty())
            .or_else(|| self.video_tracks().find(|t| !t.clips.is_empty()))
    }

    /// Length of an export of this project, in seconds.
    pub fn export_duration(&self) -> f64 {
        self.base_video_track().map(Track::duration).unwrap_or(0.0)
    }

    /// Whether no track holds any clip.
    pub fn is_empty(&self) -> bool {
        self.tracks.iter().all(|t| t.clips.is_empty())
    }

    /// Locate a clip anywhere in the project.
    pub fn find_clip(&self, clip_id: &str) -> Option<(&Track, &Clip)> {
        self.tracks.iter().find_map(|track| {
            track
                .clips
                .iter()
                .find(|c| c.id == clip_id)
                .map(|clip| (track, clip))
        })
    }

    /// Unique source paths in first-use order.
    pub fn source_files(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .filter(|c| seen.insert(c.src.clone()))
            .map(|c| c.src.clone())
            .collect()
    }

    /// Add an empty track after the last track of the same kind.
    ///
    /// Returns the new track's id.
    pub fn add_track(&mut self, kind: TrackKind) -> String {
        let prefix = kind.name_prefix();
        let mut n = self.tracks.iter().filter(|t| t.kind == kind).count() + 1;
        while self
            .tracks
            .iter()
            .any(|t| t.name == format!("{prefix}{n}"))
        {
            n += 1;
        }

        let name = format!("{prefix}{n}");
        let id = format!("{}_{}", name.to_ascii_lowercase(), &new_id()[..8]);
        let at = self
            .tracks
            .iter()
            .rposition(|t| t.kind == kind)
            .map(|i| i + 1)
            .unwrap_or(self.tracks.len());
        self.tracks.insert(at, Track::new(id.clone(), name, kind));
        id
    }

    /// Remove a track and its clips. The last track of a kind stays.
    pub fn remove_track(&mut self, track_id: &str) -> Result<Track, ProjectError> {
        let index = self.track_index(track_id)?;
        let kind = self.tracks[index].kind;
        if self.tracks.iter().filter(|t| t.kind == kind).count() <= 1 {
            return Err(ProjectError::ValidationError {
                message: format!(
                    "cannot remove the last {} track",
                    kind.name_prefix().to_ascii_lowercase()
                ),
            });
        }
        Ok(self.tracks.remove(index))
    }

    /// Shift a track `delta` places among the tracks of its kind.
    ///
    /// Returns `false` when the track is already at that end.
    pub fn move_track(&mut self, track_id: &str, delta: isize) -> Result<bool, ProjectError> {
        let index = self.track_index(track_id)?;
        let kind = self.tracks[index].kind;
        let slots: Vec<usize> = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == kind)
            .map(|(i, _)| i)
            .collect();

        let from = slots.iter().position(|&i| i == index).unwrap_or(0);
        let last = slots.len().saturating_sub(1) as isize;
        let to = (from as isize + delta).clamp(0, last) as usize;
        if to == from {
            return Ok(false);
        }

        let mut same_kind: Vec<Track> = slots.iter().map(|&i| self.tracks[i].clone()).collect();
        let moving = same_kind.remove(from);
        same_kind.insert(to, moving);
        for (slot, track) in slots.into_iter().zip(same_kind) {
            self.tracks[slot] = track;
        }
        Ok(true)
    }

    /// Replace a track's clips with the result of a timeline edit.
    pub fn set_track_clips(&mut self, track_id: &str, clips: Vec<Clip>) -> Result<(), ProjectError> {
        let index = self.track_index(track_id)?;
        self.tracks[index].clips = clips;
        Ok(())
    }

    fn track_index(&self, track_id: &str) -> Result<usize, ProjectError> {
        self.tracks
            .iter()
            .position(|t| t.id == track_id)
            .ok_or_else(|| ProjectError::ValidationError {
                message: format!("track not found: {track_id}"),
            })
    }

    /// Serialize to the current document shape.
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "fps": self.fps,
            "tracks": self.tracks,
        })
    }

    /// Rebuild a project from any supported document shape.
    pub fn from_document(document: &serde_json::Value) -> Result<Self, ProjectError> {
        Project::deserialize(document).map_err(|e| ProjectError::ValidationError {
            message: format!("invalid project document: {e}"),
        })
    }

    /// Capture the whole project for undo/redo.
    pub fn snapshot(&self, label: impl Into<String>) -> ProjectSnapshot {
        ProjectSnapshot {
            label: label.into(),
            document: self.to_document(),
            taken_at: Utc::now(),
        }
    }
}

/// An opaque, self-contained copy of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// What the edit that follows this snapshot did ("Split", "Trim", ...).
    pub label: String,

    pub document: serde_json::Value,

    pub taken_at: DateTime<Utc>,
}

impl ProjectSnapshot {
    pub fn restore(&self) -> Result<Project, ProjectError> {
        Project::from_document(&self.document)
    }
}

/// Write a project as pretty JSON, atomically.
///
/// The document goes to a sibling temp file first and is renamed over the
/// target, so an interrupted save leaves the previous file intact.
pub fn save_project(project: &Project, path: impl AsRef<Path>) -> Result<(), ProjectError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ProjectError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let json = serde_json::to_string_pretty(&project.to_document()).map_err(|e| {
        ProjectError::ParseError {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    let tmp_path = temp_path_for(path);
    std::fs::write(&tmp_path, json).map_err(|e| ProjectError::IoError {
        path: tmp_path.clone(),
        source: e,
    })?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        std::fs::remove_file(&tmp_path).ok();
        return Err(ProjectError::IoError {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

/// Read a project file in any supported shape.
pub fn load_project(path: impl AsRef<Path>) -> Result<Project, ProjectError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "project.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{Transition, TransitionKind};

    fn clip(id: &str, out_sec: f64) -> Clip {
        Clip::new(format!("{id}.mp4"), 0.0, out_sec).with_id(id)
    }

    #[test]
    fn test_new_project_has_default_tracks() {
        let project = Project::new();
        assert_eq!(project.fps, 30);
        assert_eq!(project.video_tracks().count(), 1);
        assert_eq!(project.audio_tracks().count(), 1);
        assert_eq!(project.primary_video_track().unwrap().name, "V1");
        assert_eq!(project.primary_audio_track().unwrap().id, "a1");
        assert!(project.is_empty());
    }

    #[test]
    fn test_load_legacy_two_list_shape() {
        let project: Project = serde_json::from_value(serde_json::json!({
            "fps": 25,
            "v_clips": [{"id": "v", "src": "a.mp4", "in_sec": 0, "out_sec": 2}],
            "a_clips": [{"id": "a", "src": "music.wav", "in_sec": 0, "out_sec": 5}]
        }))
        .unwrap();
        assert_eq!(project.fps, 25);
        assert_eq!(project.tracks.len(), 2);
        assert_eq!(project.tracks[0].clips[0].id, "v");
        assert_eq!(project.tracks[1].clips[0].src, "music.wav");
    }

    #[test]
    fn test_load_oldest_flat_shape_adds_audio_track() {
        let project: Project = serde_json::from_value(serde_json::json!({
            "fps": "bad",
            "clips": [{"id": "v", "src": "a.mp4", "in_sec": 0, "out_sec": 2}]
        }))
        .unwrap();
        assert_eq!(project.fps, DEFAULT_FPS);
        assert_eq!(project.video_tracks().next().unwrap().clips.len(), 1);
        assert_eq!(project.audio_tracks().count(), 1);
    }

    #[test]
    fn test_load_tracks_shape_fills_gaps() {
        let project: Project = serde_json::from_value(serde_json::json!({
            "fps": 24,
            "tracks": [
                {"id": "t", "kind": "video", "clips": [
                    {"id": "x", "src": "a.mp4", "in_sec": 0, "out_sec": 2,
                     "transition_in": {"kind": "fade", "duration": 0.5}},
                    {"id": "x", "src": "b.mp4", "in_sec": 0, "out_sec": 2}
                ]}
            ]
        }))
        .unwrap();
        let video = project.track("t").unwrap();
        assert_eq!(video.name, "V1");
        assert!(video.visible);
        assert!(video.clips[0].transition_in.is_none());
        assert_ne!(video.clips[0].id, video.clips[1].id);
        assert_eq!(project.audio_tracks().count(), 1);
    }

    #[test]
    fn test_add_track_inserts_after_same_kind() {
        let mut project = Project::new();
        let id = project.add_track(TrackKind::Video);
        assert_eq!(project.tracks[1].id, id);
        assert_eq!(project.tracks[1].name, "V2");
        assert!(project.tracks[2].is_audio());

        project.add_track(TrackKind::Audio);
        assert_eq!(project.tracks[3].name, "A2");
    }

    #[test]
    fn test_remove_last_track_of_kind_is_refused() {
        let mut project = Project::new();
        assert!(project.remove_track("v1").is_err());
        let id = project.add_track(TrackKind::Video);
        assert!(project.remove_track("v1").is_ok());
        assert_eq!(project.primary_video_track().unwrap().id, id);
        assert!(project.remove_track("nope").is_err());
    }

    #[test]
    fn test_move_track_within_kind() {
        let mut project = Project::new();
        let v2 = project.add_track(TrackKind::Video);
        assert!(project.move_track(&v2, -1).unwrap());
        assert_eq!(project.tracks[0].id, v2);
        assert_eq!(project.tracks[1].id, "v1");
        assert!(!project.move_track(&v2, -5).unwrap());
        assert!(!project.move_track("a1", 1).unwrap());
    }

    #[test]
    fn test_base_video_track_prefers_visible() {
        let mut project = Project::new();
        let v2 = project.add_track(TrackKind::Video);
        project.set_track_clips("v1", vec![clip("a", 2.0)]).unwrap();
        project.set_track_clips(&v2, vec![clip("b", 5.0)]).unwrap();
        project.track_mut("v1").unwrap().visible = false;
        assert_eq!(project.base_video_track().unwrap().id, v2);
        assert!((project.export_duration() - 5.0).abs() < 1e-9);

        project.track_mut(&v2).unwrap().visible = false;
        assert_eq!(project.base_video_track().unwrap().id, "v1");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut project = Project::new();
        let b = clip("b", 3.0).with_transition(Transition::new(TransitionKind::Dissolve, 1.0));
        project.set_track_clips("v1", vec![clip("a", 2.0), b]).unwrap();

        let snapshot = project.snapshot("Add");
        assert_eq!(snapshot.label, "Add");
        project.set_track_clips("v1", vec![]).unwrap();

        let restored = snapshot.restore().unwrap();
        assert_eq!(restored.track("v1").unwrap().clips.len(), 2);
        assert!(restored.find_clip("b").is_some());
    }

    #[test]
    fn test_save_and_load_project() {
        let dir = std::env::temp_dir().join(format!("reelcut_test_project_{}", new_id()));
        let path = dir.join("nested").join("edit.json");

        let mut project = Project::new();
        project.fps = 60;
        project
            .set_track_clips("v1", vec![clip("a", 2.0), clip("b", 1.0)])
            .unwrap();
        save_project(&project, &path).unwrap();
        assert!(!temp_path_for(&path).exists());

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded, project);
        assert_eq!(loaded.source_files(), vec!["a.mp4", "b.mp4"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = load_project("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
