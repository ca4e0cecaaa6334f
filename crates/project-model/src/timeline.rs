//! Timeline edit operations.
//!
//! Every operation takes an ordered clip list by reference and returns an
//! [`EditOutcome`] holding a fresh list; the input is never mutated. Invalid
//! requests are not errors: they come back unchanged with a status that
//! explains why, so a UI can show the message and carry on.
//!
//! Adjacency is positional. A clip's `transition_in` refers to whichever
//! clip sits one slot earlier, so operations that reorder clips re-derive
//! it (the clip at position 0 never keeps a transition).

use crate::clip::{
    new_id, normalize_speed, transition_overlap, Clip, Transition, TransitionKind,
    TRANSITION_EPSILON_SEC,
};

/// Why an edit did or did not change the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditStatus {
    Split,
    SplitTooCloseToEdge,
    OutOfRange,
    ClipNotFound,
    Trimmed,
    TrimNoChanges,
    TrimInvalidRange,
    Duplicated,
    Moved,
    Unchanged,
    Inserted,
    Appended,
    Removed,
    TransitionSet,
    TransitionCleared,
    TransitionNeedsPredecessor,
    TransitionTooShort,
    SpeedSet,
    AudioSet,
}

impl EditStatus {
    /// Whether the returned clip list differs from the input.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            EditStatus::Split
                | EditStatus::Trimmed
                | EditStatus::Duplicated
                | EditStatus::Moved
                | EditStatus::Inserted
                | EditStatus::Appended
                | EditStatus::Removed
                | EditStatus::TransitionSet
                | EditStatus::TransitionCleared
                | EditStatus::SpeedSet
                | EditStatus::AudioSet
        )
    }
}

impl std::fmt::Display for EditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            EditStatus::Split => "Split",
            EditStatus::SplitTooCloseToEdge => "Split point too close to clip edge",
            EditStatus::OutOfRange => "Split position out of range",
            EditStatus::ClipNotFound => "clip not found",
            EditStatus::Trimmed => "Trimmed",
            EditStatus::TrimNoChanges => "Trim: no changes",
            EditStatus::TrimInvalidRange => "Trim failed: range is too short or negative",
            EditStatus::Duplicated => "Duplicated",
            EditStatus::Moved => "Moved",
            EditStatus::Unchanged => "No changes",
            EditStatus::Inserted => "Inserted",
            EditStatus::Appended => "Added to end",
            EditStatus::Removed => "Removed",
            EditStatus::TransitionSet => "Transition set",
            EditStatus::TransitionCleared => "Transition removed",
            EditStatus::TransitionNeedsPredecessor => "Transition needs a previous clip",
            EditStatus::TransitionTooShort => "Clips are too short for a transition",
            EditStatus::SpeedSet => "Speed changed",
            EditStatus::AudioSet => "Audio changed",
        };
        f.write_str(msg)
    }
}

/// Result of a timeline edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    /// The resulting clip list (a copy of the input on no-op).
    pub clips: Vec<Clip>,

    /// Clip the UI should select afterwards, if any.
    pub selected: Option<String>,

    pub status: EditStatus,
}

impl EditOutcome {
    fn unchanged(clips: &[Clip], status: EditStatus, selected: Option<String>) -> Self {
        Self {
            clips: clips.to_vec(),
            selected,
            status,
        }
    }

    fn changed(clips: Vec<Clip>, status: EditStatus, selected: Option<String>) -> Self {
        Self {
            clips,
            selected,
            status,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.status.changed()
    }

    /// Human-readable status line.
    pub fn message(&self) -> String {
        self.status.to_string()
    }
}

/// Find a clip by id.
pub fn find_clip<'a>(clips: &'a [Clip], clip_id: &str) -> Option<&'a Clip> {
    clips.iter().find(|c| c.id == clip_id)
}

fn position(clips: &[Clip], clip_id: &str) -> Option<usize> {
    clips.iter().position(|c| c.id == clip_id)
}

/// Re-clamp the transition of `clips[index]` against its current
/// neighbour and its own length. Drops it when there is no predecessor
/// or no room for any overlap.
fn reclamp_transition(clips: &mut [Clip], index: usize) {
    let limit = match index.checked_sub(1).map(|prev| clips[prev].duration()) {
        Some(prev_duration) => prev_duration.min(clips[index].duration()),
        None => {
            clips[index].transition_in = None;
            return;
        }
    };
    clips[index].transition_in = clips[index]
        .transition_in
        .and_then(|t| t.clamped_to(limit));
}

fn drop_leading_transition(clips: &mut [Clip]) {
    if let Some(first) = clips.first_mut() {
        first.transition_in = None;
    }
}

/// Split a clip at `split_at_rel_sec` seconds from its start on the output
/// timeline.
///
/// The split point is mapped through the clip's speed to an absolute source
/// time. The left piece keeps the original transition; the right piece
/// starts with a hard cut. Both pieces get fresh identities and the left
/// one is selected.
pub fn split_clip(
    clips: &[Clip],
    clip_id: &str,
    split_at_rel_sec: f64,
    min_piece_sec: f64,
) -> EditOutcome {
    let Some(index) = position(clips, clip_id) else {
        return EditOutcome::unchanged(clips, EditStatus::ClipNotFound, None);
    };
    let original = &clips[index];
    let duration = original.duration();

    if !(split_at_rel_sec > min_piece_sec && split_at_rel_sec < duration - min_piece_sec) {
        return EditOutcome::unchanged(
            clips,
            EditStatus::SplitTooCloseToEdge,
            Some(original.id.clone()),
        );
    }

    let mid = original.source_time_at(split_at_rel_sec);

    let mut left = original.clone();
    left.id = new_id();
    left.out_sec = mid;

    let mut right = original.clone();
    right.id = new_id();
    right.in_sec = mid;
    right.transition_in = None;

    let selected = left.id.clone();
    let mut out = Vec::with_capacity(clips.len() + 1);
    out.extend_from_slice(&clips[..index]);
    out.push(left);
    out.push(right);
    out.extend_from_slice(&clips[index + 1..]);
    reclamp_transition(&mut out, index);

    EditOutcome::changed(out, EditStatus::Split, Some(selected))
}

/// Split whichever clip contains `global_sec` on the track.
///
/// Clip start positions are the running sum of plain clip durations;
/// transition overlap is not subtracted here.
pub fn split_at_timeline_sec(clips: &[Clip], global_sec: f64, min_piece_sec: f64) -> EditOutcome {
    if !global_sec.is_finite() || global_sec < 0.0 {
        return EditOutcome::unchanged(clips, EditStatus::OutOfRange, None);
    }

    let mut start = 0.0;
    for clip in clips {
        let duration = clip.duration();
        if global_sec < start + duration {
            return split_clip(clips, &clip.id, global_sec - start, min_piece_sec);
        }
        start += duration;
    }

    EditOutcome::unchanged(clips, EditStatus::OutOfRange, None)
}

/// Change a clip's source range, keeping every other attribute.
///
/// The transition, if any, is re-clamped against the new length.
pub fn trim_clip(
    clips: &[Clip],
    clip_id: &str,
    new_in_sec: f64,
    new_out_sec: f64,
    min_piece_sec: f64,
) -> EditOutcome {
    let Some(index) = position(clips, clip_id) else {
        return EditOutcome::unchanged(clips, EditStatus::ClipNotFound, None);
    };
    let selected = Some(clips[index].id.clone());

    let current = &clips[index];
    if (current.in_sec - new_in_sec).abs() < 1e-9 && (current.out_sec - new_out_sec).abs() < 1e-9 {
        return EditOutcome::unchanged(clips, EditStatus::TrimNoChanges, selected);
    }

    if !new_in_sec.is_finite()
        || !new_out_sec.is_finite()
        || new_in_sec < 0.0
        || new_out_sec <= new_in_sec + min_piece_sec
    {
        return EditOutcome::unchanged(clips, EditStatus::TrimInvalidRange, selected);
    }

    let mut out = clips.to_vec();
    out[index].in_sec = new_in_sec;
    out[index].out_sec = new_out_sec;
    reclamp_transition(&mut out, index);

    EditOutcome::changed(out, EditStatus::Trimmed, selected)
}

/// Insert a copy of a clip right after it.
///
/// The copy gets a fresh identity and starts with a hard cut.
pub fn duplicate_clip(clips: &[Clip], clip_id: &str) -> EditOutcome {
    let Some(index) = position(clips, clip_id) else {
        return EditOutcome::unchanged(clips, EditStatus::ClipNotFound, None);
    };

    let mut copy = clips[index].clone();
    copy.id = new_id();
    copy.transition_in = None;
    let selected = copy.id.clone();

    let mut out = clips.to_vec();
    out.insert(index + 1, copy);

    EditOutcome::changed(out, EditStatus::Duplicated, Some(selected))
}

/// Move `moving_id` so that it sits immediately before `target_id`.
///
/// An unknown target moves the clip to the end.
pub fn move_clip_before(clips: &[Clip], moving_id: &str, target_id: &str) -> EditOutcome {
    if moving_id == target_id {
        return EditOutcome::unchanged(clips, EditStatus::Unchanged, Some(moving_id.to_string()));
    }
    let Some(from) = position(clips, moving_id) else {
        return EditOutcome::unchanged(clips, EditStatus::ClipNotFound, None);
    };

    let mut out = clips.to_vec();
    let moving = out.remove(from);
    let to = position(&out, target_id).unwrap_or(out.len());
    out.insert(to, moving);

    let reordered = out.iter().map(|c| &c.id).ne(clips.iter().map(|c| &c.id));
    if !reordered {
        return EditOutcome::unchanged(clips, EditStatus::Unchanged, Some(moving_id.to_string()));
    }

    drop_leading_transition(&mut out);
    EditOutcome::changed(out, EditStatus::Moved, Some(moving_id.to_string()))
}

fn full_length_clip(src: &str, source_duration: f64, has_audio: bool) -> Clip {
    Clip::new(src, 0.0, source_duration.max(0.0)).with_has_audio(has_audio)
}

/// Insert a full-length clip of `src` before `target_id` (or at the end
/// when the target is unknown).
pub fn insert_clip_before(
    clips: &[Clip],
    target_id: &str,
    src: &str,
    source_duration: f64,
    has_audio: bool,
) -> EditOutcome {
    let clip = full_length_clip(src, source_duration, has_audio);
    let selected = clip.id.clone();

    let mut out = clips.to_vec();
    let at = position(&out, target_id).unwrap_or(out.len());
    out.insert(at, clip);
    drop_leading_transition(&mut out);

    EditOutcome::changed(out, EditStatus::Inserted, Some(selected))
}

/// Append a full-length clip of `src` to the end of the track.
pub fn add_clip_end(
    clips: &[Clip],
    src: &str,
    source_duration: f64,
    has_audio: bool,
) -> EditOutcome {
    let clip = full_length_clip(src, source_duration, has_audio);
    let selected = clip.id.clone();

    let mut out = clips.to_vec();
    out.push(clip);

    EditOutcome::changed(out, EditStatus::Appended, Some(selected))
}

/// Remove a clip. Selection moves to the clip that took its place, or the
/// new last clip.
pub fn remove_clip(clips: &[Clip], clip_id: &str) -> EditOutcome {
    let Some(index) = position(clips, clip_id) else {
        return EditOutcome::unchanged(clips, EditStatus::ClipNotFound, None);
    };

    let mut out = clips.to_vec();
    out.remove(index);
    drop_leading_transition(&mut out);
    let selected = out
        .get(index)
        .or_else(|| out.last())
        .map(|c| c.id.clone());

    EditOutcome::changed(out, EditStatus::Removed, selected)
}

/// Set or clear the transition into a clip.
///
/// The duration is clamped to what both neighbours can carry. The first
/// clip on a track cannot take a transition.
pub fn set_transition(
    clips: &[Clip],
    clip_id: &str,
    kind: Option<TransitionKind>,
    duration_sec: f64,
) -> EditOutcome {
    let Some(index) = position(clips, clip_id) else {
        return EditOutcome::unchanged(clips, EditStatus::ClipNotFound, None);
    };
    let selected = Some(clips[index].id.clone());

    let Some(kind) = kind else {
        if clips[index].transition_in.is_none() {
            return EditOutcome::unchanged(clips, EditStatus::Unchanged, selected);
        }
        let mut out = clips.to_vec();
        out[index].transition_in = None;
        return EditOutcome::changed(out, EditStatus::TransitionCleared, selected);
    };

    if index == 0 {
        return EditOutcome::unchanged(clips, EditStatus::TransitionNeedsPredecessor, selected);
    }

    let max_allowed =
        clips[index - 1].duration().min(clips[index].duration()) - TRANSITION_EPSILON_SEC;
    if max_allowed <= 0.0 || !duration_sec.is_finite() || duration_sec <= 0.0 {
        return EditOutcome::unchanged(clips, EditStatus::TransitionTooShort, selected);
    }

    let mut out = clips.to_vec();
    out[index].transition_in = Some(Transition::new(kind, duration_sec.min(max_allowed)));
    EditOutcome::changed(out, EditStatus::TransitionSet, selected)
}

/// Change a clip's playback rate (normalized into the supported range).
pub fn set_speed(clips: &[Clip], clip_id: &str, speed: f64) -> EditOutcome {
    let Some(index) = position(clips, clip_id) else {
        return EditOutcome::unchanged(clips, EditStatus::ClipNotFound, None);
    };
    let selected = Some(clips[index].id.clone());

    let target = normalize_speed(Some(speed), clips[index].effective_speed());
    if (clips[index].effective_speed() - target).abs() < 1e-6 {
        return EditOutcome::unchanged(clips, EditStatus::Unchanged, selected);
    }

    let mut out = clips.to_vec();
    out[index].speed = target;
    reclamp_transition(&mut out, index);
    if index + 1 < out.len() {
        reclamp_transition(&mut out, index + 1);
    }

    EditOutcome::changed(out, EditStatus::SpeedSet, selected)
}

/// Change a clip's gain and/or mute flag.
pub fn set_audio(
    clips: &[Clip],
    clip_id: &str,
    volume: Option<f64>,
    muted: Option<bool>,
) -> EditOutcome {
    let Some(index) = position(clips, clip_id) else {
        return EditOutcome::unchanged(clips, EditStatus::ClipNotFound, None);
    };
    let selected = Some(clips[index].id.clone());

    let current = &clips[index];
    let volume = volume
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0))
        .unwrap_or(current.volume);
    let muted = muted.unwrap_or(current.muted);
    if (current.volume - volume).abs() < 1e-9 && current.muted == muted {
        return EditOutcome::unchanged(clips, EditStatus::Unchanged, selected);
    }

    let mut out = clips.to_vec();
    out[index].volume = volume;
    out[index].muted = muted;
    EditOutcome::changed(out, EditStatus::AudioSet, selected)
}

/// Length of the track on the output timeline.
///
/// Sum of clip durations minus the effective overlap of every transition
/// between adjacent clips. Never negative.
pub fn total_duration(clips: &[Clip]) -> f64 {
    let sum: f64 = clips.iter().map(Clip::duration).sum();
    let overlap: f64 = clips
        .windows(2)
        .map(|pair| transition_overlap(&pair[0], &pair[1]))
        .sum();
    (sum - overlap).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::DEFAULT_MIN_PIECE_SEC;

    fn clip(id: &str, in_sec: f64, out_sec: f64) -> Clip {
        Clip::new(format!("{id}.mp4"), in_sec, out_sec).with_id(id)
    }

    fn fade(duration: f64) -> Transition {
        Transition::new(TransitionKind::Fade, duration)
    }

    fn ids(clips: &[Clip]) -> Vec<&str> {
        clips.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_split_clip() {
        let c = clip("c", 0.0, 10.0);
        let out = split_clip(&[c], "c", 3.0, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.status, EditStatus::Split);
        assert_eq!(out.clips.len(), 2);
        assert!((out.clips[0].duration() - 3.0).abs() < 1e-9);
        assert!((out.clips[1].duration() - 7.0).abs() < 1e-9);
        assert_eq!(out.selected.as_deref(), Some(out.clips[0].id.as_str()));
        assert_ne!(out.clips[0].id, "c");
        assert_ne!(out.clips[1].id, "c");
    }

    #[test]
    fn test_split_respects_speed() {
        let c = clip("c", 2.0, 10.0).with_speed(2.0);
        let out = split_clip(&[c], "c", 1.0, DEFAULT_MIN_PIECE_SEC);
        assert!((out.clips[0].out_sec - 4.0).abs() < 1e-9);
        assert!((out.clips[1].in_sec - 4.0).abs() < 1e-9);
        assert!((out.clips[0].duration() - 1.0).abs() < 1e-9);
        assert!((out.clips[1].duration() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_too_close_to_edge() {
        let c = clip("c", 0.0, 10.0);
        let out = split_clip(&[c.clone()], "c", 0.05, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.status, EditStatus::SplitTooCloseToEdge);
        assert_eq!(out.clips, vec![c.clone()]);
        let out = split_clip(&[c.clone()], "c", 9.95, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.status, EditStatus::SplitTooCloseToEdge);
        assert_eq!(out.selected.as_deref(), Some("c"));
    }

    #[test]
    fn test_split_keeps_transition_on_left_piece_only() {
        let a = clip("a", 0.0, 4.0);
        let b = clip("b", 0.0, 6.0).with_transition(fade(1.0));
        let out = split_clip(&[a, b], "b", 3.0, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.clips.len(), 3);
        assert_eq!(out.clips[1].transition_in, Some(fade(1.0)));
        assert_eq!(out.clips[2].transition_in, None);
    }

    #[test]
    fn test_split_at_timeline_sec_middle() {
        let a = clip("a", 0.0, 3.0);
        let b = clip("b", 0.0, 2.0);
        let out = split_at_timeline_sec(&[a, b], 1.5, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.status, EditStatus::Split);
        assert_eq!(out.clips.len(), 3);
        assert!((out.clips[0].duration() - 1.5).abs() < 1e-9);
        assert!((out.clips[1].duration() - 1.5).abs() < 1e-9);
        assert!(out.selected.is_some());
    }

    #[test]
    fn test_split_at_timeline_sec_boundary_is_noop() {
        let a = clip("a", 0.0, 3.0);
        let b = clip("b", 0.0, 2.0);
        let out = split_at_timeline_sec(&[a, b], 3.0, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(ids(&out.clips), vec!["a", "b"]);
        assert!(!out.is_changed());
    }

    #[test]
    fn test_split_at_timeline_sec_out_of_range() {
        let a = clip("a", 0.0, 3.0);
        let out = split_at_timeline_sec(&[a], 9.0, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.clips[0].id, "a");
        assert!(out.selected.is_none());
        assert_eq!(out.status, EditStatus::OutOfRange);
        assert!(out.message().contains("out of range"));
    }

    #[test]
    fn test_trim_clip() {
        let c = clip("c", 0.0, 10.0);
        let out = trim_clip(&[c], "c", 2.0, 7.0, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.message(), "Trimmed");
        assert!((out.clips[0].in_sec - 2.0).abs() < 1e-9);
        assert!((out.clips[0].out_sec - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_trim_rejects_tiny_range() {
        let c = clip("c", 0.0, 10.0);
        let out = trim_clip(&[c.clone()], "c", 5.0, 5.01, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.status, EditStatus::TrimInvalidRange);
        assert_eq!(out.clips, vec![c]);
        assert!(out.message().contains("Trim failed"));
    }

    #[test]
    fn test_trim_rejects_negative_in() {
        let c = clip("c", 0.0, 10.0);
        let out = trim_clip(&[c], "c", -1.0, 5.0, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.status, EditStatus::TrimInvalidRange);
    }

    #[test]
    fn test_trim_not_found() {
        let c = clip("c", 0.0, 10.0);
        let out = trim_clip(&[c], "missing", 1.0, 3.0, DEFAULT_MIN_PIECE_SEC);
        assert!((out.clips[0].in_sec).abs() < 1e-9);
        assert!(out.message().contains("clip not found"));
    }

    #[test]
    fn test_trim_no_changes() {
        let c = clip("c", 1.0, 4.0);
        let out = trim_clip(&[c.clone()], "c", 1.0, 4.0, DEFAULT_MIN_PIECE_SEC);
        assert_eq!(out.clips, vec![c]);
        assert_eq!(out.message(), "Trim: no changes");
    }

    #[test]
    fn test_trim_preserves_attributes_and_reclamps_transition() {
        let a = clip("a", 0.0, 5.0);
        let mut b = clip("b", 0.0, 5.0).with_speed(1.0).with_transition(fade(2.0));
        b.volume = 0.4;
        b.muted = true;
        b.has_audio = false;
        let out = trim_clip(&[a, b], "b", 1.0, 2.0, DEFAULT_MIN_PIECE_SEC);
        let trimmed = &out.clips[1];
        assert_eq!(out.status, EditStatus::Trimmed);
        assert!((trimmed.volume - 0.4).abs() < 1e-9);
        assert!(trimmed.muted);
        assert!(!trimmed.has_audio);
        let t = trimmed.transition_in.unwrap();
        assert_eq!(t.kind, TransitionKind::Fade);
        assert!((t.duration - 0.99).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_clip() {
        let a = clip("a", 0.0, 1.0);
        let b = clip("b", 0.0, 1.0);
        let out = duplicate_clip(&[a, b], "a");
        assert!(out.message().contains("Duplicate"));
        assert_eq!(out.clips[0].id, "a");
        assert_eq!(out.clips[2].id, "b");
        assert_eq!(out.clips[1].src, "a.mp4");
        assert_ne!(out.clips[1].id, "a");
        assert_eq!(out.selected.as_deref(), Some(out.clips[1].id.as_str()));
    }

    #[test]
    fn test_duplicate_never_copies_transition() {
        let a = clip("a", 0.0, 2.0);
        let b = clip("b", 0.0, 2.0).with_transition(fade(0.5));
        let out = duplicate_clip(&[a, b], "b");
        assert_eq!(out.clips[1].transition_in, Some(fade(0.5)));
        assert_eq!(out.clips[2].transition_in, None);
    }

    #[test]
    fn test_move_before() {
        let a = clip("a", 0.0, 1.0);
        let b = clip("b", 0.0, 1.0);
        let c = clip("c", 0.0, 1.0);
        let out = move_clip_before(&[a, b, c], "c", "b");
        assert_eq!(ids(&out.clips), vec!["a", "c", "b"]);
        assert_eq!(out.status, EditStatus::Moved);
    }

    #[test]
    fn test_move_to_front_clears_transition() {
        let a = clip("a", 0.0, 2.0);
        let b = clip("b", 0.0, 2.0).with_transition(fade(0.5));
        let out = move_clip_before(&[a, b], "b", "a");
        assert_eq!(ids(&out.clips), vec!["b", "a"]);
        assert_eq!(out.clips[0].transition_in, None);
    }

    #[test]
    fn test_move_onto_itself_is_noop() {
        let a = clip("a", 0.0, 2.0);
        let out = move_clip_before(&[a], "a", "a");
        assert!(!out.is_changed());
    }

    #[test]
    fn test_move_unknown_target_appends() {
        let a = clip("a", 0.0, 1.0);
        let b = clip("b", 0.0, 1.0);
        let out = move_clip_before(&[a, b], "a", "zzz");
        assert_eq!(ids(&out.clips), vec!["b", "a"]);
    }

    #[test]
    fn test_add_clip_end_with_has_audio() {
        let out = add_clip_end(&[], "silent.mp4", 2.0, false);
        assert_eq!(out.clips.len(), 1);
        assert!(!out.clips[0].has_audio);
        assert!((out.clips[0].out_sec - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_clip_before_with_has_audio() {
        let a = clip("a", 0.0, 1.0);
        let out = insert_clip_before(&[a], "a", "silent.mp4", 2.0, false);
        assert_eq!(out.clips.len(), 2);
        assert!(!out.clips[0].has_audio);
        assert_eq!(out.clips[1].id, "a");
    }

    #[test]
    fn test_remove_first_clip_drops_new_leading_transition() {
        let a = clip("a", 0.0, 2.0);
        let b = clip("b", 0.0, 2.0).with_transition(fade(0.5));
        let out = remove_clip(&[a, b], "a");
        assert_eq!(ids(&out.clips), vec!["b"]);
        assert_eq!(out.clips[0].transition_in, None);
        assert_eq!(out.selected.as_deref(), Some("b"));
    }

    #[test]
    fn test_set_transition_clamps_and_requires_predecessor() {
        let a = clip("a", 0.0, 1.0);
        let b = clip("b", 0.0, 3.0);
        let first = set_transition(&[a.clone(), b.clone()], "a", Some(TransitionKind::Fade), 0.5);
        assert_eq!(first.status, EditStatus::TransitionNeedsPredecessor);

        let out = set_transition(&[a, b], "b", Some(TransitionKind::Dissolve), 2.0);
        assert_eq!(out.status, EditStatus::TransitionSet);
        let t = out.clips[1].transition_in.unwrap();
        assert_eq!(t.kind, TransitionKind::Dissolve);
        assert!((t.duration - 0.99).abs() < 1e-9);

        let cleared = set_transition(&out.clips, "b", None, 0.0);
        assert_eq!(cleared.status, EditStatus::TransitionCleared);
        assert!(cleared.clips[1].transition_in.is_none());
    }

    #[test]
    fn test_set_speed_normalizes() {
        let a = clip("a", 0.0, 8.0);
        let out = set_speed(&[a], "a", 10.0);
        assert_eq!(out.status, EditStatus::SpeedSet);
        assert!((out.clips[0].duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_audio() {
        let a = clip("a", 0.0, 8.0);
        let out = set_audio(&[a], "a", Some(-3.0), Some(true));
        assert_eq!(out.status, EditStatus::AudioSet);
        assert_eq!(out.clips[0].volume, 0.0);
        assert!(out.clips[0].muted);
    }

    #[test]
    fn test_total_duration() {
        let a = clip("a", 0.0, 1.5);
        let b = clip("b", 2.0, 5.0);
        assert!((total_duration(&[a, b]) - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_total_duration_with_transition_overlap() {
        let a = clip("a", 0.0, 3.0);
        let b = clip("b", 0.0, 4.0).with_transition(fade(1.0));
        assert!((total_duration(&[a, b]) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_duration_transition_clamped_by_clip_length() {
        let a = clip("a", 0.0, 1.2);
        let b = clip("b", 0.0, 2.0).with_transition(fade(5.0));
        assert!((total_duration(&[a, b]) - 2.01).abs() < 1e-6);
    }

    #[test]
    fn test_total_duration_empty() {
        assert_eq!(total_duration(&[]), 0.0);
    }
}
