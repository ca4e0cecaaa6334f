//! Property-based tests for timeline edits and duration arithmetic.

use proptest::prelude::*;
use reelcut_project_model::{
    duplicate_clip, move_clip_before, split_clip, total_duration, transition_overlap, trim_clip,
    Clip, Transition, TransitionKind, DEFAULT_MIN_PIECE_SEC,
};

fn arb_clip() -> impl Strategy<Value = Clip> {
    (0.0f64..100.0, 1.0f64..50.0, 0.25f64..=4.0, any::<bool>(), 0.0f64..3.0).prop_map(
        |(in_sec, len, speed, fade, fade_sec)| {
            let clip = Clip::new("src.mp4", in_sec, in_sec + len).with_speed(speed);
            if fade && fade_sec > 0.0 {
                clip.with_transition(Transition::new(TransitionKind::Fade, fade_sec))
            } else {
                clip
            }
        },
    )
}

fn arb_track() -> impl Strategy<Value = Vec<Clip>> {
    prop::collection::vec(arb_clip(), 1..8).prop_map(|mut clips| {
        clips[0].transition_in = None;
        clips
    })
}

proptest! {
    /// A split partitions both the output duration and the source range.
    #[test]
    fn split_partitions_clip(clip in arb_clip(), fraction in 0.4f64..0.6) {
        let duration = clip.duration();
        let at = duration * fraction;
        let out = split_clip(std::slice::from_ref(&clip), &clip.id, at, DEFAULT_MIN_PIECE_SEC);

        prop_assert!(out.is_changed());
        prop_assert_eq!(out.clips.len(), 2);
        let (left, right) = (&out.clips[0], &out.clips[1]);
        prop_assert!((left.duration() + right.duration() - duration).abs() < 1e-6);
        prop_assert!((left.in_sec - clip.in_sec).abs() < 1e-12);
        prop_assert!((left.out_sec - right.in_sec).abs() < 1e-12);
        prop_assert!((right.out_sec - clip.out_sec).abs() < 1e-12);
        prop_assert!(right.transition_in.is_none());
    }

    /// Total duration never goes negative or exceeds the plain sum.
    #[test]
    fn total_duration_is_bounded(clips in arb_track()) {
        let sum: f64 = clips.iter().map(Clip::duration).sum();
        let total = total_duration(&clips);
        prop_assert!(total >= 0.0);
        prop_assert!(total <= sum + 1e-9);

        let overlap: f64 = clips.windows(2).map(|w| transition_overlap(&w[0], &w[1])).sum();
        prop_assert!((total - (sum - overlap)).abs() < 1e-9);
    }

    /// Without transitions durations simply add up.
    #[test]
    fn hard_cuts_are_additive(mut clips in arb_track()) {
        for clip in &mut clips {
            clip.transition_in = None;
        }
        let sum: f64 = clips.iter().map(Clip::duration).sum();
        prop_assert!((total_duration(&clips) - sum).abs() < 1e-9);
    }

    #[test]
    fn duplicate_never_copies_transition(clips in arb_track(), pick in any::<prop::sample::Index>()) {
        let index = pick.index(clips.len());
        let out = duplicate_clip(&clips, &clips[index].id);
        prop_assert_eq!(out.clips.len(), clips.len() + 1);
        prop_assert!(out.clips[index + 1].transition_in.is_none());
    }

    #[test]
    fn moving_to_front_clears_transition(clips in arb_track(), pick in any::<prop::sample::Index>()) {
        let index = pick.index(clips.len());
        let out = move_clip_before(&clips, &clips[index].id, &clips[0].id);
        prop_assert_eq!(&out.clips[0].id, &clips[index].id);
        prop_assert!(out.clips[0].transition_in.is_none());
    }

    #[test]
    fn trim_to_current_range_is_noop(clips in arb_track(), pick in any::<prop::sample::Index>()) {
        let clip = &clips[pick.index(clips.len())];
        let out = trim_clip(&clips, &clip.id, clip.in_sec, clip.out_sec, DEFAULT_MIN_PIECE_SEC);
        prop_assert!(!out.is_changed());
        prop_assert_eq!(out.message(), "Trim: no changes");
        prop_assert_eq!(out.clips, clips.clone());
    }
}
