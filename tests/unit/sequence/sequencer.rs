use std::sync::{Arc, Mutex};

use super::*;
use crate::effects::transitions::{TransitionKind, WipeDir};

fn scene(value: u8, secs: f64) -> SceneFrame {
    SceneFrame {
        frame: Frame::new(FrameIndex(0), 2, 2, [value, value, value, 255].repeat(4)).unwrap(),
        duration_seconds: secs,
    }
}

fn fps(n: u32) -> Fps {
    Fps::whole(n).unwrap()
}

fn red_channel(frames: &[Frame]) -> Vec<u8> {
    frames.iter().map(|f| f.pixels[0]).collect()
}

#[test]
fn each_scene_repeats_round_duration_times_fps() {
    let frames: Vec<Frame> = expand(
        vec![scene(10, 2.0), scene(20, 3.0)],
        fps(24),
        TransitionPolicy::CUT,
    )
    .collect::<AdreelResult<_>>()
    .unwrap();
    assert_eq!(frames.len(), 120);
    assert!(frames[..48].iter().all(|f| f.pixels[0] == 10));
    assert!(frames[48..].iter().all(|f| f.pixels[0] == 20));
}

#[test]
fn short_scenes_still_emit_one_frame() {
    let frames: Vec<Frame> = expand(
        vec![scene(1, 0.001), scene(2, 0.04), scene(3, 0.03)],
        fps(25),
        TransitionPolicy::CUT,
    )
    .collect::<AdreelResult<_>>()
    .unwrap();
    // 0.025 -> 0 -> clamped to 1; 1.0 -> 1; 0.75 -> 1.
    assert_eq!(red_channel(&frames), vec![1, 2, 3]);
}

#[test]
fn indices_are_contiguous_from_zero() {
    let frames: Vec<Frame> = expand(
        vec![scene(1, 0.5), scene(2, 0.5), scene(3, 0.25)],
        fps(4),
        TransitionPolicy::crossfade(2),
    )
    .collect::<AdreelResult<_>>()
    .unwrap();
    for (i, f) in frames.iter().enumerate() {
        assert_eq!(f.index, FrameIndex(i as u64));
    }
}

#[test]
fn crossfade_inserts_frames_between_scenes_only() {
    let frames: Vec<Frame> = expand(
        vec![scene(0, 0.5), scene(255, 0.5)],
        fps(4),
        TransitionPolicy::crossfade(3),
    )
    .collect::<AdreelResult<_>>()
    .unwrap();
    // 2 + 3 + 2 frames; blend progress is 1/4, 2/4, 3/4.
    assert_eq!(red_channel(&frames), vec![0, 0, 64, 128, 191, 255, 255]);
}

#[test]
fn cut_policy_ignores_frame_count() {
    let policy = TransitionPolicy {
        kind: TransitionKind::Cut,
        frames: 10,
    };
    let n = expand(vec![scene(0, 1.0), scene(1, 1.0)], fps(2), policy).count();
    assert_eq!(n, 4);
}

#[test]
fn wipe_transition_frames_mix_both_scenes() {
    let policy = TransitionPolicy {
        kind: TransitionKind::Wipe {
            dir: WipeDir::LeftToRight,
            soft_edge: 0.0,
        },
        frames: 1,
    };
    let frames: Vec<Frame> = expand(vec![scene(0, 0.5), scene(200, 0.5)], fps(2), policy)
        .collect::<AdreelResult<_>>()
        .unwrap();
    assert_eq!(frames.len(), 3);
    // Halfway through a 2px-wide left-to-right wipe: left column new, right column old.
    let mid = &frames[1].pixels;
    assert_eq!(mid[0], 200);
    assert_eq!(mid[4], 0);
}

#[test]
fn single_scene_has_no_transition() {
    let n = expand(vec![scene(0, 1.0)], fps(3), TransitionPolicy::crossfade(5)).count();
    assert_eq!(n, 3);
}

#[test]
fn upstream_error_ends_the_stream() {
    let upstream = vec![
        Ok(scene(1, 0.5)),
        Err(AdreelError::media_shape("bad scene")),
        Ok(scene(2, 0.5)),
    ];
    let items: Vec<AdreelResult<Frame>> =
        Sequencer::new(upstream.into_iter(), fps(2), TransitionPolicy::CUT).collect();
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert_eq!(items[1].as_ref().unwrap_err().kind(), "media_shape");
}

#[test]
fn mismatched_transition_endpoints_fail() {
    let mut other = scene(9, 0.5);
    other.frame = Frame::new(FrameIndex(0), 4, 2, vec![0u8; 32]).unwrap();
    let items: Vec<AdreelResult<Frame>> =
        expand(vec![scene(1, 0.5), other], fps(2), TransitionPolicy::crossfade(1)).collect();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].as_ref().unwrap_err().kind(), "media_shape");
}

#[test]
fn cancel_is_checked_at_scene_boundaries() {
    let token = CancelToken::new();
    let trigger = token.clone();
    let reporter = ProgressReporter::new(Some(Box::new(move |p: JobProgress| {
        if p.scenes_done == 1 {
            trigger.cancel();
        }
    })));

    let mut seq = expand(
        vec![scene(1, 1.0), scene(2, 1.0), scene(3, 1.0)],
        fps(3),
        TransitionPolicy::CUT,
    )
    .with_cancel(token)
    .with_progress(reporter);

    let items: Vec<AdreelResult<Frame>> = seq.by_ref().collect();
    assert_eq!(items.len(), 4);
    assert!(items[..3].iter().all(|r| r.is_ok()));
    assert!(matches!(items[3], Err(AdreelError::Cancelled)));
    assert_eq!(seq.scenes_done(), 1);
    assert!(seq.next().is_none());
}

#[test]
fn already_cancelled_emits_nothing() {
    let token = CancelToken::new();
    token.cancel();
    let items: Vec<_> = expand(vec![scene(1, 1.0)], fps(3), TransitionPolicy::CUT)
        .with_cancel(token)
        .collect();
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(AdreelError::Cancelled)));
}

#[test]
fn progress_is_reported_per_scene_and_increases() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let reporter = ProgressReporter::new(Some(Box::new(move |p: JobProgress| {
        sink.lock().unwrap().push((p.scenes_done, p.fraction));
    })));
    let seq = expand(
        vec![scene(1, 1.0), scene(2, 1.0), scene(3, 1.0), scene(4, 1.0)],
        fps(1),
        TransitionPolicy::crossfade(1),
    )
    .with_progress(reporter);
    assert_eq!(seq.count(), 7);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1, 0.25), (2, 0.5), (3, 0.75), (4, 1.0)]
    );
}

#[test]
fn sequencer_is_lazy() {
    let pulled = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&pulled);
    let upstream = (0..3u8).map(move |i| {
        *counter.lock().unwrap() += 1;
        Ok(scene(i, 2.0))
    });
    let mut seq = Sequencer::new(upstream, fps(1), TransitionPolicy::CUT);
    seq.next();
    assert_eq!(*pulled.lock().unwrap(), 1);
    seq.next();
    seq.next();
    assert_eq!(*pulled.lock().unwrap(), 2);
}
