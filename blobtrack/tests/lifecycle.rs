use blobtrack::{BlobTracker, Detection, FrameSize, Point, Rect, TrackManager, TrackerConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashSet};

/// 600x800 frames have a 1000px diagonal, which keeps normalised numbers readable
fn frame() -> FrameSize {
    FrameSize::new(600, 800)
}

fn blob_at(cx: f64, cy: f64, size: f64) -> Detection {
    Detection::from_rect(Rect::new(cx - size / 2.0, cy - size / 2.0, size, size))
}

#[test]
fn stationary_object_converges() {
    let mut manager = TrackManager::new(TrackerConfig::default(), frame()).unwrap();
    for _ in 0..30 {
        manager.update(&[blob_at(100.0, 100.0, 20.0)]).unwrap();
    }
    let tracks = manager.tracks();
    assert_eq!(tracks.len(), 1);
    assert!((tracks[0].position.x - 100.0).abs() < 1e-3);
    assert!((tracks[0].position.y - 100.0).abs() < 1e-3);
    assert!(tracks[0].velocity.x.abs() < 1e-3);
    assert!(tracks[0].velocity.y.abs() < 1e-3);
}

#[test]
fn confirmation_gate() {
    let config = TrackerConfig {
        lifetime_threshold: 10,
        ..Default::default()
    };
    let mut manager = TrackManager::new(config, frame()).unwrap();
    let detection = [blob_at(200.0, 200.0, 30.0)];

    // The track is born on frame 1 with lifetime 0 and ages once per frame
    for frame_number in 1..=11 {
        let outputs = manager.update(&detection).unwrap();
        assert!(outputs.is_empty(), "reported too early on frame {frame_number}");
    }
    assert_eq!(manager.tracks()[0].lifetime, 10);

    let outputs = manager.update(&detection).unwrap();
    assert_eq!(manager.tracks()[0].lifetime, 11);
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].id, 1);
}

#[test]
fn lifetime_nine_is_not_reported() {
    let config = TrackerConfig {
        lifetime_threshold: 10,
        ..Default::default()
    };
    let mut manager = TrackManager::new(config, frame()).unwrap();
    let mut last = Vec::new();
    for _ in 0..10 {
        last = manager.update(&[blob_at(50.0, 50.0, 10.0)]).unwrap();
    }
    assert_eq!(manager.tracks()[0].lifetime, 9);
    assert!(last.is_empty());
}

#[test]
fn track_dies_after_too_many_empty_frames() {
    let config = TrackerConfig {
        missed_frames_threshold: 5,
        ..Default::default()
    };
    let mut manager = TrackManager::new(config, frame()).unwrap();
    manager.update(&[blob_at(300.0, 300.0, 20.0)]).unwrap();

    for missed in 1..=5 {
        manager.update(&[]).unwrap();
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.tracks()[0].missed_frames, missed);
    }

    manager.update(&[]).unwrap();
    assert!(manager.is_empty());
}

#[test]
fn confirmed_track_is_reported_at_its_prediction_on_empty_frames() {
    let config = TrackerConfig {
        lifetime_threshold: 2,
        ..Default::default()
    };
    let mut manager = TrackManager::new(config, frame()).unwrap();
    for n in 0..15 {
        manager
            .update(&[blob_at(100.0 + 5.0 * f64::from(n), 300.0, 20.0)])
            .unwrap();
    }
    let before = manager.tracks()[0];
    assert!(before.velocity.x > 0.0);

    let outputs = manager.update(&[]).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].id, before.id);

    // Dead reckoned forward along the learned velocity
    let after = manager.tracks()[0];
    assert_eq!(after.missed_frames, 1);
    assert!((outputs[0].location.x - after.position.x).abs() < 1e-9);
    assert!((outputs[0].location.y - after.position.y).abs() < 1e-9);
    assert!(outputs[0].location.x > before.position.x);
    assert_eq!(outputs[0].trajectory.last(), Some(&outputs[0].location));
}

#[test]
fn neighbouring_tracks_die_together() {
    let config = TrackerConfig {
        missed_frames_threshold: 3,
        ..Default::default()
    };
    let mut manager = TrackManager::new(config, frame()).unwrap();
    let survivor = blob_at(450.0, 650.0, 20.0);
    manager
        .update(&[
            blob_at(100.0, 300.0, 20.0),
            blob_at(140.0, 300.0, 20.0),
            blob_at(180.0, 300.0, 20.0),
            survivor,
        ])
        .unwrap();
    assert_eq!(manager.len(), 4);
    let survivor_id = manager
        .tracks()
        .iter()
        .find(|t| (t.position.x - 450.0).abs() < 1e-6)
        .map(|t| t.id)
        .unwrap();

    for missed in 1..=3 {
        manager.update(&[survivor]).unwrap();
        assert_eq!(manager.len(), 4);
        for track in manager.tracks() {
            let expected = if track.id == survivor_id { 0 } else { missed };
            assert_eq!(track.missed_frames, expected);
        }
    }

    manager.update(&[survivor]).unwrap();
    let tracks = manager.tracks();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, survivor_id);
    assert_eq!(tracks[0].missed_frames, 0);
}

#[test]
fn track_dies_when_detections_are_elsewhere() {
    let config = TrackerConfig {
        missed_frames_threshold: 5,
        ..Default::default()
    };
    let mut manager = TrackManager::new(config, frame()).unwrap();
    manager.update(&[blob_at(100.0, 100.0, 20.0)]).unwrap();

    // A far away blob is always rejected by the distance gate
    let far = [blob_at(500.0, 700.0, 20.0)];
    for _ in 0..5 {
        manager.update(&far).unwrap();
    }
    assert!(manager.tracks().iter().any(|t| t.id == 1));

    manager.update(&far).unwrap();
    assert!(manager.tracks().iter().all(|t| t.id != 1));
    // The far blob got exactly one track of its own
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.tracks()[0].id, 2);
}

#[test]
fn reappearing_object_gets_new_id() {
    let config = TrackerConfig {
        missed_frames_threshold: 2,
        ..Default::default()
    };
    let mut manager = TrackManager::new(config, frame()).unwrap();
    manager.update(&[blob_at(100.0, 100.0, 20.0)]).unwrap();
    for _ in 0..3 {
        manager.update(&[]).unwrap();
    }
    assert!(manager.is_empty());

    manager.update(&[blob_at(100.0, 100.0, 20.0)]).unwrap();
    assert_eq!(manager.tracks()[0].id, 2);
}

#[test]
fn keep_alive_inside_large_blob() {
    let base = TrackerConfig {
        lifetime_threshold: 0,
        distance_threshold: 0.02, // 20px
        ..Default::default()
    };

    for keep_alive in [true, false] {
        let config = TrackerConfig {
            keep_alive,
            ..base.clone()
        };
        let mut manager = TrackManager::new(config, frame()).unwrap();
        for _ in 0..5 {
            manager.update(&[blob_at(100.0, 100.0, 20.0)]).unwrap();
        }

        // A large blob covers the track but its centroid is about 70px away
        let large = Detection::from_rect(Rect::new(60.0, 60.0, 180.0, 180.0));
        assert!(large.bounding_box.contains(&Point::new(100.0, 100.0)));
        manager.update(&[large]).unwrap();

        let first = manager.tracks().into_iter().find(|t| t.id == 1).unwrap();
        let expected = if keep_alive { 0 } else { 1 };
        assert_eq!(first.missed_frames, expected, "keep_alive = {keep_alive}");
        // The large blob was not consumed, so it spawned a track
        assert_eq!(manager.len(), 2);
    }
}

#[test]
fn duplicate_track_from_split_blob_is_suppressed() {
    let run = |suppression: bool| {
        let config = TrackerConfig {
            lifetime_threshold: 1,
            distance_suppression_threshold: 0.05,
            age_suppression_threshold: 2.0,
            suppression,
            ..Default::default()
        };
        let mut manager = TrackManager::new(config, frame()).unwrap();
        let body = Detection::from_rect(Rect::new(100.0, 100.0, 100.0, 100.0));
        let fragment = Detection::from_rect(Rect::new(160.0, 160.0, 10.0, 10.0));

        for _ in 0..48 {
            manager.update(&[body]).unwrap();
        }
        // Segmentation starts reporting a second blob inside the first
        manager.update(&[body, fragment]).unwrap();
        manager.update(&[body, fragment]).unwrap();
        let outputs = manager.update(&[body, fragment]).unwrap();

        let lifetimes: Vec<u32> = manager.tracks().iter().map(|t| t.lifetime).collect();
        assert_eq!(lifetimes, vec![50, 2]);
        outputs.iter().map(|o| o.id).collect::<Vec<_>>()
    };

    assert_eq!(run(true), vec![1]);
    assert_eq!(run(false), vec![1, 2]);
}

#[test]
fn two_crossing_objects_keep_their_ids() {
    let config = TrackerConfig {
        lifetime_threshold: 2,
        ..Default::default()
    };
    let mut tracker = BlobTracker::new(config, frame()).unwrap();

    // Two walkers on parallel lanes 120px apart, moving in opposite directions
    let mut ids_by_lane: Option<(u32, u32)> = None;
    for step in 0..40 {
        let t = step as f64 * 4.0;
        let top = blob_at(100.0 + t, 200.0, 30.0);
        let bottom = blob_at(300.0 - t, 320.0, 30.0);
        let outputs = tracker.update(&[top, bottom]).unwrap();
        if outputs.len() == 2 {
            let top_id = outputs
                .iter()
                .min_by(|a, b| a.location.y.total_cmp(&b.location.y))
                .map(|o| o.id)
                .unwrap();
            let bottom_id = outputs.iter().find(|o| o.id != top_id).map(|o| o.id).unwrap();
            match ids_by_lane {
                None => ids_by_lane = Some((top_id, bottom_id)),
                Some(ids) => assert_eq!(ids, (top_id, bottom_id), "ids swapped at step {step}"),
            }
        }
    }
    assert!(ids_by_lane.is_some());
    assert_eq!(tracker.tracks().len(), 2);
}

#[test]
fn ids_are_unique_and_never_reused() {
    let config = TrackerConfig {
        lifetime_threshold: 0,
        missed_frames_threshold: 3,
        ..Default::default()
    };
    let mut tracker = BlobTracker::new(config, frame()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    let mut retired: HashSet<u32> = HashSet::new();
    let mut previous: BTreeSet<u32> = BTreeSet::new();
    let mut max_id = 0;

    for _ in 0..300 {
        let n = rng.gen_range(0..6);
        let raw: Vec<Detection> = (0..n)
            .map(|_| {
                blob_at(
                    rng.gen_range(20.0..580.0),
                    rng.gen_range(20.0..780.0),
                    rng.gen_range(5.0..40.0),
                )
            })
            .collect();
        tracker.update(&raw).unwrap();

        let live: Vec<u32> = tracker.tracks().iter().map(|t| t.id).collect();
        let current: BTreeSet<u32> = live.iter().copied().collect();
        assert_eq!(current.len(), live.len(), "duplicate live id");

        for id in &current {
            assert!(!retired.contains(id), "id {id} came back after dying");
            if !previous.contains(id) {
                assert!(*id > max_id, "new id {id} is not above {max_id}");
                max_id = *id;
            }
        }
        retired.extend(previous.difference(&current));
        previous = current;
    }
    assert!(max_id > 10);
}

#[test]
fn trajectory_never_exceeds_capacity() {
    let config = TrackerConfig {
        lifetime_threshold: 0,
        max_trajectory_size: 5,
        ..Default::default()
    };
    let mut tracker = BlobTracker::new(config, frame()).unwrap();
    let mut outputs = Vec::new();
    for step in 0..20 {
        outputs = tracker
            .update(&[blob_at(100.0 + step as f64, 100.0, 20.0)])
            .unwrap();
        assert!(outputs.iter().all(|o| o.trajectory.len() <= 5));
    }
    assert_eq!(outputs[0].trajectory.len(), 5);
}
