//! Animation Data Tests
//!
//! Tests for:
//! - AnimationValue interpolation (lerp, slerp, Hermite, discrete hold)
//! - Easing curve endpoints and mode mirroring
//! - KeyframeTrack sampling (loop modes, step keys, cursor reuse)
//! - Track serialization round trips and malformed input handling
//! - RuntimeAnimation binding against a disposed target

use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;
use std::sync::Arc;

use glam::{Quat, Vec3};

use orrery::animation::easing::{Easing, EasingCurve, EasingMode};
use orrery::animation::observable::Observable;
use orrery::animation::runtime::RuntimeAnimation;
use orrery::animation::target::TargetHandle;
use orrery::animation::track::{AnimationLoopMode, KeyCursor, Keyframe, KeyframeTrack};
use orrery::animation::value::{AnimationValue, AnimationValueKind};
use orrery::scene::Node;

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn float_track(loop_mode: AnimationLoopMode) -> KeyframeTrack {
    KeyframeTrack::new("x", "position.x", 10.0, loop_mode).with_keys(vec![
        Keyframe::new(0.0, 0.0_f32),
        Keyframe::new(100.0, 10.0_f32),
    ])
}

// ============================================================================
// AnimationValue
// ============================================================================

#[test]
fn value_lerp_float_midpoint() {
    let a = AnimationValue::Float(0.0);
    let b = AnimationValue::Float(10.0);
    let mid = a.lerp(&b, 0.5);
    assert!(approx(mid.as_float().unwrap(), 5.0));
}

#[test]
fn value_lerp_quaternion_is_slerp() {
    let a = AnimationValue::Quaternion(Quat::IDENTITY);
    let b = AnimationValue::Quaternion(Quat::from_rotation_z(FRAC_PI_2));
    let mid = a.lerp(&b, 0.5).as_quaternion().unwrap();
    let expected = Quat::from_rotation_z(FRAC_PI_2 * 0.5);
    assert!(mid.abs_diff_eq(expected, EPSILON), "Expected {expected:?}, got {mid:?}");
    assert!(approx(mid.length(), 1.0));
}

#[test]
fn value_lerp_discrete_holds_start() {
    let a = AnimationValue::Bool(false);
    let b = AnimationValue::Bool(true);
    assert_eq!(a.lerp(&b, 0.9), AnimationValue::Bool(false));

    let a = AnimationValue::Text("walk".into());
    let b = AnimationValue::Text("run".into());
    assert_eq!(a.lerp(&b, 0.9), AnimationValue::Text("walk".into()));
}

#[test]
fn value_lerp_mismatched_kinds_returns_start() {
    let a = AnimationValue::Float(1.0);
    let b = AnimationValue::Vector3(Vec3::ONE);
    assert_eq!(a.lerp(&b, 0.5), AnimationValue::Float(1.0));
}

#[test]
fn value_hermite_zero_tangents_matches_lerp_at_midpoint() {
    let a = AnimationValue::Float(0.0);
    let b = AnimationValue::Float(10.0);
    let zero = AnimationValue::Float(0.0);
    let mid = a.hermite(&zero, &b, &zero, 0.5);
    assert!(approx(mid.as_float().unwrap(), 5.0));
}

#[test]
fn value_hermite_quaternion_stays_normalized() {
    let a = AnimationValue::Quaternion(Quat::IDENTITY);
    let b = AnimationValue::Quaternion(Quat::from_rotation_y(1.0));
    let m = AnimationValue::Quaternion(Quat::from_xyzw(0.3, 0.1, 0.0, 0.0));
    let out = a.hermite(&m, &b, &m, 0.3).as_quaternion().unwrap();
    assert!(approx(out.length(), 1.0), "Expected unit length, got {}", out.length());
}

#[test]
fn value_kind_data_type_round_trip() {
    for kind in [
        AnimationValueKind::Float,
        AnimationValueKind::Vector3,
        AnimationValueKind::Quaternion,
        AnimationValueKind::Color3,
        AnimationValueKind::Vector2,
        AnimationValueKind::Bool,
        AnimationValueKind::Text,
    ] {
        assert_eq!(AnimationValueKind::from_data_type(kind.data_type()), Some(kind));
    }
    assert_eq!(AnimationValueKind::from_data_type(3), None);
}

#[test]
fn value_json_values_round_trip_vector3() {
    let value = AnimationValue::Vector3(Vec3::new(1.0, -2.0, 3.5));
    let json = value.to_json_values();
    let back = AnimationValue::from_json_values(AnimationValueKind::Vector3, &json).unwrap();
    assert_eq!(back, value);
}

// ============================================================================
// Easing
// ============================================================================

#[test]
fn easing_endpoints_are_fixed_for_every_curve() {
    let curves = [
        EasingCurve::Sine,
        EasingCurve::Quadratic,
        EasingCurve::Cubic,
        EasingCurve::Power(4.0),
        EasingCurve::Circle,
        EasingCurve::Back(1.0),
        EasingCurve::Elastic {
            oscillations: 3,
            springiness: 3.0,
        },
        EasingCurve::Bounce {
            bounces: 3,
            bounciness: 2.0,
        },
        EasingCurve::Bezier {
            x1: 0.25,
            y1: 0.1,
            x2: 0.25,
            y2: 1.0,
        },
    ];
    for curve in curves {
        for mode in [EasingMode::EaseIn, EasingMode::EaseOut, EasingMode::EaseInOut] {
            let easing = Easing::new(curve, mode);
            assert!(
                approx(easing.ease(0.0), 0.0),
                "{curve:?}/{mode:?} at 0: got {}",
                easing.ease(0.0)
            );
            assert!(
                approx(easing.ease(1.0), 1.0),
                "{curve:?}/{mode:?} at 1: got {}",
                easing.ease(1.0)
            );
        }
    }
}

#[test]
fn easing_bounce_stays_bounded_and_rebounds() {
    let easing = Easing::new(
        EasingCurve::Bounce {
            bounces: 3,
            bounciness: 2.0,
        },
        EasingMode::EaseIn,
    );
    let mut rebounded = false;
    let mut t = 0.0;
    while t <= 1.0 {
        let v = easing.ease(t);
        assert!(v >= -EPSILON, "Bounce dipped below zero at {t}: {v}");
        assert!(v <= 1.0 + EPSILON, "Bounce overshot at {t}: {v}");
        if easing.ease(t + 0.01) < v - EPSILON {
            rebounded = true;
        }
        t += 0.01;
    }
    assert!(rebounded, "A bounce curve must come back down between arcs");
}

#[test]
fn easing_quadratic_modes() {
    let ease_in = Easing::new(EasingCurve::Quadratic, EasingMode::EaseIn);
    assert!(approx(ease_in.ease(0.5), 0.25));

    let ease_out = Easing::new(EasingCurve::Quadratic, EasingMode::EaseOut);
    assert!(approx(ease_out.ease(0.5), 0.75));

    // In-out always crosses the midpoint exactly.
    let ease_in_out = Easing::new(EasingCurve::Quadratic, EasingMode::EaseInOut);
    assert!(approx(ease_in_out.ease(0.5), 0.5));
}

// ============================================================================
// KeyframeTrack: sampling
// ============================================================================

#[test]
fn track_linear_midpoint() {
    let track = float_track(AnimationLoopMode::Cycle);
    assert!(approx(track.sample(50.0).as_float().unwrap(), 5.0));
}

#[test]
fn track_exact_keyframes() {
    let track = float_track(AnimationLoopMode::Cycle);
    assert!(approx(track.sample(0.0).as_float().unwrap(), 0.0));
    assert!(approx(track.sample(100.0).as_float().unwrap(), 10.0));
}

#[test]
fn track_cycle_wraps_past_last_key() {
    let track = float_track(AnimationLoopMode::Cycle);
    let val = track.sample(150.0).as_float().unwrap();
    assert!(approx(val, 5.0), "Expected 5.0, got {val}");
}

#[test]
fn track_constant_clamps_past_last_key() {
    let track = float_track(AnimationLoopMode::Constant);
    assert!(approx(track.sample(150.0).as_float().unwrap(), 10.0));
    assert!(approx(track.sample(-10.0).as_float().unwrap(), 0.0));
}

#[test]
fn track_relative_accumulates_net_delta() {
    let track = float_track(AnimationLoopMode::Relative);
    // One full cycle past the end: wrapped value plus one net delta.
    let val = track.sample(150.0).as_float().unwrap();
    assert!(approx(val, 15.0), "Expected 15.0, got {val}");
}

#[test]
fn track_before_first_key_clamps() {
    let track = float_track(AnimationLoopMode::Cycle);
    assert!(approx(track.sample(-5.0).as_float().unwrap(), 0.0));
}

#[test]
fn track_single_key_always_returns_it() {
    let track = KeyframeTrack::new("v", "visibility", 30.0, AnimationLoopMode::Cycle)
        .with_keys(vec![Keyframe::new(10.0, 0.5_f32)]);
    assert!(approx(track.sample(0.0).as_float().unwrap(), 0.5));
    assert!(approx(track.sample(10.0).as_float().unwrap(), 0.5));
    assert!(approx(track.sample(99.0).as_float().unwrap(), 0.5));
}

#[test]
fn track_empty_samples_to_zero() {
    let track = KeyframeTrack::new("empty", "position.x", 30.0, AnimationLoopMode::Cycle);
    assert_eq!(track.sample(5.0), AnimationValue::Float(0.0));
}

#[test]
fn track_step_keys_hold_value() {
    let track = KeyframeTrack::new("s", "position.x", 30.0, AnimationLoopMode::Constant)
        .with_keys(vec![
            Keyframe::stepped(0.0, 0.0_f32),
            Keyframe::stepped(1.0, 100.0_f32),
            Keyframe::stepped(2.0, 200.0_f32),
        ]);
    assert!(approx(track.sample(0.5).as_float().unwrap(), 0.0));
    assert!(approx(track.sample(0.99).as_float().unwrap(), 0.0));
    assert!(approx(track.sample(1.0).as_float().unwrap(), 100.0));
    assert!(approx(track.sample(1.5).as_float().unwrap(), 100.0));
}

#[test]
fn track_bool_keys_never_interpolate() {
    let track = KeyframeTrack::new("b", "visible", 30.0, AnimationLoopMode::Constant).with_keys(
        vec![Keyframe::new(0.0, false), Keyframe::new(10.0, true)],
    );
    assert_eq!(track.sample(5.0), AnimationValue::Bool(false));
    assert_eq!(track.sample(10.0), AnimationValue::Bool(true));
}

#[test]
fn track_hermite_with_tangents() {
    // Flat endpoints, outgoing tangent of 1 value-unit per frame at the
    // start: the curve bulges above zero mid-segment.
    let track = KeyframeTrack::new("h", "position.x", 30.0, AnimationLoopMode::Constant)
        .with_keys(vec![
            Keyframe::new(0.0, 0.0_f32).with_tangents(0.0_f32, 1.0_f32),
            Keyframe::new(10.0, 0.0_f32).with_tangents(0.0_f32, 0.0_f32),
        ]);
    let val = track.sample(5.0).as_float().unwrap();
    assert!(approx(val, 1.25), "Expected 1.25, got {val}");
}

#[test]
fn track_easing_applies_to_gradient() {
    let track = float_track(AnimationLoopMode::Constant)
        .with_easing(Easing::new(EasingCurve::Quadratic, EasingMode::EaseIn));
    // Gradient 0.5 eased to 0.25.
    assert!(approx(track.sample(50.0).as_float().unwrap(), 2.5));
}

#[test]
fn track_cursor_sequential_matches_fresh_lookup() {
    let keys: Vec<Keyframe> = (0..50)
        .map(|i| Keyframe::new(i as f32 * 2.0, i as f32))
        .collect();
    let track = KeyframeTrack::new("seq", "position.x", 30.0, AnimationLoopMode::Constant)
        .with_keys(keys);

    let mut cursor = KeyCursor::default();
    let mut frame = 0.0;
    while frame <= 98.0 {
        let with_cursor = track.sample_with_cursor(frame, &mut cursor).as_float().unwrap();
        let fresh = track.sample(frame).as_float().unwrap();
        assert!(approx(with_cursor, fresh), "Mismatch at frame {frame}");
        frame += 0.7;
    }
    // Scrub backwards past the bounded scan window; the fallback must agree.
    let scrubbed = track.sample_with_cursor(4.0, &mut cursor).as_float().unwrap();
    assert!(approx(scrubbed, 2.0));
}

#[test]
fn track_unsorted_keys_are_normalized() {
    init_logs();
    let track = KeyframeTrack::new("u", "position.x", 30.0, AnimationLoopMode::Cycle).with_keys(
        vec![
            Keyframe::new(100.0, 10.0_f32),
            Keyframe::new(0.0, 0.0_f32),
            Keyframe::new(50.0, 5.0_f32),
        ],
    );
    assert!(approx(track.first_frame(), 0.0));
    assert!(approx(track.last_frame(), 100.0));
    assert!(approx(track.sample(25.0).as_float().unwrap(), 2.5));
}

// ============================================================================
// KeyframeTrack: serialization
// ============================================================================

#[test]
fn track_serialize_parse_round_trip() {
    let mut track = KeyframeTrack::new(
        "move",
        "position",
        30.0,
        AnimationLoopMode::Relative,
    )
    .with_keys(vec![
        Keyframe::new(0.0, Vec3::ZERO),
        Keyframe::new(60.0, Vec3::new(1.0, 2.0, 3.0)),
    ]);
    track.enable_blending = true;
    track.blending_speed = 0.05;

    let json = track.serialize().unwrap();
    let parsed = KeyframeTrack::parse(&json).unwrap();

    assert_eq!(parsed.name, "move");
    assert_eq!(parsed.target_property, "position");
    assert!(approx(parsed.frame_per_second, 30.0));
    assert_eq!(parsed.loop_mode, AnimationLoopMode::Relative);
    assert!(parsed.enable_blending);
    assert!(approx(parsed.blending_speed, 0.05));
    assert_eq!(parsed.keys().len(), 2);
    assert_eq!(
        parsed.sample(60.0),
        AnimationValue::Vector3(Vec3::new(1.0, 2.0, 3.0))
    );
}

#[test]
fn track_parse_requires_property() {
    let json = serde_json::json!({ "name": "broken", "keys": [] });
    assert!(KeyframeTrack::parse(&json).is_err());
}

#[test]
fn track_parse_drops_undecodable_keys() {
    init_logs();
    let json = serde_json::json!({
        "name": "partial",
        "property": "position",
        "framePerSecond": 30.0,
        "dataType": 1,
        "loopBehavior": 1,
        "keys": [
            { "frame": 0.0, "values": [0.0, 0.0, 0.0] },
            { "frame": 10.0, "values": [1.0] },
            { "frame": 20.0, "values": [2.0, 2.0, 2.0] },
        ],
    });
    let parsed = KeyframeTrack::parse(&json).unwrap();
    assert_eq!(parsed.keys().len(), 2);
    assert!(approx(parsed.last_frame(), 20.0));
}

// ============================================================================
// RuntimeAnimation
// ============================================================================

#[test]
fn runtime_rejects_unknown_property() {
    let node: TargetHandle = Rc::new(RefCell::new(Node::new("n")));
    let track = Arc::new(
        KeyframeTrack::new("bad", "no.such.path", 30.0, AnimationLoopMode::Cycle)
            .with_keys(vec![Keyframe::new(0.0, 0.0_f32)]),
    );
    assert!(RuntimeAnimation::new(track, &node).is_err());
}

#[test]
fn runtime_survives_disposed_target() {
    init_logs();
    let node: TargetHandle = Rc::new(RefCell::new(Node::new("n")));
    let track = Arc::new(float_track(AnimationLoopMode::Cycle));
    let mut runtime = RuntimeAnimation::new(track, &node).unwrap();
    drop(node);

    assert!(runtime.target().is_none());
    // The write is skipped, the advance still reports running.
    let status = runtime.animate(500.0, 0.0, 100.0, true, 1.0, -1.0, None);
    assert!(status.running);
}

// ============================================================================
// Observable
// ============================================================================

#[test]
fn observable_notifies_in_registration_order_and_removes() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut observable: Observable<i32> = Observable::new();

    let first = observable.add({
        let log = Rc::clone(&log);
        move |v: &i32| log.borrow_mut().push(*v)
    });
    observable.add({
        let log = Rc::clone(&log);
        move |v: &i32| log.borrow_mut().push(v * 10)
    });

    observable.notify(&1);
    assert_eq!(*log.borrow(), vec![1, 10]);

    assert!(observable.remove(first));
    assert!(!observable.remove(first));
    observable.notify(&2);
    assert_eq!(*log.borrow(), vec![1, 10, 20]);
}
