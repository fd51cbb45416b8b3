//! Simulated camera → session → app → scene, end to end.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use glam::Vec2;
use gesture_tree::app::{AppState, PointerInput};
use gesture_tree::config::AppConfig;
use gesture_tree::gesture::GestureLabel;
use gesture_tree::session::CameraPermission;
use gesture_tree::tracker::{sim_camera, SimHandle};
use tree_motion::{PopulationKind, RecordingSink, SceneState};

const DT: f32 = 1.0 / 60.0;

fn config() -> AppConfig {
    AppConfig {
        needles: 60,
        ornaments: 10,
        ribbon: 30,
        photo_cards: 6,
        seed: Some(2024),
        ..AppConfig::default()
    }
}

fn granted_app(sink: &mut RecordingSink) -> (AppState, SimHandle) {
    let (camera, handle) = sim_camera();
    let mut app = AppState::new(&config(), Arc::new(camera));
    assert_eq!(app.session().permission(), CameraPermission::Pending);
    for _ in 0..400 {
        app.tick(DT, sink);
        if app.session().permission() == CameraPermission::Granted {
            return (app, handle);
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("simulated camera never granted");
}

fn frames(app: &mut AppState, sink: &mut RecordingSink, secs: f32) {
    for _ in 0..(secs / DT) as usize {
        app.tick(DT, sink);
    }
}

#[test]
fn open_hand_scatters_and_fist_gathers() {
    let mut sink = RecordingSink::default();
    let (mut app, hand) = granted_app(&mut sink);

    hand.show(GestureLabel::Open, Vec2::splat(0.5));
    app.tick(DT, &mut sink);
    assert_eq!(app.scene().state(), SceneState::Galaxy);
    assert_eq!(app.session().tracking().gesture, GestureLabel::Open);

    frames(&mut app, &mut sink, 2.0);
    let needles = &app.scene().populations()[0];
    for obj in needles.objects() {
        let (pos, _) = sink.transform(PopulationKind::Needles, obj.index).unwrap();
        assert!(pos.distance(obj.galaxy) < 1e-4);
    }

    hand.show(GestureLabel::Fist, Vec2::splat(0.5));
    frames(&mut app, &mut sink, 2.0);
    assert_eq!(app.scene().state(), SceneState::Tree);
    for obj in app.scene().populations()[0].objects() {
        assert!(obj.position.distance(obj.tree) < 1e-4);
    }
}

#[test]
fn tracked_hand_steers_camera_in_galaxy_only() {
    let mut sink = RecordingSink::default();
    let (mut app, hand) = granted_app(&mut sink);

    // tree: hand far right, camera stays on the orbit
    for _ in 0..60 {
        hand.show(GestureLabel::Fist, Vec2::new(0.1, 0.5));
        app.tick(DT, &mut sink);
    }
    let orbit_eye = app.scene().camera().position();
    assert!(orbit_eye.x.abs() < 1.0);

    // galaxy: the camera swings toward the hand
    for _ in 0..180 {
        hand.show(GestureLabel::Open, Vec2::new(0.1, 0.5));
        app.tick(DT, &mut sink);
    }
    let steered = app.scene().camera().position();
    // image x 0.1 mirrors to 0.9: right of centre
    assert!(steered.x > 5.0, "eye {steered:?}");

    let (eye, _) = sink.viewpoint.unwrap();
    assert_eq!(eye, steered);
}

#[test]
fn pinch_focuses_a_photo_card() {
    let mut sink = RecordingSink::default();
    let (mut app, hand) = granted_app(&mut sink);

    hand.show(GestureLabel::Open, Vec2::splat(0.5));
    frames(&mut app, &mut sink, 2.0);
    hand.show(GestureLabel::Pinch, Vec2::splat(0.5));
    app.tick(DT, &mut sink);
    let focused = app.scene().focus().expect("pinch should focus a card");

    frames(&mut app, &mut sink, 3.0);
    let (_, scale) = sink.transform(PopulationKind::PhotoCards, focused).unwrap();
    assert!(scale > 5.0);

    // back to open, then pinch again: release
    hand.show(GestureLabel::Open, Vec2::splat(0.5));
    app.tick(DT, &mut sink);
    hand.show(GestureLabel::Pinch, Vec2::splat(0.5));
    app.tick(DT, &mut sink);
    assert_eq!(app.scene().focus(), None);
}

#[test]
fn held_gesture_fires_once() {
    let mut sink = RecordingSink::default();
    let (mut app, hand) = granted_app(&mut sink);

    hand.show(GestureLabel::Open, Vec2::splat(0.5));
    app.tick(DT, &mut sink);
    // pointer flips back to tree; a held open hand must not re-trigger
    app.handle_pointer(PointerInput::DoubleClick);
    for _ in 0..30 {
        hand.show(GestureLabel::Open, Vec2::splat(0.5));
        app.tick(DT, &mut sink);
    }
    assert_eq!(app.scene().state(), SceneState::Tree);
}

#[test]
fn release_stops_gestures_but_not_pointer() {
    let mut sink = RecordingSink::default();
    let (mut app, hand) = granted_app(&mut sink);

    app.handle_pointer(PointerInput::ReleaseCamera);
    assert!(!hand.is_streaming());
    assert_eq!(app.session().permission(), CameraPermission::Prompt);

    hand.show(GestureLabel::Open, Vec2::splat(0.5));
    frames(&mut app, &mut sink, 0.5);
    assert_eq!(app.scene().state(), SceneState::Tree);

    app.handle_pointer(PointerInput::DoubleClick);
    assert_eq!(app.scene().state(), SceneState::Galaxy);
}

#[test]
fn lost_hand_keeps_formation() {
    let mut sink = RecordingSink::default();
    let (mut app, hand) = granted_app(&mut sink);

    hand.show(GestureLabel::Open, Vec2::splat(0.5));
    app.tick(DT, &mut sink);
    hand.hide();
    frames(&mut app, &mut sink, 0.5);

    let t = app.session().tracking();
    assert!(!t.is_tracking);
    assert_eq!(t.gesture, GestureLabel::Open);
    assert_eq!(app.scene().state(), SceneState::Galaxy);
}
