//! Top-level application state machine.
//!
//! `AppState` owns the [`GestureSession`] and the [`Scene`]. Gesture edges
//! and pointer input both land here and become scene intents; the render
//! loop only ever sees the resulting transforms.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::info;
use tree_motion::{RenderSink, SceneState, UpdateStats};

use crate::config::{AppConfig, ConfigError};
use crate::gesture::GestureLabel;
use crate::scene::Scene;
use crate::session::{CameraDevice, CameraPermission, GestureSession};
use crate::tracker::{SimHandle, UnavailableCamera};
use crate::visualizer::Visualizer;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("window: {0}")]
    Window(#[from] minifb::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ════════════════════════════════════════════════════════════════════════════
// Pointer input
// ════════════════════════════════════════════════════════════════════════════

/// Mouse and keyboard intents. Always available, camera or not.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerInput {
    DoubleClick,
    /// Horizontal drag since the last frame, pixels.
    Drag { dx: f32 },
    RequestCamera,
    ReleaseCamera,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    session:    GestureSession,
    scene:      Scene,
    /// Last action, shown in the status bar.
    pub status: String,
}

impl AppState {
    pub fn new(cfg: &AppConfig, device: Arc<dyn CameraDevice>) -> Self {
        Self::with_scene(cfg, device, Scene::new(cfg))
    }

    pub fn with_scene(cfg: &AppConfig, device: Arc<dyn CameraDevice>, scene: Scene) -> Self {
        let mut app = AppState {
            session: GestureSession::new(device, cfg.classifier),
            scene,
            status:  "Ready — double-click to toggle, C for camera".to_string(),
        };
        if cfg.start_camera {
            app.handle_pointer(PointerInput::RequestCamera);
        }
        app
    }

    pub fn scene(&self) -> &Scene { &self.scene }
    pub fn session(&self) -> &GestureSession { &self.session }

    // ── gesture edges ─────────────────────────────────────────────────────

    pub fn handle_gesture(&mut self, gesture: GestureLabel) {
        match gesture {
            GestureLabel::Fist => {
                self.scene.set_state(SceneState::Tree);
                self.status = "FIST — gathering into the tree".to_string();
            }

            GestureLabel::Open => {
                self.scene.set_state(SceneState::Galaxy);
                self.status = "OPEN — scattering into the galaxy".to_string();
            }

            GestureLabel::Pinch => {
                if self.scene.state() != SceneState::Galaxy {
                    self.status = "PINCH — open your hand first".to_string();
                    return;
                }
                self.status = match self.scene.toggle_focus_nearest() {
                    Some(i) => format!("PINCH — photo {} pulled forward", i + 1),
                    None    => "PINCH — photo released".to_string(),
                };
            }

            GestureLabel::Pointing => {
                if let Some(i) = self.scene.cycle_focus() {
                    self.status = format!("POINT — photo {} of {}", i + 1, self.scene.photos().len());
                }
            }

            GestureLabel::None => {}
        }
    }

    // ── pointer fallback ──────────────────────────────────────────────────

    pub fn handle_pointer(&mut self, input: PointerInput) {
        match input {
            PointerInput::DoubleClick => {
                let state = self.scene.toggle();
                self.status = format!("Double-click — {}", state.name());
            }

            PointerInput::Drag { dx } => self.scene.drag(dx),

            PointerInput::RequestCamera => {
                if self.session.request_camera() {
                    self.status = "Waiting for camera…".to_string();
                }
            }

            PointerInput::ReleaseCamera => {
                self.session.release();
                self.status = "Camera released — pointer only".to_string();
            }
        }
    }

    // ── per-frame tick ────────────────────────────────────────────────────

    /// Drain the session, apply its gesture edges, then advance the scene.
    pub fn tick(&mut self, dt: f32, sink: &mut dyn RenderSink) -> UpdateStats {
        let before = self.session.permission();
        for gesture in self.session.poll() {
            self.handle_gesture(gesture);
        }
        let after = self.session.permission();
        if before != after {
            self.status = match after {
                CameraPermission::Granted => "Camera ready — fist / open / pinch / point".to_string(),
                CameraPermission::Denied  => "No camera — pointer only".to_string(),
                _ => self.status.clone(),
            };
        }

        let tracking = *self.session.tracking();
        self.scene.update(&tracking, dt, sink)
    }

    /// One-line summary of scene, camera and hand.
    pub fn hud_line(&self) -> String {
        let t = self.session.tracking();
        let hand = match t.hand_position {
            Some(p) if t.is_tracking => format!("{:.2},{:.2}", p.x, p.y),
            _ => "-".to_string(),
        };
        let focus = self
            .scene
            .focus()
            .map(|i| (i + 1).to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}  camera: {}  gesture: {}  hand: {}  focus: {}",
            self.scene.state().name(),
            self.session.permission().name(),
            t.gesture.name(),
            hand,
            focus,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "leap")]
fn camera_device() -> (Arc<dyn CameraDevice>, Option<SimHandle>) {
    (Arc::new(crate::tracker::LeapCamera), None)
}

#[cfg(not(feature = "leap"))]
fn camera_device() -> (Arc<dyn CameraDevice>, Option<SimHandle>) {
    let (camera, handle) = crate::tracker::sim_camera();
    (Arc::new(camera), Some(handle))
}

/// Run the full application.
///
/// Opens the visualizer, picks the camera device (simulated by default,
/// LeapMotion with `--features leap`, none with `use_camera = false`), and
/// drives the poll → gestures → scene → render loop at ~60 fps.
pub fn run(cfg: AppConfig, use_camera: bool) -> Result<(), AppError> {
    cfg.validate()?;

    let (device, sim) = if use_camera {
        camera_device()
    } else {
        (Arc::new(UnavailableCamera) as Arc<dyn CameraDevice>, None)
    };
    info!(device = device.name(), objects = cfg.needles + cfg.ornaments + cfg.ribbon + cfg.photo_cards, "starting");

    let mut vis = Visualizer::new(sim, cfg.double_click_ms)?;
    let mut app = AppState::new(&cfg, device);

    let mut pointer = Vec::new();
    let mut last = Instant::now();

    while vis.is_open() {
        // 1. Window input → pointer intents and simulated hand frames
        pointer.clear();
        if !vis.poll_input(&mut pointer) {
            break;
        }
        for input in pointer.drain(..) {
            app.handle_pointer(input);
        }

        // 2. Session, gestures, scene
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;
        app.tick(dt, &mut vis);

        // 3. Render
        vis.present(&app.hud_line(), &app.status);
    }

    info!("window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use tree_motion::NullSink;

    fn make_app() -> AppState {
        let cfg = AppConfig {
            needles: 30,
            ornaments: 6,
            ribbon: 12,
            photo_cards: 4,
            seed: Some(3),
            start_camera: false,
            ..AppConfig::default()
        };
        AppState::new(&cfg, Arc::new(UnavailableCamera))
    }

    #[test]
    fn fist_and_open_set_formation() {
        let mut app = make_app();
        app.handle_gesture(GestureLabel::Open);
        assert_eq!(app.scene.state(), SceneState::Galaxy);
        app.handle_gesture(GestureLabel::Open);
        assert_eq!(app.scene.state(), SceneState::Galaxy);
        app.handle_gesture(GestureLabel::Fist);
        assert_eq!(app.scene.state(), SceneState::Tree);
    }

    #[test]
    fn none_gesture_is_ignored() {
        let mut app = make_app();
        let status = app.status.clone();
        app.handle_gesture(GestureLabel::None);
        assert_eq!(app.scene.state(), SceneState::Tree);
        assert_eq!(app.status, status);
    }

    #[test]
    fn pinch_needs_galaxy() {
        let mut app = make_app();
        app.handle_gesture(GestureLabel::Pinch);
        assert_eq!(app.scene.focus(), None);

        app.handle_gesture(GestureLabel::Open);
        app.handle_gesture(GestureLabel::Pinch);
        assert!(app.scene.focus().is_some());
        app.handle_gesture(GestureLabel::Pinch);
        assert_eq!(app.scene.focus(), None);
    }

    #[test]
    fn pointing_cycles_focus() {
        let mut app = make_app();
        app.handle_gesture(GestureLabel::Open);
        app.handle_gesture(GestureLabel::Pointing);
        assert_eq!(app.scene.focus(), Some(0));
        app.handle_gesture(GestureLabel::Pointing);
        assert_eq!(app.scene.focus(), Some(1));
    }

    #[test]
    fn double_click_toggles() {
        let mut app = make_app();
        app.handle_pointer(PointerInput::DoubleClick);
        assert_eq!(app.scene.state(), SceneState::Galaxy);
        app.handle_pointer(PointerInput::DoubleClick);
        assert_eq!(app.scene.state(), SceneState::Tree);
    }

    #[test]
    fn denied_camera_leaves_pointer_working() {
        let mut app = make_app();
        app.handle_pointer(PointerInput::RequestCamera);
        for _ in 0..400 {
            app.tick(1.0 / 60.0, &mut NullSink);
            if app.session.permission() != CameraPermission::Pending {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(app.session.permission(), CameraPermission::Denied);
        assert!(app.status.contains("pointer"));

        app.handle_pointer(PointerInput::DoubleClick);
        assert_eq!(app.scene.state(), SceneState::Galaxy);
    }

    #[test]
    fn hud_reflects_state() {
        let mut app = make_app();
        assert!(app.hud_line().starts_with("tree"));
        assert!(app.hud_line().contains("camera: prompt"));
        app.handle_gesture(GestureLabel::Open);
        app.handle_gesture(GestureLabel::Pointing);
        let hud = app.hud_line();
        assert!(hud.starts_with("galaxy"));
        assert!(hud.contains("focus: 1"));
    }
}
