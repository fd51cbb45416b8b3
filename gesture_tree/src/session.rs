//! Gesture session: camera permission lifecycle, tracker attachment, and the
//! edge-triggered gesture stream.
//!
//! ```text
//!   Prompt ──request──▶ Pending ──open ok──▶ Granted (tracker attached)
//!     ▲                    │
//!     │                    └──open err──▶ Denied ──request──▶ Pending …
//!     └────────────── release ◀── Granted / Pending
//! ```
//!
//! Opening the camera is the only call that may block (OS permission
//! dialog, device spin-up), so it runs on a short-lived worker thread and
//! its outcome is handed back over a channel. Everything else happens in
//! [`GestureSession::poll`] on the frame thread, which makes `poll` the
//! single point where [`TrackingState`] changes. Call it before animating
//! the frame.
//!
//! Every request carries a generation number. [`GestureSession::release`]
//! bumps it, so a camera that finishes opening after release is stopped
//! and dropped instead of attached.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use glam::Vec2;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::gesture::{palm_center, pinch_distance, ClassifierConfig, GestureLabel};
use crate::landmarks::LandmarkSet;

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// Why a camera could not be acquired. Never escapes the session; it is
/// logged and turned into [`CameraPermission::Denied`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("camera access denied: {0}")]
    Denied(String),
    #[error("no camera available")]
    Unavailable,
    #[error("landmark tracker failed to start: {0}")]
    TrackerInit(String),
    #[error("could not start camera worker: {0}")]
    Worker(#[from] std::io::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// Collaborators
// ════════════════════════════════════════════════════════════════════════════

/// An attached landmark tracker with its camera stream.
pub trait LandmarkTracker: Send {
    /// Results produced since the last call, oldest first. `None` is a frame
    /// in which no hand was found.
    fn drain(&mut self) -> Vec<Option<LandmarkSet>>;

    /// Stop the camera stream and detach. Called exactly once per tracker by
    /// the session; must release the hardware before returning.
    fn stop(&mut self);
}

/// Something that can grant camera access and start a tracker on it.
pub trait CameraDevice: Send + Sync {
    /// May block. Runs on a worker thread.
    fn open(&self) -> Result<Box<dyn LandmarkTracker>, SessionError>;

    fn name(&self) -> &str {
        "camera"
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Observable state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraPermission {
    #[default]
    Prompt,
    Pending,
    Granted,
    Denied,
}

impl CameraPermission {
    pub fn name(self) -> &'static str {
        match self {
            CameraPermission::Prompt  => "prompt",
            CameraPermission::Pending => "pending",
            CameraPermission::Granted => "granted",
            CameraPermission::Denied  => "denied",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackingState {
    /// Last classified gesture. Survives frames without a hand.
    pub gesture:        GestureLabel,
    /// Palm centre, x mirrored, in `[0,1]²`. `None` while no hand is seen.
    pub hand_position:  Option<Vec2>,
    pub pinch_distance: f32,
    pub is_tracking:    bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub permission: CameraPermission,
    pub tracking:   TrackingState,
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSession
// ════════════════════════════════════════════════════════════════════════════

type Acquisition = (u64, Result<Box<dyn LandmarkTracker>, SessionError>);

pub struct GestureSession {
    device:     Arc<dyn CameraDevice>,
    classifier: ClassifierConfig,
    permission: CameraPermission,
    tracking:   TrackingState,
    tracker:    Option<Box<dyn LandmarkTracker>>,
    generation: u64,
    /// Opens started but not yet collected; at most one runs at a time.
    in_flight:  usize,
    acq_tx:     Sender<Acquisition>,
    acq_rx:     Receiver<Acquisition>,
    on_change:  Option<Box<dyn FnMut(GestureLabel)>>,
    last_error: Option<String>,
}

impl GestureSession {
    pub fn new(device: Arc<dyn CameraDevice>, classifier: ClassifierConfig) -> Self {
        let (acq_tx, acq_rx) = mpsc::channel();
        GestureSession {
            device,
            classifier,
            permission: CameraPermission::Prompt,
            tracking:   TrackingState::default(),
            tracker:    None,
            generation: 0,
            in_flight:  0,
            acq_tx,
            acq_rx,
            on_change:  None,
            last_error: None,
        }
    }

    /// Register the callback fired on every gesture change.
    pub fn on_gesture_change(&mut self, f: impl FnMut(GestureLabel) + 'static) {
        self.on_change = Some(Box::new(f));
    }

    pub fn permission(&self) -> CameraPermission { self.permission }
    pub fn tracking(&self) -> &TrackingState { &self.tracking }
    pub fn is_attached(&self) -> bool { self.tracker.is_some() }
    pub fn last_error(&self) -> Option<&str> { self.last_error.as_deref() }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot { permission: self.permission, tracking: self.tracking }
    }

    /// Ask for the camera. Returns `false` (and does nothing) while a request
    /// is already pending, the camera is already granted, or an open from a
    /// released request has not returned yet.
    pub fn request_camera(&mut self) -> bool {
        match self.permission {
            CameraPermission::Pending => {
                debug!("camera request ignored: already pending");
                return false;
            }
            CameraPermission::Granted => {
                debug!("camera request ignored: already granted");
                return false;
            }
            CameraPermission::Prompt | CameraPermission::Denied => {}
        }

        // a stale tracker must be stopped before the device is opened again
        self.collect_acquisitions();
        if self.in_flight > 0 {
            debug!("camera request ignored: previous acquisition still in flight");
            return false;
        }

        self.generation += 1;
        let generation = self.generation;
        let device = Arc::clone(&self.device);
        let tx = self.acq_tx.clone();

        let spawned = thread::Builder::new()
            .name("camera-acquire".into())
            .spawn(move || {
                let result = device.open();
                if let Err(mpsc::SendError((_, Ok(mut tracker)))) = tx.send((generation, result)) {
                    // session is gone; nobody will ever stop this tracker
                    tracker.stop();
                }
            });

        match spawned {
            Ok(_) => {
                self.in_flight += 1;
                info!(device = self.device.name(), generation, "camera requested");
                self.permission = CameraPermission::Pending;
                true
            }
            Err(e) => {
                self.deny(SessionError::from(e));
                false
            }
        }
    }

    /// Apply finished camera requests, then feed every pending tracker
    /// result through the classifier. Returns the gesture changes, in order.
    pub fn poll(&mut self) -> Vec<GestureLabel> {
        self.collect_acquisitions();

        let results = match self.tracker.as_mut() {
            Some(tracker) => tracker.drain(),
            None => return Vec::new(),
        };

        results
            .iter()
            .filter_map(|r| self.on_results(r.as_ref()))
            .collect()
    }

    /// One tracker callback. Returns the new label if it changed.
    ///
    /// Ignored unless a tracker is attached, so a stale callback after
    /// [`release`](Self::release) cannot fire notifications.
    pub fn on_results(&mut self, result: Option<&LandmarkSet>) -> Option<GestureLabel> {
        if self.permission != CameraPermission::Granted || self.tracker.is_none() {
            debug!("tracker result dropped: no attached tracker");
            return None;
        }

        let Some(set) = result else {
            // keep the last gesture; only the continuous state drops out
            self.tracking.is_tracking = false;
            self.tracking.hand_position = None;
            return None;
        };

        let label = self.classifier.classify(Some(set));
        let palm = palm_center(set);
        self.tracking.hand_position = Some(Vec2::new(1.0 - palm.x, palm.y).clamp(Vec2::ZERO, Vec2::ONE));
        self.tracking.pinch_distance = pinch_distance(set);
        self.tracking.is_tracking = true;

        if label == self.tracking.gesture {
            return None;
        }

        debug!(from = self.tracking.gesture.name(), to = label.name(), "gesture changed");
        self.tracking.gesture = label;
        if let Some(cb) = self.on_change.as_mut() {
            cb(label);
        }
        Some(label)
    }

    /// Stop the tracker and camera now and forget any request in flight.
    pub fn release(&mut self) {
        self.generation += 1;
        if let Some(mut tracker) = self.tracker.take() {
            tracker.stop();
            info!(device = self.device.name(), "camera released");
        }
        if matches!(self.permission, CameraPermission::Pending | CameraPermission::Granted) {
            self.permission = CameraPermission::Prompt;
        }
        self.tracking = TrackingState::default();
    }

    fn collect_acquisitions(&mut self) {
        loop {
            match self.acq_rx.try_recv() {
                Ok((generation, result)) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    self.apply_acquisition(generation, result);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    fn apply_acquisition(
        &mut self,
        generation: u64,
        result: Result<Box<dyn LandmarkTracker>, SessionError>,
    ) {
        let current = generation == self.generation && self.permission == CameraPermission::Pending;
        match (current, result) {
            (true, Ok(tracker)) => {
                info!(device = self.device.name(), "camera granted, tracker attached");
                self.tracker = Some(tracker);
                self.permission = CameraPermission::Granted;
                self.last_error = None;
            }
            (true, Err(e)) => self.deny(e),
            (false, Ok(mut tracker)) => {
                debug!(generation, "stale camera acquisition, releasing");
                tracker.stop();
            }
            (false, Err(e)) => {
                debug!(generation, error = %e, "stale camera failure ignored");
            }
        }
    }

    fn deny(&mut self, err: SessionError) {
        warn!(device = self.device.name(), error = %err, "camera unavailable, pointer input only");
        self.permission = CameraPermission::Denied;
        self.last_error = Some(err.to_string());
    }
}

impl Drop for GestureSession {
    fn drop(&mut self) {
        self.release();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
