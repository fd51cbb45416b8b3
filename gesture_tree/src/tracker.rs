//! Landmark tracker implementations — both from LeapMotion hardware and
//! keyboard simulation.
//!
//! The session only sees [`CameraDevice`] / [`LandmarkTracker`]; it does not
//! know whether landmarks came from a real sensor or were synthesised from
//! key presses. Simulated hands are built by [`synthetic_hand`] and go
//! through the real classifier.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use glam::{Vec2, Vec3};

use crate::gesture::{palm_center, GestureLabel};
use crate::landmarks::{LandmarkSet, LANDMARK_COUNT};
use crate::session::{CameraDevice, LandmarkTracker, SessionError};

// ════════════════════════════════════════════════════════════════════════════
// Synthetic hands
// ════════════════════════════════════════════════════════════════════════════

/// Knuckle offsets from the wrist for index, middle, ring, pinky.
const MCP_OFFSETS: [Vec2; 4] = [
    Vec2::new(-0.04, -0.12),
    Vec2::new(-0.01, -0.13),
    Vec2::new( 0.02, -0.12),
    Vec2::new( 0.05, -0.10),
];

/// Build a plausible upright right hand (as seen by the camera) showing
/// `label`, with its palm centre at `palm` in image space.
pub fn synthetic_hand(label: GestureLabel, palm: Vec2) -> LandmarkSet {
    let extended = match label {
        GestureLabel::Open | GestureLabel::Pinch => [true, true, true, true],
        GestureLabel::Pointing                   => [true, false, false, false],
        GestureLabel::Fist                       => [false; 4],
        // victory sign: two fingers, deliberately unclassified
        GestureLabel::None                       => [true, true, false, false],
    };

    let mut pts = [Vec3::ZERO; LANDMARK_COUNT];

    // thumb: CMC, MCP, IP, tip — swung out to the side
    pts[1] = Vec3::new(-0.04, -0.03, 0.0);
    pts[2] = Vec3::new(-0.07, -0.06, 0.0);
    pts[3] = Vec3::new(-0.10, -0.08, 0.0);
    pts[4] = Vec3::new(-0.13, -0.10, 0.0);

    for (f, (&mcp, &up)) in MCP_OFFSETS.iter().zip(extended.iter()).enumerate() {
        let base = 5 + f * 4;
        let mcp = mcp.extend(0.0);
        // extended fingers climb above the knuckle, curled ones fold under it
        let steps = if up {
            [Vec3::new(0.0, -0.04, 0.0), Vec3::new(0.0, -0.07, 0.0), Vec3::new(0.0, -0.10, 0.0)]
        } else {
            [Vec3::new(0.0, -0.03, 0.01), Vec3::new(0.0, -0.01, 0.02), Vec3::new(0.0, 0.02, 0.02)]
        };
        pts[base] = mcp;
        for (j, step) in steps.iter().enumerate() {
            pts[base + 1 + j] = mcp + *step;
        }
    }

    if label == GestureLabel::Pinch {
        // curl the index over to meet the thumb
        pts[8] = pts[5] + Vec3::new(-0.04, -0.05, 0.0);
        pts[4] = pts[8] + Vec3::new(-0.015, 0.01, 0.0);
    }

    // shift so the palm centre lands exactly on `palm`
    let shift = palm.extend(0.0) - palm_center(&LandmarkSet::from_array(pts));
    LandmarkSet::from_array(pts.map(|p| p + shift))
}

// ════════════════════════════════════════════════════════════════════════════
// SimCamera — keyboard-driven stand-in for the webcam (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Camera device whose frames come from a [`SimHandle`].
pub struct SimCamera {
    feed: Arc<Mutex<Receiver<Option<LandmarkSet>>>>,
    live: Arc<AtomicBool>,
}

/// Sending end of a [`SimCamera`], held by whoever produces input.
#[derive(Clone)]
pub struct SimHandle {
    tx:   Sender<Option<LandmarkSet>>,
    live: Arc<AtomicBool>,
}

/// A simulated camera and the handle that feeds it.
pub fn sim_camera() -> (SimCamera, SimHandle) {
    let (tx, rx) = mpsc::channel();
    let live = Arc::new(AtomicBool::new(false));
    (
        SimCamera { feed: Arc::new(Mutex::new(rx)), live: Arc::clone(&live) },
        SimHandle { tx, live },
    )
}

impl SimHandle {
    /// Queue one tracker frame showing `label` at `palm`.
    pub fn show(&self, label: GestureLabel, palm: Vec2) {
        self.send(Some(synthetic_hand(label, palm)));
    }

    /// Queue one tracker frame without a hand.
    pub fn hide(&self) {
        self.send(None);
    }

    pub fn send(&self, frame: Option<LandmarkSet>) {
        let _ = self.tx.send(frame);
    }

    /// True between a successful `open` and the tracker's `stop`.
    pub fn is_streaming(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

struct SimTracker {
    feed:    Arc<Mutex<Receiver<Option<LandmarkSet>>>>,
    live:    Arc<AtomicBool>,
    stopped: bool,
}

impl LandmarkTracker for SimTracker {
    fn drain(&mut self) -> Vec<Option<LandmarkSet>> {
        if self.stopped {
            return Vec::new();
        }
        let rx = match self.feed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rx.try_iter().collect()
    }

    fn stop(&mut self) {
        self.stopped = true;
        self.live.store(false, Ordering::SeqCst);
    }
}

impl CameraDevice for SimCamera {
    fn open(&self) -> Result<Box<dyn LandmarkTracker>, SessionError> {
        // frames queued while no tracker was attached are stale
        if let Ok(rx) = self.feed.lock() {
            rx.try_iter().for_each(drop);
        }
        self.live.store(true, Ordering::SeqCst);
        Ok(Box::new(SimTracker {
            feed:    Arc::clone(&self.feed),
            live:    Arc::clone(&self.live),
            stopped: false,
        }))
    }

    fn name(&self) -> &str {
        "simulated camera"
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UnavailableCamera — no device; exercises the pointer-only fallback
// ════════════════════════════════════════════════════════════════════════════

pub struct UnavailableCamera;

impl CameraDevice for UnavailableCamera {
    fn open(&self) -> Result<Box<dyn LandmarkTracker>, SessionError> {
        Err(SessionError::Unavailable)
    }

    fn name(&self) -> &str {
        "no camera"
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapCamera — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Landmarks from a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// The LeapC connection lives on its own polling thread; the first tracked
/// hand of each frame is mapped onto the 21-point layout:
///
/// * wrist ← middle metacarpal base
/// * finger MCP / PIP / DIP / tip ← proximal, intermediate, distal bone
///   joints
/// * thumb CMC / MCP / IP / tip ← the same bones of the thumb digit
///
/// Positions (mm) are normalised so the interaction box spans `[0,1]` and
/// y grows downward, matching camera image space.
#[cfg(feature = "leap")]
pub struct LeapCamera;

#[cfg(feature = "leap")]
struct LeapTracker {
    rx:      Receiver<Option<LandmarkSet>>,
    running: Arc<AtomicBool>,
    worker:  Option<std::thread::JoinHandle<()>>,
}

#[cfg(feature = "leap")]
impl LandmarkTracker for LeapTracker {
    fn drain(&mut self) -> Vec<Option<LandmarkSet>> {
        self.rx.try_iter().collect()
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            // the poll loop wakes at least every 100 ms
            let _ = worker.join();
        }
    }
}

#[cfg(feature = "leap")]
impl CameraDevice for LeapCamera {
    fn open(&self) -> Result<Box<dyn LandmarkTracker>, SessionError> {
        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), SessionError>>();
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let worker = std::thread::Builder::new()
            .name("leap-poll".into())
            .spawn(move || leap_poll_loop(tx, ready_tx, flag))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(LeapTracker { rx, running, worker: Some(worker) })),
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => Err(SessionError::TrackerInit("leap worker exited".into())),
        }
    }

    fn name(&self) -> &str {
        "LeapMotion"
    }
}

#[cfg(feature = "leap")]
fn leap_poll_loop(
    tx:       Sender<Option<LandmarkSet>>,
    ready_tx: Sender<Result<(), SessionError>>,
    running:  Arc<AtomicBool>,
) {
    use leaprs::*;

    let mut connection = match Connection::create(ConnectionConfig::default()) {
        Ok(c) => c,
        Err(_) => {
            let _ = ready_tx.send(Err(SessionError::TrackerInit("failed to create LeapC connection".into())));
            return;
        }
    };
    if connection.open().is_err() {
        let _ = ready_tx.send(Err(SessionError::Denied("LeapMotion device could not be opened".into())));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        let msg = match connection.poll(100) {
            Ok(m) => m,
            Err(_) => continue,
        };

        if let Event::Tracking(frame) = msg.event() {
            let landmarks = frame.hands().next().and_then(|hand| leap_landmarks(&hand));
            if tx.send(landmarks).is_err() {
                return;
            }
        }
    }
}

#[cfg(feature = "leap")]
fn leap_landmarks(hand: &leaprs::Hand) -> Option<LandmarkSet> {
    const HALF_WIDTH: f32 = 200.0; // mm either side of the sensor
    const FLOOR:      f32 = 100.0; // mm above the sensor
    const SPAN:       f32 = 400.0;

    let norm = |x: f32, y: f32, z: f32| {
        Vec3::new((x + HALF_WIDTH) / SPAN, 1.0 - (y - FLOOR) / SPAN, z / SPAN)
    };
    macro_rules! joint {
        ($v:expr) => {{ let v = $v; norm(v.x, v.y, v.z) }};
    }

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 5 {
        return None;
    }

    let mut pts = [Vec3::ZERO; LANDMARK_COUNT];
    pts[0] = joint!(digits[2].metacarpal().prev_joint());
    for (f, digit) in digits.iter().take(5).enumerate() {
        let base = 1 + f * 4;
        pts[base]     = joint!(digit.proximal().prev_joint());
        pts[base + 1] = joint!(digit.intermediate().prev_joint());
        pts[base + 2] = joint!(digit.distal().prev_joint());
        pts[base + 3] = joint!(digit.distal().next_joint());
    }
    LandmarkSet::from_slice(&pts)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::classify;

    #[test]
    fn synthetic_hand_is_centered() {
        let palm = Vec2::new(0.25, 0.75);
        let c = palm_center(&synthetic_hand(GestureLabel::Fist, palm));
        assert!((c.truncate() - palm).length() < 1e-5);
    }

    #[test]
    fn synthetic_labels_round_trip_anywhere_in_frame() {
        for palm in [Vec2::new(0.2, 0.2), Vec2::new(0.8, 0.5), Vec2::new(0.5, 0.9)] {
            for label in [GestureLabel::Fist, GestureLabel::Open, GestureLabel::Pinch, GestureLabel::Pointing] {
                assert_eq!(classify(Some(&synthetic_hand(label, palm))), label);
            }
        }
    }

    #[test]
    fn sim_tracker_delivers_in_order_then_stops() {
        let (camera, handle) = sim_camera();
        let mut tracker = camera.open().unwrap();
        assert!(handle.is_streaming());
        handle.show(GestureLabel::Open, Vec2::splat(0.5));
        handle.hide();
        let frames = tracker.drain();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_some());
        assert!(frames[1].is_none());

        tracker.stop();
        assert!(!handle.is_streaming());
        handle.show(GestureLabel::Open, Vec2::splat(0.5));
        assert!(tracker.drain().is_empty());
    }

    #[test]
    fn reopen_discards_stale_frames() {
        let (camera, handle) = sim_camera();
        handle.show(GestureLabel::Fist, Vec2::splat(0.5));
        let mut tracker = camera.open().unwrap();
        assert!(tracker.drain().is_empty());
    }

    #[test]
    fn unavailable_camera_fails() {
        assert!(matches!(UnavailableCamera.open(), Err(SessionError::Unavailable)));
    }
}
