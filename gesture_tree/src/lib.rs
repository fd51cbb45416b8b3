//! # gesture_tree
//!
//! A holiday tree of needles, ornaments, ribbon and photo cards that
//! scatters into a galaxy and gathers back, driven by hand gestures from a
//! landmark tracker or by the pointer when no camera is available.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Landmarks | Action |
//! |---|---|---|
//! | Fist | at most one finger extended | gather into the tree |
//! | Open | three or more fingers extended | scatter into the galaxy |
//! | Pinch | thumb tip near index tip | pull the photo nearest the eye forward, or release it (galaxy only) |
//! | Pointing | index finger only | focus the next photo (galaxy only) |
//!
//! While a hand is tracked in the galaxy, its position steers the camera.
//! Gestures are edge-triggered: holding a fist fires once.
//!
//! ## Pointer fallback
//!
//! Always active, whether or not the camera was granted.
//!
//! | Input | Action |
//! |---|---|
//! | double-click | toggle tree / galaxy |
//! | drag | orbit the camera |
//! | `C` | request the camera |
//! | `R` | release the camera |
//! | `Q` / `Esc` | quit |
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: the camera is a keyboard-driven
//!   simulated hand whose landmarks go through the real classifier.
//! * `leap` — **Hardware mode**: landmarks from a LeapMotion controller via
//!   LeapC.
//!
//! ### Simulated hand keys
//!
//! | Key | Hand |
//! |---|---|
//! | `1` | fist |
//! | `2` | open |
//! | `3` | pinch |
//! | `4` | pointing |
//! | `0` | two fingers (no gesture) |
//! | `H` | hide / show the hand |
//! | arrows | move the palm |

pub mod landmarks;
pub mod gesture;
pub mod session;
pub mod tracker;
pub mod config;
pub mod scene;
pub mod visualizer;
pub mod app;
