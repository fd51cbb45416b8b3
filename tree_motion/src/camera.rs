//! Camera framing: one eye position chasing a target with an exponential
//! low-pass filter.
//!
//! The filter `p += (t − p)·(1 − e^(−rate·dt))` is frame-rate independent:
//! one step of `dt` lands exactly where two steps of `dt/2` do.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::sink::RenderSink;
use crate::SceneState;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// Filter rate, 1/s. 3.0 settles to within 5% in one second.
    pub rate:        f32,
    /// Horizontal distance of the eye from the scene axis.
    pub distance:    f32,
    /// Eye height when no hand is steering.
    pub height:      f32,
    pub look_at_y:   f32,
    /// Azimuth covered as the hand crosses the frame, radians.
    pub hand_sweep:  f32,
    /// Height covered as the hand moves top to bottom.
    pub hand_lift:   f32,
    /// Idle orbit speed, radians per second.
    pub auto_rotate: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        CameraParams {
            rate:        3.0,
            distance:    28.0,
            height:      4.0,
            look_at_y:   0.0,
            hand_sweep:  PI,
            hand_lift:   16.0,
            auto_rotate: 0.15,
        }
    }
}

/// `1 − e^(−rate·dt)`: fraction of the remaining distance covered in `dt`.
pub fn smoothing_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

/// What the camera looks at when choosing its target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FramingInput {
    /// Mirrored, normalised hand position in `[0,1]²`.
    pub hand_position: Option<Vec2>,
    pub tracking:      bool,
    pub state:         SceneState,
    pub orbit_angle:   f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraRig {
    params:   CameraParams,
    position: Vec3,
}

impl CameraRig {
    pub fn new(params: CameraParams) -> Self {
        let mut rig = CameraRig { params, position: Vec3::ZERO };
        rig.position = rig.orbit_target(0.0);
        rig
    }

    pub fn position(&self) -> Vec3 { self.position }
    pub fn params(&self) -> &CameraParams { &self.params }

    pub fn look_at(&self) -> Vec3 {
        Vec3::new(0.0, self.params.look_at_y, 0.0)
    }

    /// Hand steering applies only while tracking in the galaxy formation;
    /// everything else follows the orbit angle.
    pub fn target(&self, input: &FramingInput) -> Vec3 {
        match (input.tracking, input.hand_position, input.state) {
            (true, Some(hand), SceneState::Galaxy) => self.hand_target(hand),
            _ => self.orbit_target(input.orbit_angle),
        }
    }

    pub fn orbit_target(&self, angle: f32) -> Vec3 {
        let p = &self.params;
        Vec3::new(angle.sin() * p.distance, p.height, angle.cos() * p.distance)
    }

    pub fn hand_target(&self, hand: Vec2) -> Vec3 {
        let p = &self.params;
        let hand = hand.clamp(Vec2::ZERO, Vec2::ONE);
        let azimuth = (hand.x - 0.5) * p.hand_sweep;
        // screen y grows downward; raising the hand raises the eye
        let y = p.height + (0.5 - hand.y) * p.hand_lift;
        Vec3::new(azimuth.sin() * p.distance, y, azimuth.cos() * p.distance)
    }

    /// Move toward the target for `input`. Bad `dt` leaves the eye alone.
    pub fn update(&mut self, input: &FramingInput, dt: f32) -> Vec3 {
        let target = self.target(input);
        self.advance_toward(target, dt)
    }

    pub fn advance_toward(&mut self, target: Vec3, dt: f32) -> Vec3 {
        if dt.is_finite() && dt > 0.0 && target.is_finite() {
            let alpha = smoothing_factor(self.params.rate, dt);
            self.position += (target - self.position) * alpha;
        }
        self.position
    }

    pub fn emit(&self, sink: &mut dyn RenderSink) {
        sink.set_viewpoint(self.position, self.look_at());
    }
}

// ════════════════════════════════════════════════════════════════════════════
// OrbitInput — pointer-driven orbit angle
// ════════════════════════════════════════════════════════════════════════════

/// Orbit angle from pointer drags, drifting slowly once the pointer has been
/// idle for `resume_after` seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitInput {
    angle:        f32,
    idle_secs:    f32,
    auto_rotate:  f32,
    resume_after: f32,
    /// Radians per pixel of horizontal drag.
    sensitivity:  f32,
}

impl OrbitInput {
    pub fn new(auto_rotate: f32) -> Self {
        OrbitInput {
            angle:        0.0,
            idle_secs:    0.0,
            auto_rotate,
            resume_after: 2.0,
            sensitivity:  0.01,
        }
    }

    pub fn angle(&self) -> f32 { self.angle }

    pub fn drag(&mut self, dx_pixels: f32) {
        if dx_pixels.is_finite() {
            self.angle = (self.angle - dx_pixels * self.sensitivity).rem_euclid(TAU);
            self.idle_secs = 0.0;
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.idle_secs += dt;
        if self.idle_secs >= self.resume_after {
            self.angle = (self.angle + self.auto_rotate * dt).rem_euclid(TAU);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    fn orbit_input(angle: f32) -> FramingInput {
        FramingInput {
            hand_position: None,
            tracking:      false,
            state:         SceneState::Tree,
            orbit_angle:   angle,
        }
    }

    #[test]
    fn filter_is_frame_rate_independent() {
        let target = Vec3::new(10.0, -3.0, 7.0);
        let mut one = CameraRig::new(CameraParams::default());
        let mut two = one.clone();
        for _ in 0..20 {
            one.advance_toward(target, 0.05);
            two.advance_toward(target, 0.025);
            two.advance_toward(target, 0.025);
            assert!(one.position().distance(two.position()) < 1e-4);
        }
    }

    #[test]
    fn filter_settles_within_a_second_or_so() {
        let mut rig = CameraRig::new(CameraParams::default());
        let start = rig.position();
        let target = start + Vec3::new(10.0, 0.0, 0.0);
        for _ in 0..60 {
            rig.advance_toward(target, 1.0 / 60.0);
        }
        let remaining = rig.position().distance(target) / 10.0;
        assert!(remaining < 0.06, "{} of the gap left after 1 s", remaining);
    }

    #[test]
    fn filter_never_overshoots() {
        let mut rig = CameraRig::new(CameraParams::default());
        let target = rig.position() + Vec3::X * 5.0;
        let mut last = rig.position().x;
        for _ in 0..300 {
            let x = rig.advance_toward(target, 1.0 / 30.0).x;
            assert!(x >= last && x <= target.x + 1e-4);
            last = x;
        }
    }

    #[test]
    fn bad_dt_is_ignored() {
        let mut rig = CameraRig::new(CameraParams::default());
        let before = rig.position();
        rig.advance_toward(Vec3::splat(100.0), f32::NAN);
        rig.advance_toward(Vec3::splat(100.0), -1.0);
        rig.advance_toward(Vec3::splat(100.0), 0.0);
        assert_eq!(rig.position(), before);
    }

    #[test]
    fn hand_steers_only_in_galaxy_while_tracking() {
        let rig = CameraRig::new(CameraParams::default());
        let hand = Some(Vec2::new(0.9, 0.2));
        let mut input = FramingInput {
            hand_position: hand,
            tracking:      true,
            state:         SceneState::Galaxy,
            orbit_angle:   0.0,
        };
        let steered = rig.target(&input);
        assert_eq!(steered, rig.hand_target(Vec2::new(0.9, 0.2)));

        input.state = SceneState::Tree;
        assert_eq!(rig.target(&input), rig.orbit_target(0.0));

        input.state = SceneState::Galaxy;
        input.tracking = false;
        assert_eq!(rig.target(&input), rig.orbit_target(0.0));
    }

    #[test]
    fn centred_hand_matches_zero_orbit() {
        let rig = CameraRig::new(CameraParams::default());
        let centred = rig.hand_target(Vec2::splat(0.5));
        assert!(centred.distance(rig.orbit_target(0.0)) < 1e-5);
    }

    #[test]
    fn update_emits_viewpoint() {
        let mut rig = CameraRig::new(CameraParams::default());
        rig.update(&orbit_input(1.0), 0.1);
        let mut sink = RecordingSink::default();
        rig.emit(&mut sink);
        let (eye, look) = sink.viewpoint.unwrap();
        assert_eq!(eye, rig.position());
        assert_eq!(look, Vec3::ZERO);
    }

    #[test]
    fn orbit_drifts_only_when_idle() {
        let mut orbit = OrbitInput::new(0.5);
        orbit.drag(-100.0);
        let after_drag = orbit.angle();
        assert!((after_drag - 1.0).abs() < 1e-5);
        orbit.tick(1.0);
        assert_eq!(orbit.angle(), after_drag);
        orbit.tick(1.5);
        assert!(orbit.angle() > after_drag);
    }

    #[test]
    fn orbit_angle_wraps_into_one_turn() {
        let mut orbit = OrbitInput::new(0.0);
        orbit.drag(100.0);
        assert!((orbit.angle() - (TAU - 1.0)).abs() < 1e-5);
        orbit.drag(-2000.0);
        assert!((0.0..TAU).contains(&orbit.angle()));
    }
}
