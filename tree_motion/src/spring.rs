//! Unit-mass damped springs, integrated with semi-implicit Euler
//! (velocity first, then position from the new velocity).

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Largest step a spring is ever integrated with. Longer frame gaps
/// (tab resume, debugger pause) are clamped to this.
pub const MAX_SPRING_DT: f32 = 0.033;

/// Upper bound on integration substeps per frame. Springs that would need
/// more at [`MAX_SPRING_DT`] are rejected by [`SpringParams::is_stable_at`].
pub const MAX_SUBSTEPS: u32 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParams {
    pub stiffness: f32,
    pub damping:   f32,
}

impl Default for SpringParams {
    fn default() -> Self {
        // ratio ≈ 1.03: a hair past critical, no visible overshoot
        SpringParams { stiffness: 60.0, damping: 16.0 }
    }
}

impl SpringParams {
    /// Checked constructor: under-damped parameters trip a debug assertion
    /// and are raised to critical damping.
    pub fn new(stiffness: f32, damping: f32) -> Self {
        let p = SpringParams { stiffness, damping };
        debug_assert!(p.is_bounce_free(), "under-damped spring: ratio {}", p.damping_ratio());
        p.clamped()
    }

    /// Positive stiffness and at least critical damping.
    pub fn clamped(self) -> Self {
        let k = if self.stiffness.is_finite() { self.stiffness.max(1e-4) } else { 1e-4 };
        let critical = 2.0 * k.sqrt();
        let c = if self.damping.is_finite() { self.damping.max(critical) } else { critical };
        SpringParams { stiffness: k, damping: c }
    }

    /// Critically damped spring (`ζ = 1`) of the given stiffness.
    pub fn critical(stiffness: f32) -> Self {
        let k = stiffness.max(1e-4);
        SpringParams { stiffness: k, damping: 2.0 * k.sqrt() }
    }

    /// `ζ = c / (2√k)` for unit mass.
    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * self.stiffness.max(1e-4).sqrt())
    }

    /// Springs below critical damping bounce; they are rejected by config
    /// validation.
    pub fn is_bounce_free(&self) -> bool {
        self.damping_ratio() >= 1.0 - 1e-4
    }

    /// Longest single step that keeps semi-implicit Euler stable with real,
    /// positive eigenvalues: `c·h ≤ 0.5` and `√k·h ≤ 0.25`.
    pub fn max_stable_step(&self) -> f32 {
        let by_damping = 0.5 / self.damping.max(1e-4);
        let by_stiffness = 0.25 / self.stiffness.max(1e-4).sqrt();
        by_damping.min(by_stiffness)
    }

    /// Substeps needed to integrate `dt`, at least one.
    pub fn substeps(&self, dt: f32) -> u32 {
        if dt.is_nan() || dt <= 0.0 {
            return 1;
        }
        let n = (dt / self.max_stable_step()).ceil();
        if n.is_finite() { (n as u32).clamp(1, MAX_SUBSTEPS) } else { MAX_SUBSTEPS }
    }

    /// True when a frame of `dt` fits in [`MAX_SUBSTEPS`] stable steps.
    pub fn is_stable_at(&self, dt: f32) -> bool {
        self.stiffness.is_finite()
            && self.damping.is_finite()
            && dt / self.max_stable_step() <= MAX_SUBSTEPS as f32
    }

    /// Advance a 3-D position and 1-D scale by `dt`, split into
    /// [`substeps`](Self::substeps) equal steps.
    #[allow(clippy::too_many_arguments)]
    pub fn advance(
        &self,
        pos: &mut Vec3,
        vel: &mut Vec3,
        target: Vec3,
        scale: &mut f32,
        scale_vel: &mut f32,
        target_scale: f32,
        dt: f32,
    ) {
        let n = self.substeps(dt);
        let h = dt / n as f32;
        for _ in 0..n {
            self.step_vec3(pos, vel, target, h);
            self.step_scalar(scale, scale_vel, target_scale, h);
        }
    }

    /// One step of a 3-D spring toward `target`.
    pub fn step_vec3(&self, pos: &mut Vec3, vel: &mut Vec3, target: Vec3, dt: f32) {
        let accel = (target - *pos) * self.stiffness - *vel * self.damping;
        *vel += accel * dt;
        *pos += *vel * dt;
    }

    /// One step of a 1-D spring toward `target`.
    pub fn step_scalar(&self, value: &mut f32, vel: &mut f32, target: f32, dt: f32) {
        let accel = (target - *value) * self.stiffness - *vel * self.damping;
        *vel += accel * dt;
        *value += *vel * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_has_unit_ratio() {
        let p = SpringParams::critical(80.0);
        assert!((p.damping_ratio() - 1.0).abs() < 1e-5);
        assert!(p.is_bounce_free());
    }

    #[test]
    fn default_is_bounce_free() {
        assert!(SpringParams::default().is_bounce_free());
    }

    #[test]
    fn underdamped_is_flagged() {
        let p = SpringParams { stiffness: 100.0, damping: 5.0 };
        assert!(!p.is_bounce_free());
    }

    #[test]
    fn scalar_converges_without_overshoot() {
        let p = SpringParams::default();
        let (mut x, mut v) = (0.0f32, 0.0f32);
        let mut max_x = 0.0f32;
        for _ in 0..600 {
            p.step_scalar(&mut x, &mut v, 1.0, 1.0 / 60.0);
            max_x = max_x.max(x);
        }
        assert!((x - 1.0).abs() < 1e-3);
        assert!(max_x < 1.01, "overshoot to {}", max_x);
    }

    #[test]
    fn new_clamps_to_critical() {
        let p = SpringParams::new(100.0, 30.0);
        assert_eq!(p, SpringParams { stiffness: 100.0, damping: 30.0 });
        let raised = SpringParams { stiffness: 100.0, damping: 5.0 }.clamped();
        assert!((raised.damping_ratio() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn stiff_spring_is_substepped() {
        let p = SpringParams::critical(3000.0);
        assert!(p.is_stable_at(MAX_SPRING_DT));
        let n = p.substeps(MAX_SPRING_DT);
        assert!(n > 1);
        assert!(MAX_SPRING_DT / n as f32 <= p.max_stable_step());
        assert_eq!(SpringParams::default().substeps(1.0 / 60.0), 1);
    }

    #[test]
    fn absurd_stiffness_is_unstable() {
        assert!(!SpringParams::critical(1e8).is_stable_at(MAX_SPRING_DT));
    }

    #[test]
    fn stiff_critical_spring_stays_bounded() {
        let p = SpringParams::critical(3000.0);
        for dt in [1.0 / 60.0, MAX_SPRING_DT] {
            let (mut pos, mut vel) = (Vec3::ZERO, Vec3::ZERO);
            let (mut s, mut sv) = (1.0f32, 0.0f32);
            let target = Vec3::new(10.0, 0.0, 0.0);
            let mut max_x = 0.0f32;
            for _ in 0..2000 {
                p.advance(&mut pos, &mut vel, target, &mut s, &mut sv, 2.0, dt);
                max_x = max_x.max(pos.x);
            }
            assert!(max_x <= 10.0 + 1e-2, "dt {dt}: max_x {max_x}");
            assert!(pos.distance(target) < 1e-3);
            assert!((s - 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn vec3_converges() {
        let p = SpringParams::critical(50.0);
        let mut pos = Vec3::ZERO;
        let mut vel = Vec3::ZERO;
        let target = Vec3::new(3.0, -2.0, 5.0);
        for _ in 0..600 {
            p.step_vec3(&mut pos, &mut vel, target, MAX_SPRING_DT);
        }
        assert!(pos.distance(target) < 1e-3);
        assert!(vel.length() < 1e-3);
    }
}
