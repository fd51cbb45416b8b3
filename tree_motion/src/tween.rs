//! Eased global progress for one population.
//!
//! The tween is the only thing that watches [`SceneState`]: when the state
//! handed to [`ProgressTween::drive`] differs from the current target, the
//! tween restarts from wherever it is toward `0.0` (tree) or `1.0` (galaxy).

use crate::SceneState;

/// Default transition length in seconds.
pub const DEFAULT_TRANSITION_SECS: f32 = 1.6;

/// `3p² − 2p³`, clamped to `[0, 1]`.
pub fn smoothstep(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    p * p * (3.0 - 2.0 * p)
}

/// Cubic ease-in-out over `[0, 1]`.
pub fn ease_in_out_cubic(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        4.0 * p * p * p
    } else {
        let q = -2.0 * p + 2.0;
        1.0 - q * q * q / 2.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressTween {
    value:    f32,
    from:     f32,
    target:   f32,
    elapsed:  f32,
    duration: f32,
}

impl ProgressTween {
    /// A tween resting at `initial`'s progress target.
    pub fn new(duration: f32, initial: SceneState) -> Self {
        let v = initial.progress_target();
        ProgressTween {
            value:    v,
            from:     v,
            target:   v,
            elapsed:  duration.max(0.0),
            duration: duration.max(0.0),
        }
    }

    /// Retarget if `state` changed, advance by `dt`, and return the progress.
    ///
    /// A non-finite or non-positive `dt` retargets but does not advance.
    pub fn drive(&mut self, state: SceneState, dt: f32) -> f32 {
        let target = state.progress_target();
        if target != self.target {
            self.from = self.value;
            self.target = target;
            self.elapsed = 0.0;
        }

        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }

        let p = if self.duration <= 0.0 { 1.0 } else { self.elapsed / self.duration };
        self.value = self.from + (self.target - self.from) * ease_in_out_cubic(p);
        self.value
    }

    pub fn value(&self) -> f32 { self.value }
    pub fn target(&self) -> f32 { self.target }

    /// True once the tween has reached its target and will not change again
    /// until retargeted.
    pub fn is_idle(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_shape() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(smoothstep(-3.0), 0.0);
        assert_eq!(smoothstep(7.0), 1.0);
    }

    #[test]
    fn ease_is_monotonic() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = ease_in_out_cubic(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
        assert!((prev - 1.0).abs() < 1e-6);
    }

    #[test]
    fn tween_starts_idle_at_state() {
        let t = ProgressTween::new(1.6, SceneState::Galaxy);
        assert_eq!(t.value(), 1.0);
        assert!(t.is_idle());
    }

    #[test]
    fn tween_reaches_target_after_duration() {
        let mut t = ProgressTween::new(1.6, SceneState::Tree);
        let mut v = 0.0;
        for _ in 0..100 {
            v = t.drive(SceneState::Galaxy, 1.0 / 60.0);
        }
        assert!((v - 1.0).abs() < 1e-6);
        assert!(t.is_idle());
    }

    #[test]
    fn tween_midway_is_partial() {
        let mut t = ProgressTween::new(1.6, SceneState::Tree);
        let v = t.drive(SceneState::Galaxy, 0.8);
        assert!((v - 0.5).abs() < 1e-5);
        assert!(!t.is_idle());
    }

    #[test]
    fn retarget_mid_flight_reverses_from_current() {
        let mut t = ProgressTween::new(1.0, SceneState::Tree);
        let mid = t.drive(SceneState::Galaxy, 0.5);
        let after = t.drive(SceneState::Tree, 0.0);
        assert!((after - mid).abs() < 1e-6);
        for _ in 0..120 { t.drive(SceneState::Tree, 1.0 / 60.0); }
        assert_eq!(t.value(), 0.0);
    }

    #[test]
    fn bad_dt_does_not_advance() {
        let mut t = ProgressTween::new(1.0, SceneState::Tree);
        assert_eq!(t.drive(SceneState::Galaxy, f32::NAN), 0.0);
        assert_eq!(t.drive(SceneState::Galaxy, -1.0), 0.0);
        assert!(!t.is_idle());
    }
}
