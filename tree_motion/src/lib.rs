//! # tree_motion
//!
//! Per-frame animation of object populations between the two layouts
//! produced by [`tree_layout`], and the smoothed camera that frames them.
//!
//! ## Pieces
//!
//! | Module | Role |
//! |---|---|
//! | [`tween`] | one eased `0 ↔ 1` progress value per population |
//! | [`spring`] | damped spring parameters and semi-implicit Euler steps |
//! | [`engine`] | [`Population`]: staggered blend or spring motion, settle detection |
//! | [`camera`] | [`CameraRig`]: exponential low-pass toward hand- or orbit-derived eye |
//! | [`sink`] | [`RenderSink`]: where transforms go each frame |
//!
//! Nothing here owns a clock. Callers pass the current [`SceneState`] and
//! the frame's `dt` into every update, so one state flag can drive any
//! number of populations without shared mutable state.

pub mod camera;
pub mod engine;
pub mod sink;
pub mod spring;
pub mod tween;

use serde::{Deserialize, Serialize};

pub use camera::{CameraParams, CameraRig, FramingInput, OrbitInput};
pub use engine::{
    staggered_progress, LayoutObject, MotionMode, Population, PopulationConfig, UpdateStats,
};
pub use sink::{NullSink, PopulationKind, RecordingSink, RenderSink};
pub use spring::SpringParams;
pub use tween::ProgressTween;

/// The discrete formation every population animates toward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneState {
    #[default]
    Tree,
    Galaxy,
}

impl SceneState {
    /// Progress value a population's tween settles at for this state.
    pub fn progress_target(self) -> f32 {
        match self {
            SceneState::Tree   => 0.0,
            SceneState::Galaxy => 1.0,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SceneState::Tree   => SceneState::Galaxy,
            SceneState::Galaxy => SceneState::Tree,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SceneState::Tree   => "tree",
            SceneState::Galaxy => "galaxy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_round_trips() {
        assert_eq!(SceneState::Tree.toggled(), SceneState::Galaxy);
        assert_eq!(SceneState::Tree.toggled().toggled(), SceneState::Tree);
    }

    #[test]
    fn progress_targets() {
        assert_eq!(SceneState::Tree.progress_target(), 0.0);
        assert_eq!(SceneState::Galaxy.progress_target(), 1.0);
    }
}
