//! The assembled scene: four populations and the camera, advanced one frame
//! at a time.
//!
//! | Population | Tree endpoint | Motion |
//! |---|---|---|
//! | needles | random fill of the cone | staggered blend |
//! | ornaments | golden-angle ring on the cone surface | staggered blend |
//! | ribbon | helix around the cone | staggered blend |
//! | photo cards | random fill of the cone | spring, focusable |
//!
//! Every population's galaxy endpoint comes from the shell generator.

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use tree_layout::{seed_population, TreeShape};
use tree_motion::{
    CameraRig, FramingInput, OrbitInput, Population, PopulationConfig, PopulationKind, RenderSink,
    SceneState, UpdateStats,
};

use crate::config::AppConfig;
use crate::session::TrackingState;

pub struct Scene {
    state:          SceneState,
    populations:    [Population; 4],
    camera:         CameraRig,
    orbit:          OrbitInput,
    focus_distance: f32,
}

const PHOTOS: usize = 3;

impl Scene {
    /// Seed from `cfg.seed`, or from the OS when unset.
    pub fn new(cfg: &AppConfig) -> Self {
        let seed = cfg.seed.unwrap_or_else(rand::random);
        info!(seed, "seeding scene layout");
        Self::with_rng(cfg, &mut StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng + ?Sized>(cfg: &AppConfig, rng: &mut R) -> Self {
        let state = cfg.initial_state;
        let base = PopulationConfig {
            transition_secs: cfg.transition_secs,
            ..PopulationConfig::default()
        };

        let mut build = |kind: PopulationKind,
                         shape: TreeShape,
                         count: usize,
                         tree_scale: f32,
                         galaxy_scale: f32,
                         config: PopulationConfig| {
            let ends = seed_population(shape, count, &cfg.cone, &cfg.shell, &mut *rng);
            Population::new(kind, &ends, PopulationConfig { tree_scale, galaxy_scale, ..config }, state)
        };

        let populations = [
            build(PopulationKind::Needles, TreeShape::Cone, cfg.needles, 1.0, 0.7, base),
            build(PopulationKind::Ornaments, TreeShape::Ring, cfg.ornaments, 2.2, 1.6, base),
            build(
                PopulationKind::Ribbon,
                TreeShape::Spiral { turns: cfg.ribbon_turns },
                cfg.ribbon,
                0.8,
                0.5,
                base,
            ),
            build(
                PopulationKind::PhotoCards,
                TreeShape::Cone,
                cfg.photo_cards,
                2.5,
                2.0,
                PopulationConfig {
                    transition_secs: cfg.transition_secs,
                    focus_scale: 6.0,
                    ..PopulationConfig::spring(cfg.photo_spring)
                },
            ),
        ];

        Scene {
            state,
            populations,
            camera:         CameraRig::new(cfg.camera),
            orbit:          OrbitInput::new(cfg.camera.auto_rotate),
            focus_distance: cfg.focus_distance,
        }
    }

    pub fn state(&self) -> SceneState { self.state }
    pub fn camera(&self) -> &CameraRig { &self.camera }
    pub fn populations(&self) -> &[Population] { &self.populations }
    pub fn photos(&self) -> &Population { &self.populations[PHOTOS] }
    pub fn focus(&self) -> Option<usize> { self.photos().focus() }

    pub fn object_count(&self) -> usize {
        self.populations.iter().map(Population::len).sum()
    }

    /// Returns `true` if the state changed. Leaving the galaxy drops any
    /// focused photo back into the tree.
    pub fn set_state(&mut self, state: SceneState) -> bool {
        if state == self.state {
            return false;
        }
        info!(from = self.state.name(), to = state.name(), "scene state");
        self.state = state;
        if state == SceneState::Tree {
            self.clear_focus();
        }
        true
    }

    pub fn toggle(&mut self) -> SceneState {
        self.set_state(self.state.toggled());
        self.state
    }

    /// Focus the photo card closest to the eye, or release the current one.
    /// Only meaningful in the galaxy; returns the new focus.
    pub fn toggle_focus_nearest(&mut self) -> Option<usize> {
        if self.state != SceneState::Galaxy {
            debug!("focus ignored outside galaxy");
            return None;
        }
        let next = match self.focus() {
            Some(_) => None,
            None => self.photos().nearest_to(self.camera.position()),
        };
        self.set_focus(next);
        next
    }

    /// Step focus to the next photo card, wrapping. Galaxy only.
    pub fn cycle_focus(&mut self) -> Option<usize> {
        if self.state != SceneState::Galaxy {
            return self.focus();
        }
        let n = self.photos().len();
        let next = match self.focus() {
            _ if n == 0 => None,
            Some(i) => Some((i + 1) % n),
            None => Some(0),
        };
        self.set_focus(next);
        next
    }

    pub fn clear_focus(&mut self) {
        self.set_focus(None);
    }

    /// Horizontal pointer drag, in pixels.
    pub fn drag(&mut self, dx: f32) {
        self.orbit.drag(dx);
    }

    /// Advance one frame: focus point from the current eye, every
    /// population, then the camera. Writes a complete frame to `sink`.
    pub fn update(&mut self, tracking: &TrackingState, dt: f32, sink: &mut dyn RenderSink) -> UpdateStats {
        sink.begin_frame();
        self.orbit.tick(dt);

        let focus = self.focus();
        let point = self.focus_point();
        self.populations[PHOTOS].set_focus(focus, point);

        let mut stats = UpdateStats::default();
        for pop in &mut self.populations {
            let s = pop.update(self.state, dt, sink);
            stats.integrated += s.integrated;
            stats.settled += s.settled;
            stats.recovered += s.recovered;
        }

        let input = FramingInput {
            hand_position: tracking.hand_position,
            tracking:      tracking.is_tracking,
            state:         self.state,
            orbit_angle:   self.orbit.angle(),
        };
        self.camera.update(&input, dt);
        self.camera.emit(sink);
        stats
    }

    fn set_focus(&mut self, index: Option<usize>) {
        let point = self.focus_point();
        self.populations[PHOTOS].set_focus(index, point);
    }

    /// `focus_distance` in front of the eye, toward the look-at point.
    fn focus_point(&self) -> Vec3 {
        let eye = self.camera.position();
        let dir = (self.camera.look_at() - eye).normalize_or_zero();
        eye + dir * self.focus_distance
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
