//! Transition engine: one [`Population`] per group of animated objects.
//!
//! Each frame the population's [`ProgressTween`] yields a global progress
//! `g`. Every object turns that into its own staggered progress
//! ([`staggered_progress`]) so low-delay objects finish before high-delay
//! ones start, and then either
//!
//! * **Blend** — places itself on the straight line between its two
//!   endpoints (the authoritative signal for needles, ornaments, ribbon), or
//! * **Spring** — chases that point (or a focus point) with a damped spring,
//!   which is what photo cards use so focusing one feels physical.
//!
//! Objects that have reached their target stop integrating (`settled`) and
//! only pick up a small idle bob on the way out to the sink.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tree_layout::Endpoints;

use crate::sink::{PopulationKind, RenderSink};
use crate::spring::{SpringParams, MAX_SPRING_DT};
use crate::tween::{smoothstep, ProgressTween, DEFAULT_TRANSITION_SECS};
use crate::SceneState;

// ════════════════════════════════════════════════════════════════════════════
// Stagger
// ════════════════════════════════════════════════════════════════════════════

/// Gain on global progress. With [`STAGGER_SPREAD`] `≤ STAGGER_GAIN − 1`
/// every delay in `[0, 1)` reaches local progress 1 by `g = 1`.
pub const STAGGER_GAIN: f32 = 1.5;

/// How much of the delay is subtracted from the scaled progress.
pub const STAGGER_SPREAD: f32 = 0.5;

/// `smoothstep(clamp(g·k − delay·m, 0, 1))`.
pub fn staggered_progress(global: f32, delay: f32) -> f32 {
    smoothstep((global * STAGGER_GAIN - delay * STAGGER_SPREAD).clamp(0.0, 1.0))
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ════════════════════════════════════════════════════════════════════════════
// LayoutObject
// ════════════════════════════════════════════════════════════════════════════

/// One animated entity. Endpoints and delay are fixed at creation.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutObject {
    pub index:          usize,
    pub tree:           Vec3,
    pub galaxy:         Vec3,
    pub delay:          f32,
    pub position:       Vec3,
    pub velocity:       Vec3,
    pub scale:          f32,
    pub scale_velocity: f32,
    settled:            bool,
}

impl LayoutObject {
    /// Start at rest on the endpoint for `state`.
    pub fn new(index: usize, ends: &Endpoints, state: SceneState, scale: f32) -> Self {
        let position = match state {
            SceneState::Tree   => ends.tree,
            SceneState::Galaxy => ends.galaxy,
        };
        LayoutObject {
            index,
            tree:           ends.tree,
            galaxy:         ends.galaxy,
            delay:          ends.delay.clamp(0.0, 1.0 - f32::EPSILON),
            position,
            velocity:       Vec3::ZERO,
            scale:          scale.max(0.0),
            scale_velocity: 0.0,
            settled:        false,
        }
    }

    pub fn is_settled(&self) -> bool { self.settled }

    /// Point on the tree→galaxy line for local progress `s`.
    pub fn blend_point(&self, s: f32) -> Vec3 {
        self.tree.lerp(self.galaxy, s)
    }

    fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.scale.is_finite()
            && self.scale_velocity.is_finite()
    }

    fn snap_to(&mut self, target: Vec3, scale: f32) {
        self.position = target;
        self.velocity = Vec3::ZERO;
        self.scale = scale.max(0.0);
        self.scale_velocity = 0.0;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// How a population follows its staggered progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MotionMode {
    Blend,
    Spring(SpringParams),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub mode:             MotionMode,
    /// Length of the eased global tween, seconds.
    pub transition_secs:  f32,
    pub tree_scale:       f32,
    pub galaxy_scale:     f32,
    /// Target scale of a focused object (spring mode only).
    pub focus_scale:      f32,
    /// Position, scale and velocity error under which an object is settled.
    pub settle_tolerance: f32,
    pub bob_amplitude:    f32,
    /// Radians per second.
    pub bob_frequency:    f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        PopulationConfig {
            mode:             MotionMode::Blend,
            transition_secs:  DEFAULT_TRANSITION_SECS,
            tree_scale:       1.0,
            galaxy_scale:     1.0,
            focus_scale:      3.0,
            settle_tolerance: 1e-3,
            bob_amplitude:    0.05,
            bob_frequency:    1.5,
        }
    }
}

impl PopulationConfig {
    pub fn spring(params: SpringParams) -> Self {
        PopulationConfig {
            mode: MotionMode::Spring(params),
            ..PopulationConfig::default()
        }
    }
}

/// Work done by one [`Population::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Objects whose position was recomputed or integrated.
    pub integrated: usize,
    /// Objects that took the settled fast path.
    pub settled:    usize,
    /// Objects snapped back after a non-finite result.
    pub recovered:  usize,
}

// ════════════════════════════════════════════════════════════════════════════
// Population
// ════════════════════════════════════════════════════════════════════════════

/// A group of objects sharing one tween, one motion mode, and one sink tag.
#[derive(Clone, Debug)]
pub struct Population {
    kind:        PopulationKind,
    config:      PopulationConfig,
    objects:     Vec<LayoutObject>,
    tween:       ProgressTween,
    focus:       Option<usize>,
    focus_point: Vec3,
    elapsed:     f32,
}

impl Population {
    pub fn new(
        kind:      PopulationKind,
        endpoints: &[Endpoints],
        config:    PopulationConfig,
        initial:   SceneState,
    ) -> Self {
        let config = match config.mode {
            MotionMode::Spring(params) if !params.is_bounce_free() => {
                warn!(
                    population = kind.name(),
                    ratio = params.damping_ratio(),
                    "under-damped spring raised to critical"
                );
                PopulationConfig { mode: MotionMode::Spring(params.clamped()), ..config }
            }
            _ => config,
        };
        let scale = match initial {
            SceneState::Tree   => config.tree_scale,
            SceneState::Galaxy => config.galaxy_scale,
        };
        let objects = endpoints
            .iter()
            .enumerate()
            .map(|(i, e)| LayoutObject::new(i, e, initial, scale))
            .collect();

        Population {
            kind,
            config,
            objects,
            tween: ProgressTween::new(config.transition_secs, initial),
            focus: None,
            focus_point: Vec3::ZERO,
            elapsed: 0.0,
        }
    }

    pub fn kind(&self) -> PopulationKind { self.kind }
    pub fn config(&self) -> &PopulationConfig { &self.config }
    pub fn objects(&self) -> &[LayoutObject] { &self.objects }
    pub fn len(&self) -> usize { self.objects.len() }
    pub fn is_empty(&self) -> bool { self.objects.is_empty() }
    pub fn progress(&self) -> f32 { self.tween.value() }
    pub fn focus(&self) -> Option<usize> { self.focus }

    /// Pull object `index` to `point` at `focus_scale`, or release the focus.
    /// Out-of-range indices clear the focus.
    pub fn set_focus(&mut self, index: Option<usize>, point: Vec3) {
        let index = index.filter(|&i| i < self.objects.len());
        if index != self.focus {
            debug!(population = self.kind.name(), ?index, "focus changed");
        }
        // settle is re-checked against the new target on the next update
        self.focus = index;
        self.focus_point = point;
    }

    /// Index of the object whose current position is closest to `point`.
    pub fn nearest_to(&self, point: Vec3) -> Option<usize> {
        self.objects
            .iter()
            .min_by(|a, b| {
                a.position
                    .distance_squared(point)
                    .total_cmp(&b.position.distance_squared(point))
            })
            .map(|o| o.index)
    }

    /// Advance one frame toward `state` and write every transform to `sink`.
    ///
    /// A non-finite or non-positive `dt` skips simulation; the current
    /// transforms are still written so the sink sees a complete frame.
    pub fn update(&mut self, state: SceneState, dt: f32, sink: &mut dyn RenderSink) -> UpdateStats {
        let mut stats = UpdateStats::default();

        if !dt.is_finite() || dt <= 0.0 {
            self.emit_all(sink);
            return stats;
        }

        self.elapsed += dt;
        let global = self.tween.drive(state, dt);
        let tween_idle = self.tween.is_idle();

        match self.config.mode {
            MotionMode::Blend => self.blend_step(global, tween_idle, &mut stats),
            MotionMode::Spring(params) => {
                if dt > MAX_SPRING_DT {
                    debug!(population = self.kind.name(), dt, "clamping spring dt");
                }
                self.spring_step(params, global, dt.min(MAX_SPRING_DT), &mut stats);
            }
        }

        if stats.recovered > 0 {
            warn!(
                population = self.kind.name(),
                recovered = stats.recovered,
                "non-finite state reset to target"
            );
        }

        self.emit_all(sink);
        stats
    }

    fn blend_step(&mut self, global: f32, tween_idle: bool, stats: &mut UpdateStats) {
        let cfg = self.config;
        for obj in &mut self.objects {
            if tween_idle && obj.settled {
                stats.settled += 1;
                continue;
            }
            let s = staggered_progress(global, obj.delay);
            obj.position = obj.blend_point(s);
            obj.scale = lerp(cfg.tree_scale, cfg.galaxy_scale, s).max(0.0);
            // once the tween is idle `s` can no longer change
            obj.settled = tween_idle;
            stats.integrated += 1;
        }
    }

    fn spring_step(&mut self, params: SpringParams, global: f32, dt: f32, stats: &mut UpdateStats) {
        let cfg = self.config;
        let tol = cfg.settle_tolerance;

        for obj in &mut self.objects {
            let focused = self.focus == Some(obj.index);
            let s = staggered_progress(global, obj.delay);
            let (target, target_scale) = if focused {
                (self.focus_point, cfg.focus_scale)
            } else {
                (obj.blend_point(s), lerp(cfg.tree_scale, cfg.galaxy_scale, s))
            };

            let at_rest = obj.position.distance(target) < tol
                && (obj.scale - target_scale).abs() < tol
                && obj.velocity.length() < tol
                && obj.scale_velocity.abs() < tol;

            if at_rest {
                obj.settled = true;
                stats.settled += 1;
                continue;
            }

            obj.settled = false;
            params.advance(
                &mut obj.position,
                &mut obj.velocity,
                target,
                &mut obj.scale,
                &mut obj.scale_velocity,
                target_scale,
                dt,
            );

            if !obj.is_finite() {
                obj.snap_to(target, target_scale);
                stats.recovered += 1;
            }
            if obj.scale < 0.0 {
                obj.scale = 0.0;
                obj.scale_velocity = 0.0;
            }
            stats.integrated += 1;
        }
    }

    /// Rendered transform: simulation state, plus the idle bob for settled
    /// spring objects.
    pub fn rendered(&self, obj: &LayoutObject) -> (Vec3, f32) {
        let bob = match self.config.mode {
            MotionMode::Spring(_) if obj.settled => {
                let phase = obj.index as f32 * 0.7;
                (self.elapsed * self.config.bob_frequency + phase).sin() * self.config.bob_amplitude
            }
            _ => 0.0,
        };
        (obj.position + Vec3::Y * bob, obj.scale)
    }

    fn emit_all(&self, sink: &mut dyn RenderSink) {
        for obj in &self.objects {
            let (pos, scale) = self.rendered(obj);
            sink.set_transform(self.kind, obj.index, pos, scale);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
