//! # tree_layout
//!
//! Target-position generators for the two scene formations and the
//! specialised sub-arrangements that decorate them.
//!
//! | Generator | Formation | Placement |
//! |---|---|---|
//! | [`tree_cone`] | tree | random azimuth, random radial fill inside the cone envelope |
//! | [`galaxy_shell`] | galaxy | uniform-on-sphere direction, radius in a band, flattened in y |
//! | [`ornament_ring`] | tree | golden-angle azimuth per index, on the cone surface |
//! | [`spiral_ribbon`] | tree | deterministic helix wrapping the cone several times |
//!
//! Every generator is called once per object when a population is seeded;
//! the results are immutable endpoints for the motion engine afterwards.
//! Randomised generators take `&mut impl Rng` so callers can seed them.
//!
//! ```rust
//! use rand::{SeedableRng, rngs::StdRng};
//! use tree_layout::{seed_population, ConeParams, ShellParams, TreeShape};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let needles = seed_population(
//!     TreeShape::Cone, 500, &ConeParams::default(), &ShellParams::default(), &mut rng,
//! );
//! assert_eq!(needles.len(), 500);
//! ```

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Constants
// ════════════════════════════════════════════════════════════════════════════

/// Azimuth increment between consecutive ornaments (radians).
/// `π(3 − √5)`, so no two ornaments ever line up vertically.
pub const GOLDEN_ANGLE: f32 = 2.399_963_2;

/// Exponent applied to `index / total` when choosing a height on the cone.
pub const HEIGHT_EXPONENT: f32 = 0.8;

/// Default number of full revolutions for [`spiral_ribbon`].
pub const DEFAULT_RIBBON_TURNS: f32 = 5.0;

/// Ornaments and ribbon sit this far outside the cone surface so they are
/// not buried in the needles.
const SURFACE_OFFSET: f32 = 0.25;

// ════════════════════════════════════════════════════════════════════════════
// Parameters
// ════════════════════════════════════════════════════════════════════════════

/// Geometry of the tree cone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConeParams {
    /// Apex height above `base_y`.
    pub height:      f32,
    /// Radius at the base of the cone.
    pub base_radius: f32,
    /// World y of the cone's base.
    pub base_y:      f32,
}

impl Default for ConeParams {
    fn default() -> Self {
        ConeParams {
            height:      12.0,
            base_radius: 4.5,
            base_y:      -6.0,
        }
    }
}

impl ConeParams {
    /// Cone radius at normalised height `t` (0 = base, 1 = apex).
    pub fn radius_at(&self, t: f32) -> f32 {
        self.base_radius * (1.0 - t.clamp(0.0, 1.0))
    }

    /// World y at normalised height `t`.
    pub fn y_at(&self, t: f32) -> f32 {
        self.base_y + t.clamp(0.0, 1.0) * self.height
    }
}

/// Geometry of the dispersed galaxy shell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellParams {
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Vertical compression factor applied after spherical sampling.
    pub flatten:      f32,
}

impl Default for ShellParams {
    fn default() -> Self {
        ShellParams {
            inner_radius: 12.0,
            outer_radius: 22.0,
            flatten:      0.5,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Generators
// ════════════════════════════════════════════════════════════════════════════

/// Normalised cone height for object `index` of `total`: `(index/total)^0.8`.
pub fn height_param(index: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let frac = (index as f32 / total as f32).clamp(0.0, 1.0);
    frac.powf(HEIGHT_EXPONENT)
}

/// Tree formation: unordered scatter inside the cone's radial envelope.
///
/// Height is a pure function of `index`; azimuth and radial fill are random,
/// so two calls with the same index land at the same height but elsewhere
/// on that slice of the cone.
pub fn tree_cone<R: Rng + ?Sized>(
    index:  usize,
    total:  usize,
    params: &ConeParams,
    rng:    &mut R,
) -> Vec3 {
    let t = height_param(index, total);
    let envelope = params.radius_at(t);
    // sqrt gives an even fill over the disc area instead of crowding the axis
    let r = envelope * rng.random::<f32>().sqrt();
    let angle = rng.random::<f32>() * TAU;
    Vec3::new(r * angle.cos(), params.y_at(t), r * angle.sin())
}

/// Galaxy formation: a flattened spherical shell.
///
/// Direction is uniform on the sphere (inverse-CDF on the polar angle,
/// `φ = acos(2u − 1)`); radius is uniform in `[inner_radius, outer_radius]`.
pub fn galaxy_shell<R: Rng + ?Sized>(params: &ShellParams, rng: &mut R) -> Vec3 {
    let theta = rng.random::<f32>() * TAU;
    let phi = (2.0 * rng.random::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let band = (params.outer_radius - params.inner_radius).max(0.0);
    let r = params.inner_radius + rng.random::<f32>() * band;

    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.cos() * params.flatten,
        r * phi.sin() * theta.sin(),
    )
}

/// Ornaments: evenly spread up the cone with a fixed golden-angle step.
pub fn ornament_ring(index: usize, total: usize, params: &ConeParams) -> Vec3 {
    let t = if total == 0 {
        0.0
    } else {
        // Centre each ornament in its slot; keeps the last one off the apex.
        (index as f32 + 0.5) / total as f32
    };
    let angle = index as f32 * GOLDEN_ANGLE;
    let r = params.radius_at(t) + SURFACE_OFFSET;
    Vec3::new(r * angle.cos(), params.y_at(t), r * angle.sin())
}

/// Garland: a helix climbing the cone, `turns` full revolutions base to apex.
pub fn spiral_ribbon(index: usize, total: usize, params: &ConeParams, turns: f32) -> Vec3 {
    let t = if total <= 1 {
        0.0
    } else {
        index as f32 / (total - 1) as f32
    };
    let angle = t * turns * TAU;
    let r = params.radius_at(t) + SURFACE_OFFSET;
    Vec3::new(r * angle.cos(), params.y_at(t), r * angle.sin())
}

/// Per-object stagger offset in `[0, 1)`.
pub fn stagger_delay<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    // random::<f32>() is half-open already; the min guards a future rng swap
    rng.random::<f32>().min(1.0 - f32::EPSILON)
}

// ════════════════════════════════════════════════════════════════════════════
// Population seeding
// ════════════════════════════════════════════════════════════════════════════

/// Which generator supplies the tree-formation endpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TreeShape {
    Cone,
    Ring,
    Spiral { turns: f32 },
}

/// The two fixed endpoints and stagger delay of one object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Endpoints {
    pub tree:   Vec3,
    pub galaxy: Vec3,
    pub delay:  f32,
}

/// Generate endpoints for `count` objects. The galaxy endpoint always comes
/// from [`galaxy_shell`].
pub fn seed_population<R: Rng + ?Sized>(
    shape: TreeShape,
    count: usize,
    cone:  &ConeParams,
    shell: &ShellParams,
    rng:   &mut R,
) -> Vec<Endpoints> {
    (0..count)
        .map(|i| {
            let tree = match shape {
                TreeShape::Cone            => tree_cone(i, count, cone, rng),
                TreeShape::Ring            => ornament_ring(i, count, cone),
                TreeShape::Spiral { turns } => spiral_ribbon(i, count, cone, turns),
            };
            Endpoints {
                tree,
                galaxy: galaxy_shell(shell, rng),
                delay:  stagger_delay(rng),
            }
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x7EE)
    }

    #[test]
    fn height_param_bounds() {
        assert_eq!(height_param(0, 100), 0.0);
        assert!((height_param(100, 100) - 1.0).abs() < 1e-6);
        assert_eq!(height_param(3, 0), 0.0);
        // 0.5^0.8 ≈ 0.574
        assert!((height_param(50, 100) - 0.5f32.powf(0.8)).abs() < 1e-6);
    }

    #[test]
    fn tree_cone_inside_envelope() {
        let params = ConeParams::default();
        let mut r = rng();
        for i in 0..1000 {
            let p = tree_cone(i, 1000, &params, &mut r);
            let t = height_param(i, 1000);
            let radial = (p.x * p.x + p.z * p.z).sqrt();
            assert!(radial <= params.radius_at(t) + 1e-4, "index {} outside cone", i);
            assert!((p.y - params.y_at(t)).abs() < 1e-4);
        }
    }

    #[test]
    fn tree_cone_height_follows_index() {
        let params = ConeParams::default();
        let mut r = rng();
        let low  = tree_cone(10,  1000, &params, &mut r);
        let high = tree_cone(900, 1000, &params, &mut r);
        assert!(high.y > low.y);
    }

    #[test]
    fn galaxy_shell_in_band() {
        let params = ShellParams::default();
        let mut r = rng();
        for _ in 0..2000 {
            let p = galaxy_shell(&params, &mut r);
            // undo the flatten to recover the sampled radius
            let unflat = Vec3::new(p.x, p.y / params.flatten, p.z).length();
            assert!(unflat >= params.inner_radius - 1e-3);
            assert!(unflat <= params.outer_radius + 1e-3);
            assert!(p.y.abs() <= params.outer_radius * params.flatten + 1e-3);
        }
    }

    #[test]
    fn galaxy_shell_covers_both_hemispheres() {
        let params = ShellParams::default();
        let mut r = rng();
        let pts: Vec<Vec3> = (0..500).map(|_| galaxy_shell(&params, &mut r)).collect();
        assert!(pts.iter().any(|p| p.y > 0.0));
        assert!(pts.iter().any(|p| p.y < 0.0));
    }

    #[test]
    fn ornament_ring_is_deterministic() {
        let params = ConeParams::default();
        assert_eq!(ornament_ring(7, 40, &params), ornament_ring(7, 40, &params));
    }

    #[test]
    fn ornament_ring_golden_step() {
        let params = ConeParams::default();
        let a = ornament_ring(3, 40, &params);
        let b = ornament_ring(4, 40, &params);
        let da = a.z.atan2(a.x);
        let db = b.z.atan2(b.x);
        let step = (db - da).rem_euclid(TAU);
        assert!((step - GOLDEN_ANGLE).abs() < 1e-3);
    }

    #[test]
    fn spiral_ribbon_spans_cone() {
        let params = ConeParams::default();
        let first = spiral_ribbon(0,  200, &params, DEFAULT_RIBBON_TURNS);
        let last  = spiral_ribbon(199, 200, &params, DEFAULT_RIBBON_TURNS);
        assert!((first.y - params.base_y).abs() < 1e-4);
        assert!((last.y - (params.base_y + params.height)).abs() < 1e-4);
        // a whole number of turns ends at the starting azimuth
        assert!((first.z.atan2(first.x) - last.z.atan2(last.x)).abs() < 1e-3);
    }

    #[test]
    fn spiral_ribbon_single_object() {
        let p = spiral_ribbon(0, 1, &ConeParams::default(), 4.0);
        assert!(p.is_finite());
    }

    #[test]
    fn stagger_delay_half_open() {
        let mut r = rng();
        for _ in 0..1000 {
            let d = stagger_delay(&mut r);
            assert!((0.0..1.0).contains(&d));
        }
    }

    #[test]
    fn seed_population_counts_and_finiteness() {
        let mut r = rng();
        let cone = ConeParams::default();
        let shell = ShellParams::default();
        for shape in [TreeShape::Cone, TreeShape::Ring, TreeShape::Spiral { turns: 6.0 }] {
            let pop = seed_population(shape, 64, &cone, &shell, &mut r);
            assert_eq!(pop.len(), 64);
            assert!(pop.iter().all(|e| e.tree.is_finite() && e.galaxy.is_finite()));
        }
        assert!(seed_population(TreeShape::Cone, 0, &cone, &shell, &mut r).is_empty());
    }
}
