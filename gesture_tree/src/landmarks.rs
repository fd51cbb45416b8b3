//! The 21-point hand skeleton delivered by the landmark tracker.
//!
//! ```text
//!            8   12  16  20        tips
//!            7   11  15  19
//!        4   6   10  14  18
//!        3   5   9   13  17        MCP knuckles
//!        2
//!         1
//!             0                    wrist
//! ```

use glam::Vec3;

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_TIP:  usize = 20;

/// `(tip, mcp)` for index, middle, ring, pinky — in that order.
pub const FINGERS: [(usize, usize); 4] = [
    (INDEX_TIP,  INDEX_MCP),
    (MIDDLE_TIP, MIDDLE_MCP),
    (RING_TIP,   RING_MCP),
    (PINKY_TIP,  PINKY_MCP),
];

/// Exactly 21 finite points in normalised image space (x right, y down).
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: [Vec3; LANDMARK_COUNT],
}

impl LandmarkSet {
    /// `None` when fewer than 21 points are given or any is non-finite.
    /// Extra points past the 21st are ignored.
    pub fn from_slice(points: &[Vec3]) -> Option<Self> {
        let head = points.get(..LANDMARK_COUNT)?;
        if !head.iter().all(|p| p.is_finite()) {
            return None;
        }
        let mut out = [Vec3::ZERO; LANDMARK_COUNT];
        out.copy_from_slice(head);
        Some(LandmarkSet { points: out })
    }

    /// Wrap a full array of points known to be finite.
    pub(crate) fn from_array(points: [Vec3; LANDMARK_COUNT]) -> Self {
        debug_assert!(points.iter().all(|p| p.is_finite()));
        LandmarkSet { points }
    }

    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    pub fn points(&self) -> &[Vec3; LANDMARK_COUNT] {
        &self.points
    }
}
