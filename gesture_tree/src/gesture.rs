//! Landmark classifier: one [`LandmarkSet`] in, one [`GestureLabel`] out.
//!
//! # Algorithm
//!
//! First match wins:
//!
//! 1. **Pinch** — thumb tip (4) to index tip (8) closer than
//!    `pinch_threshold` in 3-D. Not scale-invariant: tuned for a hand at a
//!    comfortable distance in a 640×480 frame.
//! 2. A non-thumb finger counts as *extended* when its tip is above its MCP
//!    knuckle on screen (`tip.y < mcp.y`). Assumes a roughly upright palm;
//!    wrist rotation is not compensated.
//! 3. `≥ open_min_extended` extended → **Open**; only the index extended →
//!    **Pointing**; `≤ fist_max_extended` → **Fist**; anything else (two
//!    fingers) → **None**.
//!
//! The classifier is stateless. Debouncing happens in the session, which
//! only reports label *changes*.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::landmarks::{
    LandmarkSet, FINGERS, INDEX_MCP, INDEX_TIP, MIDDLE_MCP, PINKY_MCP, RING_MCP, THUMB_TIP, WRIST,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureLabel {
    #[default]
    None,
    Fist,
    Open,
    Pinch,
    Pointing,
}

impl GestureLabel {
    pub fn name(self) -> &'static str {
        match self {
            GestureLabel::None     => "none",
            GestureLabel::Fist     => "fist",
            GestureLabel::Open     => "open",
            GestureLabel::Pinch    => "pinch",
            GestureLabel::Pointing => "pointing",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Thumb-tip to index-tip distance below which the hand is pinching.
    pub pinch_threshold:   f32,
    pub open_min_extended: usize,
    pub fist_max_extended: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            pinch_threshold:   0.06,
            open_min_extended: 3,
            fist_max_extended: 1,
        }
    }
}

impl ClassifierConfig {
    pub fn classify(&self, set: Option<&LandmarkSet>) -> GestureLabel {
        let Some(set) = set else {
            return GestureLabel::None;
        };

        if pinch_distance(set) < self.pinch_threshold {
            return GestureLabel::Pinch;
        }

        let extended = extended_fingers(set);
        let count = extended.iter().filter(|&&e| e).count();

        if count >= self.open_min_extended {
            GestureLabel::Open
        } else if extended == [true, false, false, false] {
            GestureLabel::Pointing
        } else if count <= self.fist_max_extended {
            GestureLabel::Fist
        } else {
            GestureLabel::None
        }
    }
}

/// Classify with the default thresholds.
pub fn classify(set: Option<&LandmarkSet>) -> GestureLabel {
    ClassifierConfig::default().classify(set)
}

/// Classify raw points; fewer than 21 (or non-finite) is `None`.
pub fn classify_points(points: &[Vec3]) -> GestureLabel {
    classify(LandmarkSet::from_slice(points).as_ref())
}

/// 3-D distance between thumb tip and index tip.
pub fn pinch_distance(set: &LandmarkSet) -> f32 {
    set.point(THUMB_TIP).distance(set.point(INDEX_TIP))
}

/// Index, middle, ring, pinky: tip above knuckle on screen.
pub fn extended_fingers(set: &LandmarkSet) -> [bool; 4] {
    FINGERS.map(|(tip, mcp)| set.point(tip).y < set.point(mcp).y)
}

/// Mean of the wrist and the four MCP knuckles.
pub fn palm_center(set: &LandmarkSet) -> Vec3 {
    let sum = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP]
        .iter()
        .map(|&i| set.point(i))
        .sum::<Vec3>();
    sum / 5.0
}
