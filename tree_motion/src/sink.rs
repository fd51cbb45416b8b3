//! The boundary to whatever draws the scene.

use std::collections::HashMap;

use glam::Vec3;

/// Which population a transform belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PopulationKind {
    Needles,
    Ornaments,
    Ribbon,
    PhotoCards,
}

impl PopulationKind {
    pub const ALL: [PopulationKind; 4] = [
        PopulationKind::Needles,
        PopulationKind::Ornaments,
        PopulationKind::Ribbon,
        PopulationKind::PhotoCards,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PopulationKind::Needles    => "needles",
            PopulationKind::Ornaments  => "ornaments",
            PopulationKind::Ribbon     => "ribbon",
            PopulationKind::PhotoCards => "photo cards",
        }
    }
}

/// Receives every object's transform and the viewpoint once per frame.
pub trait RenderSink {
    /// Called before any transform of a new frame.
    fn begin_frame(&mut self) {}

    fn set_transform(&mut self, kind: PopulationKind, index: usize, position: Vec3, scale: f32);

    fn set_viewpoint(&mut self, eye: Vec3, look_at: Vec3);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn set_transform(&mut self, _: PopulationKind, _: usize, _: Vec3, _: f32) {}
    fn set_viewpoint(&mut self, _: Vec3, _: Vec3) {}
}

/// Keeps the latest transform per object; used by tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub transforms: HashMap<(PopulationKind, usize), (Vec3, f32)>,
    pub viewpoint:  Option<(Vec3, Vec3)>,
    pub frames:     usize,
    /// Transform writes in the current frame.
    pub writes:     usize,
}

impl RecordingSink {
    pub fn transform(&self, kind: PopulationKind, index: usize) -> Option<(Vec3, f32)> {
        self.transforms.get(&(kind, index)).copied()
    }
}

impl RenderSink for RecordingSink {
    fn begin_frame(&mut self) {
        self.frames += 1;
        self.writes = 0;
    }

    fn set_transform(&mut self, kind: PopulationKind, index: usize, position: Vec3, scale: f32) {
        self.transforms.insert((kind, index), (position, scale));
        self.writes += 1;
    }

    fn set_viewpoint(&mut self, eye: Vec3, look_at: Vec3) {
        self.viewpoint = Some((eye, look_at));
    }
}
