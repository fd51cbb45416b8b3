//! Application configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "needles": 800, "photo_spring": { "stiffness": 90.0, "damping": 19.0 } }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tree_layout::{ConeParams, ShellParams, DEFAULT_RIBBON_TURNS};
use tree_motion::spring::{MAX_SPRING_DT, MAX_SUBSTEPS};
use tree_motion::tween::DEFAULT_TRANSITION_SECS;
use tree_motion::{CameraParams, SceneState, SpringParams};

use crate::gesture::ClassifierConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier:      ClassifierConfig,

    // ── population sizes ─────────────────────────────────────────────────
    pub needles:         usize,
    pub ornaments:       usize,
    pub ribbon:          usize,
    pub photo_cards:     usize,

    // ── layout ───────────────────────────────────────────────────────────
    pub cone:            ConeParams,
    pub shell:           ShellParams,
    pub ribbon_turns:    f32,

    // ── motion ───────────────────────────────────────────────────────────
    /// Tree ↔ galaxy tween length, seconds.
    pub transition_secs: f32,
    pub photo_spring:    SpringParams,
    pub camera:          CameraParams,
    /// How far in front of the eye a focused photo card floats.
    pub focus_distance:  f32,
    pub initial_state:   SceneState,

    /// Layout seed; `None` scatters differently on every launch.
    pub seed:            Option<u64>,
    /// Two clicks closer than this toggle the formation.
    pub double_click_ms: u64,
    /// Ask for the camera as soon as the window opens.
    pub start_camera:    bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            classifier:      ClassifierConfig::default(),
            needles:         1500,
            ornaments:       60,
            ribbon:          400,
            photo_cards:     12,
            cone:            ConeParams::default(),
            shell:           ShellParams::default(),
            ribbon_turns:    DEFAULT_RIBBON_TURNS,
            transition_secs: DEFAULT_TRANSITION_SECS,
            photo_spring:    SpringParams::default(),
            camera:          CameraParams::default(),
            focus_distance:  8.0,
            initial_state:   SceneState::Tree,
            seed:            None,
            double_click_ms: 350,
            start_camera:    true,
        }
    }
}

impl AppConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let cfg = Self::from_json(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("needles", self.needles),
            ("ornaments", self.ornaments),
            ("ribbon", self.ribbon),
            ("photo_cards", self.photo_cards),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, n)| *n == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
        }

        positive("transition_secs", self.transition_secs)?;
        positive("camera.rate", self.camera.rate)?;
        positive("cone.height", self.cone.height)?;
        positive("cone.base_radius", self.cone.base_radius)?;
        positive("focus_distance", self.focus_distance)?;
        positive("classifier.pinch_threshold", self.classifier.pinch_threshold)?;

        if !(self.shell.inner_radius >= 0.0 && self.shell.inner_radius <= self.shell.outer_radius) {
            return Err(ConfigError::Invalid(
                "shell radii must satisfy 0 <= inner_radius <= outer_radius".into(),
            ));
        }
        if !self.photo_spring.is_bounce_free() || !(self.photo_spring.stiffness > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "photo_spring is under-damped (ratio {:.2}); need damping >= 2*sqrt(stiffness)",
                self.photo_spring.damping_ratio(),
            )));
        }
        if !self.photo_spring.is_stable_at(MAX_SPRING_DT) {
            return Err(ConfigError::Invalid(format!(
                "photo_spring is too stiff: a {MAX_SPRING_DT}s frame needs more than {MAX_SUBSTEPS} steps",
            )));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
