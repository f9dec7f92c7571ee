//! Session configuration
//!
//! One value per session, threaded through construction. Loaded from TOML:
//!
//! ```toml
//! min_confidence = 0.6
//! unusable_reset = 20
//! fps = 30.0
//!
//! [exercises.pushup]
//! down_threshold = 85.0
//! rule_limits = { hip_sag = 155.0 }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use repform_analyzer::{ProfileOverride, DEFAULT_MIN_CONFIDENCE, DEFAULT_UNUSABLE_RESET};
use repform_core::{invalid_config, RepformError, RepformResult};
use repform_feedback::DEFAULT_TOP_K;
use repform_geometry::AngleMode;
use serde::{Deserialize, Serialize};

/// Name used in configuration errors not tied to one exercise
const SESSION_SCOPE: &str = "session";

/// Per-session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Landmark confidence floor [0.0 - 1.0]
    pub min_confidence: f32,
    /// Consecutive unusable frames that abandon a repetition in progress
    pub unusable_reset: u32,
    /// Feedback entries in the report
    pub top_k: usize,
    pub angle_mode: AngleMode,
    /// Video frame rate, when known; enables `duration_secs` in the report
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    /// Overrides keyed by exercise name or alias
    pub exercises: BTreeMap<String, ProfileOverride>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            unusable_reset: DEFAULT_UNUSABLE_RESET,
            top_k: DEFAULT_TOP_K,
            angle_mode: AngleMode::Planar,
            fps: None,
            exercises: BTreeMap::new(),
        }
    }
}

impl SessionConfig {
    /// Configuration for noisy estimators: lower floor, longer occlusion tolerance
    pub fn lenient() -> Self {
        Self {
            min_confidence: 0.3,
            unusable_reset: 30,
            ..Default::default()
        }
    }

    /// Configuration for clean studio footage
    pub fn strict() -> Self {
        Self {
            min_confidence: 0.7,
            unusable_reset: 8,
            ..Default::default()
        }
    }

    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_override(mut self, exercise: &str, overrides: ProfileOverride) -> Self {
        self.exercises.insert(exercise.to_string(), overrides);
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> RepformResult<Self> {
        let config: SessionConfig =
            toml::from_str(source).map_err(|e| RepformError::ConfigLoad(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> RepformResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| RepformError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> RepformResult<String> {
        toml::to_string_pretty(self).map_err(|e| RepformError::ConfigSave(e.to_string()))
    }

    /// Range checks that do not depend on the exercise
    pub fn validate(&self) -> RepformResult<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(invalid_config(
                SESSION_SCOPE,
                format!("min_confidence {} outside [0, 1]", self.min_confidence),
            ));
        }
        if self.unusable_reset == 0 {
            return Err(invalid_config(SESSION_SCOPE, "unusable_reset must be at least 1"));
        }
        if self.top_k == 0 {
            return Err(invalid_config(SESSION_SCOPE, "top_k must be at least 1"));
        }
        if let Some(fps) = self.fps {
            if !fps.is_finite() || fps <= 0.0 {
                return Err(invalid_config(SESSION_SCOPE, format!("fps {} must be positive", fps)));
            }
        }
        Ok(())
    }
}
