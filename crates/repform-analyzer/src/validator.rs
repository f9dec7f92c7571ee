//! Landmark validation - gate frames on landmark confidence
//!
//! A frame is usable only when every landmark the exercise requires is
//! present with confidence at or above the floor. Optional landmarks that
//! fail the floor are hidden from angle computation instead of voiding the
//! frame.

use repform_core::{Frame, Landmark, LandmarkId};
use repform_geometry::LandmarkSource;

/// Default minimum landmark confidence
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Confidence gate applied to every frame before angle computation
#[derive(Debug, Clone, Copy)]
pub struct LandmarkValidator {
    min_confidence: f32,
}

impl LandmarkValidator {
    pub fn new(min_confidence: f32) -> Self {
        Self {
            min_confidence: min_confidence.clamp(0.0, 1.0),
        }
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Check the required landmarks of `frame`
    pub fn validate<'a>(&self, frame: &'a Frame, required: &[LandmarkId]) -> Validation<'a> {
        let mut missing = Vec::new();
        let mut low_confidence = Vec::new();

        for &id in required {
            match frame.get(id) {
                None => missing.push(id),
                Some(lm) if lm.confidence < self.min_confidence => {
                    low_confidence.push((id, lm.confidence))
                }
                Some(_) => {}
            }
        }

        if missing.is_empty() && low_confidence.is_empty() {
            Validation::Usable(ValidatedLandmarks {
                frame,
                min_confidence: self.min_confidence,
            })
        } else {
            Validation::Unusable(UnusableFrame {
                missing,
                low_confidence,
            })
        }
    }
}

impl Default for LandmarkValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

/// Validation outcome for one frame
#[derive(Debug)]
pub enum Validation<'a> {
    Usable(ValidatedLandmarks<'a>),
    Unusable(UnusableFrame),
}

impl Validation<'_> {
    pub fn is_usable(&self) -> bool {
        matches!(self, Validation::Usable(_))
    }
}

/// Why a frame was rejected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnusableFrame {
    pub missing: Vec<LandmarkId>,
    pub low_confidence: Vec<(LandmarkId, f32)>,
}

/// View of a frame exposing only landmarks that pass the confidence floor
#[derive(Debug, Clone, Copy)]
pub struct ValidatedLandmarks<'a> {
    frame: &'a Frame,
    min_confidence: f32,
}

impl LandmarkSource for ValidatedLandmarks<'_> {
    fn landmark(&self, id: LandmarkId) -> Option<&Landmark> {
        self.frame
            .get(id)
            .filter(|lm| lm.confidence >= self.min_confidence)
    }
}
