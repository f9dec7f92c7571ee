//! Angle at a vertex from three landmarks

use repform_core::{GeometryError, Landmark, Position3D};
use serde::{Deserialize, Serialize};

/// Segments shorter than this (normalized units) have no usable direction
const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Which coordinates participate in the angle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleMode {
    /// Image-plane angle, x/y only. Depth from monocular estimators is noisy.
    #[default]
    Planar,
    /// Full 3D angle
    Spatial,
}

/// An angle in degrees with the confidence it inherits from its landmarks
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleReading {
    /// Degrees in [0, 180]
    pub degrees: f32,
    /// Minimum confidence of the three landmarks
    pub confidence: f32,
}

/// Angle at `vertex` between the segments to `first` and `last`, in degrees.
///
/// Fails when any two of the three points coincide.
pub fn angle_between(
    first: Position3D,
    vertex: Position3D,
    last: Position3D,
    mode: AngleMode,
) -> Result<f32, GeometryError> {
    if !(first.is_finite() && vertex.is_finite() && last.is_finite()) {
        return Err(GeometryError::NonFinite);
    }

    let a = segment(vertex, first, mode);
    let c = segment(vertex, last, mode);

    let len_a = norm(a);
    let len_c = norm(c);
    if len_a < MIN_SEGMENT_LENGTH || len_c < MIN_SEGMENT_LENGTH {
        return Err(GeometryError::CoincidentPoints);
    }
    if norm(segment(first, last, mode)) < MIN_SEGMENT_LENGTH {
        return Err(GeometryError::CoincidentPoints);
    }

    let dot = a[0] * c[0] + a[1] * c[1] + a[2] * c[2];
    // Clamp: rounding can push |cos| slightly past 1
    let cosine = (dot / (len_a * len_c)).clamp(-1.0, 1.0);

    Ok((cosine.acos().to_degrees() as f32).clamp(0.0, 180.0))
}

/// Angle at `vertex` plus the minimum confidence of the three landmarks
pub fn joint_angle(
    first: &Landmark,
    vertex: &Landmark,
    last: &Landmark,
    mode: AngleMode,
) -> Result<AngleReading, GeometryError> {
    let degrees = angle_between(first.position, vertex.position, last.position, mode)?;
    let confidence = first
        .confidence
        .min(vertex.confidence)
        .min(last.confidence);

    Ok(AngleReading {
        degrees,
        confidence,
    })
}

fn segment(from: Position3D, to: Position3D, mode: AngleMode) -> [f64; 3] {
    let d = to.delta(&from);
    let z = match mode {
        AngleMode::Planar => 0.0,
        AngleMode::Spatial => d.z as f64,
    };
    [d.x as f64, d.y as f64, z]
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
