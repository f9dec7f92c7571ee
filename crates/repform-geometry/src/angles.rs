//! Named angle definitions and per-frame angle sets

use std::collections::BTreeMap;

use repform_core::{Frame, GeometryError, Landmark, LandmarkId};
use serde::Serialize;

use crate::{joint_angle, AngleMode, AngleReading};

/// Anything that can look up a landmark by id
pub trait LandmarkSource {
    fn landmark(&self, id: LandmarkId) -> Option<&Landmark>;
}

impl LandmarkSource for Frame {
    fn landmark(&self, id: LandmarkId) -> Option<&Landmark> {
        self.get(id)
    }
}

/// A named angle: the vertex landmark and its two neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleSpec {
    pub name: &'static str,
    pub first: LandmarkId,
    pub vertex: LandmarkId,
    pub last: LandmarkId,
}

impl AngleSpec {
    pub const fn new(
        name: &'static str,
        first: LandmarkId,
        vertex: LandmarkId,
        last: LandmarkId,
    ) -> Self {
        Self {
            name,
            first,
            vertex,
            last,
        }
    }

    /// Landmarks this angle is computed from
    pub fn landmarks(&self) -> [LandmarkId; 3] {
        [self.first, self.vertex, self.last]
    }

    /// Evaluate against a landmark source; `None` when a landmark is missing
    pub fn measure<S: LandmarkSource + ?Sized>(
        &self,
        source: &S,
        mode: AngleMode,
    ) -> Option<Result<AngleReading, GeometryError>> {
        let first = source.landmark(self.first)?;
        let vertex = source.landmark(self.vertex)?;
        let last = source.landmark(self.last)?;
        Some(joint_angle(first, vertex, last, mode))
    }
}

/// Angles computed for one frame, keyed by angle name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AngleSet {
    angles: BTreeMap<&'static str, AngleReading>,
}

impl AngleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, reading: AngleReading) {
        self.angles.insert(name, reading);
    }

    pub fn get(&self, name: &str) -> Option<&AngleReading> {
        self.angles.get(name)
    }

    /// Angle value in degrees
    pub fn degrees(&self, name: &str) -> Option<f32> {
        self.get(name).map(|r| r.degrees)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AngleReading)> {
        self.angles.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }
}

/// Angles that could not be computed this frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleFailures {
    /// A landmark of the triplet was absent from the source
    pub missing: Vec<&'static str>,
    /// The triplet was degenerate
    pub degenerate: Vec<(&'static str, GeometryError)>,
}

impl AngleFailures {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.degenerate.is_empty()
    }
}

/// Compute every angle in `specs`.
///
/// Angles whose landmarks are missing or degenerate are left out of the set
/// and reported in [`AngleFailures`]; they never abort the frame.
pub fn compute_angles<S: LandmarkSource + ?Sized>(
    source: &S,
    specs: &[AngleSpec],
    mode: AngleMode,
) -> (AngleSet, AngleFailures) {
    let mut set = AngleSet::new();
    let mut failures = AngleFailures::default();

    for spec in specs {
        match spec.measure(source, mode) {
            Some(Ok(reading)) => set.insert(spec.name, reading),
            Some(Err(err)) => failures.degenerate.push((spec.name, err)),
            None => failures.missing.push(spec.name),
        }
    }

    (set, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repform_core::{FrameIndex, Position3D};

    const ELBOW: AngleSpec = AngleSpec::new(
        "elbow",
        LandmarkId::RightShoulder,
        LandmarkId::RightElbow,
        LandmarkId::RightWrist,
    );
    const KNEE: AngleSpec = AngleSpec::new(
        "knee",
        LandmarkId::RightHip,
        LandmarkId::RightKnee,
        LandmarkId::RightAnkle,
    );

    fn lm(id: LandmarkId, x: f32, y: f32) -> Landmark {
        Landmark::new(id, Position3D::planar(x, y), 0.9)
    }

    #[test]
    fn test_compute_angles() {
        let frame = Frame::new(FrameIndex::new(0))
            .with_landmark(lm(LandmarkId::RightShoulder, 0.5, 0.2))
            .with_landmark(lm(LandmarkId::RightElbow, 0.5, 0.5))
            .with_landmark(lm(LandmarkId::RightWrist, 0.5, 0.8));

        let (set, failures) = compute_angles(&frame, &[ELBOW, KNEE], AngleMode::Planar);

        assert!((set.degrees("elbow").unwrap() - 180.0).abs() < 1e-3);
        assert!(set.get("knee").is_none());
        assert_eq!(failures.missing, vec!["knee"]);
        assert!(failures.degenerate.is_empty());
    }

    #[test]
    fn test_degenerate_angle_is_dropped() {
        let frame = Frame::new(FrameIndex::new(0))
            .with_landmark(lm(LandmarkId::RightShoulder, 0.5, 0.5))
            .with_landmark(lm(LandmarkId::RightElbow, 0.5, 0.5))
            .with_landmark(lm(LandmarkId::RightWrist, 0.5, 0.8));

        let (set, failures) = compute_angles(&frame, &[ELBOW], AngleMode::Planar);

        assert!(set.is_empty());
        assert_eq!(
            failures.degenerate,
            vec![("elbow", GeometryError::CoincidentPoints)]
        );
    }
}
