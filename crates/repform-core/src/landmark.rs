//! Landmarks and frames as produced by the pose estimator
//!
//! A frame is the unit the session consumes: one video frame's worth of
//! landmark positions and confidences. Frames are ephemeral; nothing in the
//! pipeline keeps a frame after it has been processed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{FrameIndex, LandmarkId};

/// 3D position (normalized image coordinates, z = 0 for 2D input)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Position3D {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn planar(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Component-wise difference `self - other`
    pub fn delta(&self, other: &Position3D) -> Position3D {
        Position3D {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    /// Distance to another position
    pub fn distance(&self, other: &Position3D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A tracked body point with its detection confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: LandmarkId,
    pub position: Position3D,
    /// Confidence in [0.0 - 1.0]
    pub confidence: f32,
}

impl Landmark {
    /// Create a landmark; confidence is clamped into [0, 1] and NaN becomes 0
    pub fn new(id: LandmarkId, position: Position3D, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            id,
            position,
            confidence,
        }
    }
}

/// One video frame's landmarks
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame index within the video
    pub index: FrameIndex,

    landmarks: HashMap<LandmarkId, Landmark>,
}

impl Frame {
    /// Create an empty frame (no body detected)
    pub fn new(index: FrameIndex) -> Self {
        Self {
            index,
            landmarks: HashMap::new(),
        }
    }

    /// Add a landmark (builder style)
    pub fn with_landmark(mut self, landmark: Landmark) -> Self {
        self.insert(landmark);
        self
    }

    /// Insert or replace a landmark
    pub fn insert(&mut self, landmark: Landmark) {
        self.landmarks.insert(landmark.id, landmark);
    }

    /// Build a frame from estimator output indexed by landmark index:
    /// `[x, y, z, confidence]` per row. Rows past the known topology are ignored.
    pub fn from_rows(index: FrameIndex, rows: &[[f32; 4]]) -> Self {
        let mut frame = Frame::new(index);
        for (i, row) in rows.iter().enumerate() {
            if let Some(id) = LandmarkId::from_index(i) {
                frame.insert(Landmark::new(
                    id,
                    Position3D::new(row[0], row[1], row[2]),
                    row[3],
                ));
            }
        }
        frame
    }

    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.landmarks.get(&id)
    }

    pub fn landmarks(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.values()
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    /// No body detected in this frame
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamped() {
        let lm = Landmark::new(LandmarkId::Nose, Position3D::zero(), 1.7);
        assert_eq!(lm.confidence, 1.0);

        let lm = Landmark::new(LandmarkId::Nose, Position3D::zero(), f32::NAN);
        assert_eq!(lm.confidence, 0.0);
    }

    #[test]
    fn test_frame_from_rows() {
        let rows = vec![[0.5, 0.5, 0.0, 0.9]; 35];
        let frame = Frame::from_rows(FrameIndex::new(3), &rows);

        assert_eq!(frame.len(), LandmarkId::count());
        assert_eq!(frame.index, FrameIndex::new(3));
        assert!(frame.get(LandmarkId::RightFootIndex).is_some());
    }

    #[test]
    fn test_position_distance() {
        let a = Position3D::planar(0.0, 0.0);
        let b = Position3D::planar(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }
}
