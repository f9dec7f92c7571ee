//! Pose simulator - synthetic landmark streams with known joint angles
//!
//! Each frame is built by placing landmarks so that the named angles take
//! exactly the requested values, then perturbing those values with bounded
//! noise. Occlusion lowers every confidence below the default floor.

use repform_core::{Frame, FrameIndex, Landmark, LandmarkId, Position3D};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Simulator configuration
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Uniform angle noise amplitude (degrees); applied as ±noise
    pub angle_noise: f32,
    /// Probability that a frame is occluded (0.0 - 1.0)
    pub occlusion_prob: f64,
    /// Confidence of visible landmarks
    pub confidence: f32,
    /// Confidence of occluded landmarks
    pub occluded_confidence: f32,
    /// Random seed
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            angle_noise: 0.0,
            occlusion_prob: 0.0,
            confidence: 0.95,
            occluded_confidence: 0.2,
            seed: 42,
        }
    }
}

impl SimulatorConfig {
    /// Noise-free, fully visible
    pub fn clean() -> Self {
        Self::default()
    }

    /// Jittery estimator with the occasional lost frame
    pub fn noisy() -> Self {
        SimulatorConfig {
            angle_noise: 3.0,
            occlusion_prob: 0.05,
            ..Default::default()
        }
    }

    /// Heavy occlusion, for reset and detection-failure scenarios
    pub fn occluded() -> Self {
        SimulatorConfig {
            occlusion_prob: 1.0,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Secondary push-up posture
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PushupForm {
    /// Elbow-shoulder-hip angle (degrees)
    pub shoulder: f32,
    /// Shoulder-hip-knee angle (degrees)
    pub alignment: f32,
}

impl PushupForm {
    pub const CLEAN: PushupForm = PushupForm {
        shoulder: 30.0,
        alignment: 175.0,
    };
    /// Hips dropped below the shoulder-knee line
    pub const SAGGING: PushupForm = PushupForm {
        shoulder: 30.0,
        alignment: 140.0,
    };
    /// Elbows pointing away from the torso
    pub const FLARED: PushupForm = PushupForm {
        shoulder: 70.0,
        alignment: 175.0,
    };
}

/// Secondary squat posture
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquatForm {
    /// Shoulder-hip-knee angle (degrees)
    pub hip: f32,
    pub heel_lifted: bool,
}

impl SquatForm {
    pub const CLEAN: SquatForm = SquatForm {
        hip: 100.0,
        heel_lifted: false,
    };
    /// Torso folded toward the thighs
    pub const CHEST_DROP: SquatForm = SquatForm {
        hip: 30.0,
        heel_lifted: false,
    };
    pub const HEEL_LIFT: SquatForm = SquatForm {
        hip: 100.0,
        heel_lifted: true,
    };
}

/// Seeded synthetic pose stream
pub struct PoseSimulator {
    config: SimulatorConfig,
    rng: StdRng,
    next_index: u64,
}

impl PoseSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        PoseSimulator {
            config,
            rng,
            next_index: 0,
        }
    }

    pub fn clean() -> Self {
        Self::new(SimulatorConfig::clean())
    }

    /// Index the next frame will carry
    pub fn next_index(&self) -> FrameIndex {
        FrameIndex::new(self.next_index)
    }

    /// Leave a gap in frame numbering
    pub fn skip_frames(&mut self, count: u64) {
        self.next_index += count;
    }

    /// Push-up frame with the given elbow angle
    pub fn pushup(&mut self, elbow: f32, form: PushupForm) -> Frame {
        let elbow = self.jitter(elbow);
        let shoulder_angle = self.jitter(form.shoulder);
        let alignment = self.jitter(form.alignment);

        // Side view, body horizontal, head to the left
        let shoulder = Position3D::planar(0.3, 0.5);
        let hip = Position3D::planar(0.6, 0.5);
        let elbow_pos = offset(shoulder, rotate((1.0, 0.0), shoulder_angle), 0.15);
        let wrist = offset(
            elbow_pos,
            rotate(direction(elbow_pos, shoulder), elbow),
            0.15,
        );
        let knee = offset(hip, rotate((-1.0, 0.0), alignment), 0.2);

        self.emit(&[
            (LandmarkId::RightShoulder, shoulder),
            (LandmarkId::RightElbow, elbow_pos),
            (LandmarkId::RightWrist, wrist),
            (LandmarkId::RightHip, hip),
            (LandmarkId::RightKnee, knee),
        ])
    }

    /// Squat frame with the given knee angle
    pub fn squat(&mut self, knee_angle: f32, form: SquatForm) -> Frame {
        let knee_angle = self.jitter(knee_angle);
        let hip_angle = self.jitter(form.hip);

        let hip = Position3D::planar(0.5, 0.45);
        let knee = Position3D::planar(0.5, 0.65);
        let ankle = offset(knee, rotate((0.0, -1.0), knee_angle), 0.2);
        let shoulder = offset(hip, rotate((0.0, 1.0), hip_angle), 0.25);

        // Flat foot: toe slightly below the heel. Lifted: heel well above.
        let heel_rise = if form.heel_lifted { 0.06 } else { 0.0 };
        let heel = Position3D::planar(ankle.x - 0.03, ankle.y + 0.02 - heel_rise);
        let toe = Position3D::planar(ankle.x + 0.06, ankle.y + 0.03);

        self.emit(&[
            (LandmarkId::RightShoulder, shoulder),
            (LandmarkId::RightHip, hip),
            (LandmarkId::RightKnee, knee),
            (LandmarkId::RightAnkle, ankle),
            (LandmarkId::RightHeel, heel),
            (LandmarkId::RightFootIndex, toe),
        ])
    }

    pub fn pushup_sequence(&mut self, elbows: &[f32], form: PushupForm) -> Vec<Frame> {
        elbows.iter().map(|&a| self.pushup(a, form)).collect()
    }

    pub fn squat_sequence(&mut self, knees: &[f32], form: SquatForm) -> Vec<Frame> {
        knees.iter().map(|&a| self.squat(a, form)).collect()
    }

    /// Frames with no body detected
    pub fn dropout(&mut self, count: usize) -> Vec<Frame> {
        (0..count).map(|_| Frame::new(self.advance())).collect()
    }

    fn jitter(&mut self, degrees: f32) -> f32 {
        let noise = self.config.angle_noise;
        let value = if noise > 0.0 {
            degrees + self.rng.gen_range(-noise..=noise)
        } else {
            degrees
        };
        value.clamp(0.0, 180.0)
    }

    fn advance(&mut self) -> FrameIndex {
        let index = FrameIndex::new(self.next_index);
        self.next_index += 1;
        index
    }

    fn emit(&mut self, points: &[(LandmarkId, Position3D)]) -> Frame {
        let occluded = self.config.occlusion_prob > 0.0 && self.rng.gen_bool(self.config.occlusion_prob.min(1.0));
        let confidence = if occluded {
            self.config.occluded_confidence
        } else {
            self.config.confidence
        };

        let mut frame = Frame::new(self.advance());
        for &(id, position) in points {
            frame.insert(Landmark::new(id, position, confidence));
        }
        frame
    }
}

/// Primary angle trajectory: `cycles` full top → bottom → top sweeps.
///
/// Starts with one frame at `top`; each half cycle takes `frames_per_half`
/// frames and each extreme is held for `hold` extra frames.
pub fn oscillation(top: f32, bottom: f32, cycles: usize, frames_per_half: usize, hold: usize) -> Vec<f32> {
    let steps = frames_per_half.max(1);
    let mut angles = vec![top];
    for _ in 0..cycles {
        for s in 1..=steps {
            angles.push(top + (bottom - top) * s as f32 / steps as f32);
        }
        angles.extend(std::iter::repeat(bottom).take(hold));
        for s in 1..=steps {
            angles.push(bottom + (top - bottom) * s as f32 / steps as f32);
        }
        angles.extend(std::iter::repeat(top).take(hold));
    }
    angles
}

/// `count` frames around `center`, deterministic from `seed`, within ±`amplitude`
pub fn jitter_around(center: f32, amplitude: f32, count: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| center + rng.gen_range(-amplitude..=amplitude))
        .collect()
}

fn offset(from: Position3D, dir: (f32, f32), length: f32) -> Position3D {
    Position3D::planar(from.x + dir.0 * length, from.y + dir.1 * length)
}

/// Unit vector from `from` toward `to`
fn direction(from: Position3D, to: Position3D) -> (f32, f32) {
    let d = to.delta(&from);
    let len = (d.x * d.x + d.y * d.y).sqrt();
    (d.x / len, d.y / len)
}

/// Rotate a unit vector by `degrees`
fn rotate(v: (f32, f32), degrees: f32) -> (f32, f32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    (v.0 * cos - v.1 * sin, v.0 * sin + v.1 * cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repform_geometry::{joint_angle, AngleMode};

    fn angle(frame: &Frame, a: LandmarkId, b: LandmarkId, c: LandmarkId) -> f32 {
        joint_angle(
            frame.get(a).unwrap(),
            frame.get(b).unwrap(),
            frame.get(c).unwrap(),
            AngleMode::Planar,
        )
        .unwrap()
        .degrees
    }

    #[test]
    fn test_pushup_angles_realised() {
        let mut sim = PoseSimulator::clean();
        let frame = sim.pushup(85.0, PushupForm::SAGGING);

        use LandmarkId::*;
        assert!((angle(&frame, RightShoulder, RightElbow, RightWrist) - 85.0).abs() < 0.01);
        assert!((angle(&frame, RightElbow, RightShoulder, RightHip) - 30.0).abs() < 0.01);
        assert!((angle(&frame, RightShoulder, RightHip, RightKnee) - 140.0).abs() < 0.01);
    }

    #[test]
    fn test_squat_angles_realised() {
        let mut sim = PoseSimulator::clean();
        let frame = sim.squat(100.0, SquatForm::CHEST_DROP);

        use LandmarkId::*;
        assert!((angle(&frame, RightHip, RightKnee, RightAnkle) - 100.0).abs() < 0.01);
        assert!((angle(&frame, RightShoulder, RightHip, RightKnee) - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_noise_bounded() {
        let mut sim = PoseSimulator::new(SimulatorConfig {
            angle_noise: 2.0,
            ..Default::default()
        });

        for _ in 0..200 {
            let frame = sim.pushup(120.0, PushupForm::CLEAN);
            let a = angle(
                &frame,
                LandmarkId::RightShoulder,
                LandmarkId::RightElbow,
                LandmarkId::RightWrist,
            );
            assert!((a - 120.0).abs() <= 2.01, "angle {}", a);
        }
    }

    #[test]
    fn test_indices_increase() {
        let mut sim = PoseSimulator::clean();
        let a = sim.pushup(170.0, PushupForm::CLEAN);
        sim.skip_frames(3);
        let gap = sim.dropout(2);
        let b = sim.squat(170.0, SquatForm::CLEAN);

        assert_eq!(a.index, FrameIndex::new(0));
        assert_eq!(gap[0].index, FrameIndex::new(4));
        assert!(gap[1].is_empty());
        assert_eq!(b.index, FrameIndex::new(6));
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let run = || {
            let mut sim = PoseSimulator::new(SimulatorConfig::noisy().with_seed(7));
            sim.pushup_sequence(&oscillation(170.0, 80.0, 2, 5, 1), PushupForm::CLEAN)
                .iter()
                .map(|f| f.get(LandmarkId::RightWrist).unwrap().position)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_oscillation_shape() {
        let angles = oscillation(170.0, 80.0, 2, 3, 1);
        // 1 + 2 * (3 + 1 + 3 + 1)
        assert_eq!(angles.len(), 17);
        assert_eq!(angles[0], 170.0);
        assert_eq!(angles[3], 80.0);
        assert_eq!(angles[4], 80.0);
        assert_eq!(*angles.last().unwrap(), 170.0);
    }
}
