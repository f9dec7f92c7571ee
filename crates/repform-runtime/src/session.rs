//! Analysis session - one video or live feed, one exercise
//!
//! The session owns the analyzer for its stream, enforces frame ordering and
//! assembles the final report. Nothing is shared between sessions.

use repform_analyzer::{ExerciseAnalyzer, ExerciseRegistry, FrameAnalysis};
use repform_core::{ExerciseState, Frame, FrameIndex, RepEvent, RepformError, RepformResult};
use repform_feedback::FeedbackAggregator;
use serde::Serialize;

use crate::{SessionConfig, SessionReport};

/// Frames between progress log lines
const PROGRESS_INTERVAL: u64 = 30;

/// Per-frame result returned to the caller
pub type FrameOutcome = FrameAnalysis;

/// Point-in-time view of a running session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    pub exercise_type: &'static str,
    pub state: ExerciseState,
    pub rep_count: u32,
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub last_frame: Option<FrameIndex>,
    pub last_rep: Option<RepEvent>,
}

#[derive(Debug)]
pub struct AnalysisSession {
    exercise: &'static str,
    analyzer: ExerciseAnalyzer,
    aggregator: FeedbackAggregator,
    fps: Option<f32>,
    expected_frames: Option<u64>,
    last_frame: Option<FrameIndex>,
    timeline: Vec<RepEvent>,
}

impl AnalysisSession {
    /// Start a session with the built-in exercises and default configuration
    pub fn start(exercise_type: &str) -> RepformResult<Self> {
        Self::start_with(&ExerciseRegistry::default(), &SessionConfig::default(), exercise_type)
    }

    /// Resolve `exercise_type` in `registry` and configure it from `config`
    pub fn start_with(
        registry: &ExerciseRegistry,
        config: &SessionConfig,
        exercise_type: &str,
    ) -> RepformResult<Self> {
        config.validate()?;
        let mut profile = registry.resolve(exercise_type)?;

        for (name, overrides) in &config.exercises {
            match registry.canonical_name(name) {
                Some(canonical) if canonical == profile.name => {
                    profile.apply_override(overrides)?;
                }
                Some(_) => {}
                None => {
                    tracing::warn!(exercise = %name, "ignoring overrides for unknown exercise");
                }
            }
        }

        let analyzer = ExerciseAnalyzer::builder()
            .profile(profile)
            .min_confidence(config.min_confidence)
            .angle_mode(config.angle_mode)
            .unusable_reset(config.unusable_reset)
            .build()?;

        let exercise = analyzer.profile().name;
        tracing::info!(
            exercise,
            requested = exercise_type,
            min_confidence = config.min_confidence,
            unusable_reset = config.unusable_reset,
            "session started"
        );

        Ok(Self {
            exercise,
            analyzer,
            aggregator: FeedbackAggregator::new(config.top_k),
            fps: config.fps,
            expected_frames: None,
            last_frame: None,
            timeline: Vec::new(),
        })
    }

    /// Total frame count, when known, for progress reporting
    pub fn with_expected_frames(mut self, frames: u64) -> Self {
        self.expected_frames = Some(frames);
        self
    }

    /// Feed the next frame. Indices must be strictly increasing.
    pub fn process(&mut self, frame: &Frame) -> RepformResult<FrameOutcome> {
        if let Some(last) = self.last_frame {
            if frame.index <= last {
                return Err(RepformError::FrameOutOfOrder {
                    last,
                    got: frame.index,
                });
            }
        }
        self.last_frame = Some(frame.index);

        let outcome = self.analyzer.step(frame);
        if let Some(rep) = outcome.rep {
            self.timeline.push(rep);
        }

        let processed = self.analyzer.stats().frames_processed;
        if processed % PROGRESS_INTERVAL == 0 {
            match self.expected_frames {
                Some(total) if total > 0 => {
                    let percent = (processed as f64 * 1000.0 / total as f64).round() / 10.0;
                    tracing::debug!(
                        exercise = self.exercise,
                        processed,
                        percent,
                        reps = self.analyzer.rep_count(),
                        "progress"
                    )
                }
                _ => tracing::debug!(
                    exercise = self.exercise,
                    processed,
                    reps = self.analyzer.rep_count(),
                    "progress"
                ),
            }
        }

        Ok(outcome)
    }

    /// Feed every frame of `frames` in order
    pub fn process_all<'a, I>(&mut self, frames: I) -> RepformResult<()>
    where
        I: IntoIterator<Item = &'a Frame>,
    {
        for frame in frames {
            self.process(frame)?;
        }
        Ok(())
    }

    pub fn exercise_type(&self) -> &'static str {
        self.exercise
    }

    pub fn state(&self) -> ExerciseState {
        self.analyzer.state()
    }

    pub fn rep_count(&self) -> u32 {
        self.analyzer.rep_count()
    }

    /// Repetitions counted so far
    pub fn timeline(&self) -> &[RepEvent] {
        &self.timeline
    }

    pub fn progress(&self) -> SessionProgress {
        let stats = self.analyzer.stats();
        SessionProgress {
            exercise_type: self.exercise,
            state: self.analyzer.state(),
            rep_count: self.analyzer.rep_count(),
            frames_processed: stats.frames_processed,
            frames_skipped: stats.frames_skipped,
            last_frame: self.last_frame,
            last_rep: self.timeline.last().copied(),
        }
    }

    /// Close the session and build its report.
    ///
    /// Fails with [`RepformError::NoDetection`] when no frame was usable.
    pub fn finalize(self) -> RepformResult<SessionReport> {
        let stats = self.analyzer.stats().clone();
        if stats.usable_frames == 0 {
            tracing::warn!(
                exercise = self.exercise,
                frames = stats.frames_processed,
                "no usable frames in session"
            );
            return Err(RepformError::NoDetection {
                frames_processed: stats.frames_processed,
            });
        }

        let last_frame = self.last_frame.unwrap_or(FrameIndex::ZERO);
        let feedback = self
            .aggregator
            .summarize(self.analyzer.into_violations(), last_frame);

        let average_form_score = if self.timeline.is_empty() {
            0.0
        } else {
            self.timeline.iter().map(|r| r.quality).sum::<f32>() / self.timeline.len() as f32
        };

        let report = SessionReport {
            exercise_type: self.exercise.to_string(),
            total_reps: self.timeline.len() as u32,
            average_form_score,
            form_accuracy: stats.form_accuracy(),
            frames_processed: stats.frames_processed,
            frames_skipped: stats.frames_skipped,
            duration_secs: self.fps.map(|fps| stats.frames_processed as f32 / fps),
            violations: feedback.violations,
            timeline: self.timeline,
            feedback: feedback.top,
        };

        tracing::info!(
            exercise = self.exercise,
            reps = report.total_reps,
            average_form_score = report.average_form_score,
            form_accuracy = report.form_accuracy,
            violations = report.violations.len(),
            "session finalized"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use repform_analyzer::ProfileOverride;
    use repform_core::{Landmark, LandmarkId, Position3D};

    fn arm(index: u64, degrees: f32, confidence: f32) -> Frame {
        let rad = degrees.to_radians();
        Frame::new(FrameIndex::new(index))
            .with_landmark(Landmark::new(
                LandmarkId::RightShoulder,
                Position3D::planar(0.5, 0.3),
                confidence,
            ))
            .with_landmark(Landmark::new(
                LandmarkId::RightElbow,
                Position3D::planar(0.5, 0.5),
                confidence,
            ))
            .with_landmark(Landmark::new(
                LandmarkId::RightWrist,
                Position3D::planar(0.5 + 0.2 * rad.sin(), 0.5 - 0.2 * rad.cos()),
                confidence,
            ))
    }

    fn frames(angles: &[f32]) -> Vec<Frame> {
        angles
            .iter()
            .enumerate()
            .map(|(i, &a)| arm(i as u64, a, 0.9))
            .collect()
    }

    #[test]
    fn test_unknown_exercise() {
        let err = AnalysisSession::start("burpee").unwrap_err();
        assert!(matches!(err, RepformError::UnknownExercise(ref n) if n == "burpee"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_alias_resolves_to_canonical() {
        let session = AnalysisSession::start("Push-Ups").unwrap();
        assert_eq!(session.exercise_type(), "pushup");
        assert_eq!(session.state(), ExerciseState::Ready);
    }

    #[test]
    fn test_concrete_scenario_report() {
        let mut session = AnalysisSession::start("pushup").unwrap();
        session
            .process_all(&frames(&[170.0, 170.0, 150.0, 100.0, 85.0, 85.0, 100.0, 150.0, 170.0]))
            .unwrap();
        assert_eq!(session.state(), ExerciseState::Up);

        let report = session.finalize().unwrap();
        assert_eq!(report.exercise_type, "pushup");
        assert_eq!(report.total_reps, 1);
        assert_eq!(report.timeline[0].start_frame, FrameIndex::new(4));
        assert_eq!(report.timeline[0].end_frame, FrameIndex::new(8));
        assert_eq!(report.average_form_score, 1.0);
        assert_eq!(report.frames_processed, 9);
        assert_eq!(report.duration_secs, None);
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut session = AnalysisSession::start("pushup").unwrap();
        session.process(&arm(5, 170.0, 0.9)).unwrap();

        let err = session.process(&arm(5, 170.0, 0.9)).unwrap_err();
        assert!(matches!(
            err,
            RepformError::FrameOutOfOrder { last, got } if last == FrameIndex::new(5) && got == FrameIndex::new(5)
        ));
        assert!(session.process(&arm(3, 170.0, 0.9)).is_err());
        assert!(session.process(&arm(9, 170.0, 0.9)).is_ok());
    }

    #[test]
    fn test_all_unusable_fails_with_no_detection() {
        let mut session = AnalysisSession::start("pushup").unwrap();
        for i in 0..40 {
            let outcome = session.process(&arm(i, 170.0, 0.2)).unwrap();
            assert!(!outcome.usable);
        }

        match session.finalize() {
            Err(RepformError::NoDetection { frames_processed }) => assert_eq!(frames_processed, 40),
            other => panic!("unexpected {:?}", other.map(|r| r.total_reps)),
        }
    }

    #[test]
    fn test_no_reps_scores_zero() {
        let mut session = AnalysisSession::start("pushup").unwrap();
        session.process_all(&frames(&[170.0, 168.0, 171.0])).unwrap();

        let report = session.finalize().unwrap();
        assert_eq!(report.total_reps, 0);
        assert_eq!(report.average_form_score, 0.0);
        assert_eq!(report.form_accuracy, 1.0);
    }

    #[test]
    fn test_overrides_applied_by_alias() {
        let config = SessionConfig::default().with_fps(30.0).with_override(
            "push-ups",
            ProfileOverride {
                down_threshold: Some(70.0),
                ..Default::default()
            },
        );
        let mut session =
            AnalysisSession::start_with(&ExerciseRegistry::default(), &config, "pushup").unwrap();

        // 85 no longer reaches the bottom
        session.process_all(&frames(&[170.0, 85.0, 170.0])).unwrap();
        assert_eq!(session.rep_count(), 0);

        let report = session.finalize().unwrap();
        assert_eq!(report.duration_secs, Some(0.1));
    }

    #[test]
    fn test_invalid_override_fails_at_start() {
        let config = SessionConfig::default().with_override(
            "squat",
            ProfileOverride {
                margin: Some(-1.0),
                ..Default::default()
            },
        );
        let err = AnalysisSession::start_with(&ExerciseRegistry::default(), &config, "squat")
            .unwrap_err();
        assert!(matches!(err, RepformError::InvalidConfig { .. }));

        // Overrides for other exercises are not applied
        assert!(AnalysisSession::start_with(&ExerciseRegistry::default(), &config, "pushup").is_ok());
    }

    #[test]
    fn test_progress_snapshot() {
        let mut session = AnalysisSession::start("pushup").unwrap().with_expected_frames(3);
        session.process_all(&frames(&[170.0, 85.0, 170.0])).unwrap();

        let progress = session.progress();
        assert_eq!(progress.rep_count, 1);
        assert_eq!(progress.frames_processed, 3);
        assert_eq!(progress.last_frame, Some(FrameIndex::new(2)));
        assert_eq!(progress.last_rep.map(|r| r.index), Some(1));
    }

    proptest! {
        #[test]
        fn prop_frame_order_enforced(gaps in prop::collection::vec(1u64..6, 1..40), back in 0u64..6) {
            let mut session = AnalysisSession::start("pushup").unwrap();
            let mut index = 0;
            for gap in &gaps {
                index += gap;
                prop_assert!(session.process(&arm(index, 170.0, 0.9)).is_ok());
            }

            let stale = index.saturating_sub(back);
            let rejected = matches!(
                session.process(&arm(stale, 170.0, 0.9)),
                Err(RepformError::FrameOutOfOrder { .. })
            );
            prop_assert!(rejected);
            prop_assert_eq!(session.progress().frames_processed, gaps.len() as u64);
        }
    }
}
