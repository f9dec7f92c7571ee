//! Repetition state machine
//!
//! One analyzer per stream. Each frame is validated, its angles computed,
//! the secondary rules evaluated and the primary angle fed through the
//! hysteresis state machine:
//!
//! ```text
//! READY ──≥up──> UP ──≤down+margin──> DESCENDING ──≤down──> DOWN
//!                 ^                                           │
//!                 │                                  ≥up-margin
//!                 │                                           v
//!                 └──────────────────≥up─────────────── ASCENDING
//! ```
//!
//! Only ASCENDING → UP counts a repetition. DESCENDING leaves only for DOWN
//! (or READY after an occlusion); a descent that turns back up short of
//! `down` stays in DESCENDING and is flagged as `insufficient_depth`. Transitions cascade within a
//! frame, so a coarse stream (e.g. a low frame rate) that jumps straight
//! from the top to the bottom still walks every state.

use repform_core::{
    invalid_config, ExerciseState, FormViolation, Frame, FrameIndex, LandmarkId, RepEvent,
    RepformError, RepformResult, RuleId, Severity,
};
use repform_geometry::{compute_angles, AngleMode, AngleSet, AngleSpec};
use serde::Serialize;

use crate::{
    ExerciseProfile, LandmarkValidator, RuleInput, Validation, ViolationLog,
    DEFAULT_MIN_CONFIDENCE,
};

/// Consecutive unusable frames mid-repetition before the cycle is abandoned
pub const DEFAULT_UNUSABLE_RESET: u32 = 15;

/// Recorded when a descent turns back up before reaching the down threshold
pub const INSUFFICIENT_DEPTH: RuleId = RuleId::new("insufficient_depth");

const INSUFFICIENT_DEPTH_MESSAGE: &str = "Go lower - the descent stopped short of full depth";

/// Analyzer counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyzerStats {
    pub frames_processed: u64,
    /// Unusable frames, including frames whose primary angle was degenerate
    pub frames_skipped: u64,
    pub usable_frames: u64,
    /// Usable frames on which no secondary rule fired
    pub clean_frames: u64,
    /// Repetitions abandoned after an occlusion
    pub reps_discarded: u64,
    /// Descents that rebounded to the top without reaching the down threshold
    pub shallow_descents: u64,
}

impl AnalyzerStats {
    /// Clean usable frames / usable frames (1.0 when nothing was usable)
    pub fn form_accuracy(&self) -> f32 {
        if self.usable_frames == 0 {
            return 1.0;
        }
        self.clean_frames as f32 / self.usable_frames as f32
    }
}

/// Result of feeding one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameAnalysis {
    pub frame: FrameIndex,
    /// State after this frame
    pub state: ExerciseState,
    pub usable: bool,
    /// Repetition completed on this frame
    pub rep: Option<RepEvent>,
    pub rep_count: u32,
    pub angles: AngleSet,
    /// Rules that fired on this frame
    pub violated: Vec<RuleId>,
}

/// Frame tally of the repetition in progress
#[derive(Debug, Clone, Copy)]
struct RepTally {
    start: FrameIndex,
    usable: u64,
    clean: u64,
}

impl RepTally {
    fn new(start: FrameIndex) -> Self {
        Self {
            start,
            usable: 0,
            clean: 0,
        }
    }

    fn record(&mut self, clean: bool) {
        self.usable += 1;
        if clean {
            self.clean += 1;
        }
    }

    fn quality(&self) -> f32 {
        if self.usable == 0 {
            return 1.0;
        }
        self.clean as f32 / self.usable as f32
    }
}

/// Builder for [`ExerciseAnalyzer`]
#[derive(Debug, Clone)]
pub struct AnalyzerBuilder {
    profile: Option<ExerciseProfile>,
    min_confidence: f32,
    angle_mode: AngleMode,
    unusable_reset: u32,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self {
            profile: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            angle_mode: AngleMode::default(),
            unusable_reset: DEFAULT_UNUSABLE_RESET,
        }
    }
}

impl AnalyzerBuilder {
    pub fn profile(mut self, profile: ExerciseProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn angle_mode(mut self, mode: AngleMode) -> Self {
        self.angle_mode = mode;
        self
    }

    pub fn unusable_reset(mut self, frames: u32) -> Self {
        self.unusable_reset = frames;
        self
    }

    /// Validate the configuration and build the analyzer
    pub fn build(self) -> RepformResult<ExerciseAnalyzer> {
        let profile = self.profile.ok_or(RepformError::Unconfigured)?;
        profile.validate()?;

        if self.unusable_reset == 0 {
            return Err(invalid_config(profile.name, "unusable_reset must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(invalid_config(
                profile.name,
                format!("min_confidence {} outside [0, 1]", self.min_confidence),
            ));
        }

        Ok(ExerciseAnalyzer {
            specs: profile.angle_specs(),
            required: profile.required_landmarks(),
            profile,
            validator: LandmarkValidator::new(self.min_confidence),
            angle_mode: self.angle_mode,
            unusable_reset: self.unusable_reset,
            state: ExerciseState::Ready,
            current: None,
            shallow_flagged: false,
            rep_count: 0,
            consecutive_unusable: 0,
            violations: ViolationLog::new(),
            stats: AnalyzerStats::default(),
        })
    }
}

/// Per-stream exercise analyzer
#[derive(Debug)]
pub struct ExerciseAnalyzer {
    profile: ExerciseProfile,
    specs: Vec<AngleSpec>,
    required: Vec<LandmarkId>,
    validator: LandmarkValidator,
    angle_mode: AngleMode,
    unusable_reset: u32,

    state: ExerciseState,
    current: Option<RepTally>,
    /// Set once the current descent has been flagged as too shallow
    shallow_flagged: bool,
    rep_count: u32,
    consecutive_unusable: u32,
    violations: ViolationLog,
    stats: AnalyzerStats,
}

impl ExerciseAnalyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    /// Analyzer with default validation and reset settings
    pub fn new(profile: ExerciseProfile) -> RepformResult<Self> {
        Self::builder().profile(profile).build()
    }

    /// Feed one frame
    pub fn step(&mut self, frame: &Frame) -> FrameAnalysis {
        self.stats.frames_processed += 1;
        let index = frame.index;

        let view = match self.validator.validate(frame, &self.required) {
            Validation::Usable(view) => view,
            Validation::Unusable(reason) => {
                tracing::trace!(
                    frame = index.as_u64(),
                    missing = ?reason.missing,
                    low_confidence = ?reason.low_confidence,
                    "unusable frame"
                );
                return self.skip(index, AngleSet::new());
            }
        };

        let (angles, failures) = compute_angles(&view, &self.specs, self.angle_mode);
        for (name, err) in &failures.degenerate {
            tracing::debug!(frame = index.as_u64(), angle = *name, error = %err, "angle dropped");
        }

        let Some(primary) = angles.degrees(self.profile.primary.name) else {
            return self.skip(index, angles);
        };

        self.consecutive_unusable = 0;
        self.stats.usable_frames += 1;

        // Rules see the state the frame arrived in
        let input = RuleInput {
            angles: &angles,
            landmarks: &view,
            state: self.state,
        };
        let mut violated = Vec::new();
        for rule in &self.profile.rules {
            let outcome = rule.check.violated(&input);
            if outcome == Some(true) {
                violated.push(rule.id);
            }
            self.violations.observe(rule, outcome, index);
        }

        let clean = violated.is_empty();
        if clean {
            self.stats.clean_frames += 1;
        }

        let rep = self.advance(primary, index, clean);

        FrameAnalysis {
            frame: index,
            state: self.state,
            usable: true,
            rep,
            rep_count: self.rep_count,
            angles,
            violated,
        }
    }

    /// Run transitions on a usable primary angle until none applies
    fn advance(&mut self, angle: f32, frame: FrameIndex, clean: bool) -> Option<RepEvent> {
        use ExerciseState::*;

        let t = self.profile.thresholds;
        let mut rep = None;

        loop {
            let from = self.state;
            let next = match from {
                Ready if angle >= t.up => Up,
                Up if angle <= t.descend_entry() => {
                    self.current = Some(RepTally::new(frame));
                    self.shallow_flagged = false;
                    Descending
                }
                Descending if angle <= t.down => Down,
                Down if angle >= t.ascend_entry() => Ascending,
                Ascending if angle >= t.up => {
                    rep = self.complete(frame, clean);
                    Up
                }
                _ => break,
            };

            tracing::debug!(
                frame = frame.as_u64(),
                angle,
                from = %from,
                to = %next,
                "state transition"
            );
            self.state = next;
        }

        if self.state == Descending && angle >= t.up && !self.shallow_flagged {
            self.shallow_flagged = true;
            self.stats.shallow_descents += 1;
            tracing::debug!(frame = frame.as_u64(), angle, "descent rebounded short of depth");
            self.violations.record_once(
                INSUFFICIENT_DEPTH,
                Severity::Warning,
                INSUFFICIENT_DEPTH_MESSAGE,
                frame,
            );
        }

        if self.state.in_rep() {
            if let Some(tally) = self.current.as_mut() {
                tally.record(clean);
            }
        }

        rep
    }

    fn complete(&mut self, frame: FrameIndex, clean: bool) -> Option<RepEvent> {
        let mut tally = self.current.take()?;
        tally.record(clean);

        self.rep_count += 1;
        let rep = RepEvent::new(self.rep_count, tally.start, frame, tally.quality());

        tracing::info!(
            exercise = self.profile.name,
            rep = rep.index,
            start = rep.start_frame.as_u64(),
            end = rep.end_frame.as_u64(),
            quality = rep.quality,
            "repetition counted"
        );
        Some(rep)
    }

    fn skip(&mut self, frame: FrameIndex, angles: AngleSet) -> FrameAnalysis {
        self.stats.frames_skipped += 1;
        self.consecutive_unusable = self.consecutive_unusable.saturating_add(1);

        if self.state.in_rep() && self.consecutive_unusable >= self.unusable_reset {
            tracing::warn!(
                exercise = self.profile.name,
                frame = frame.as_u64(),
                state = %self.state,
                unusable = self.consecutive_unusable,
                "tracking lost mid-repetition, discarding it"
            );
            self.state = ExerciseState::Ready;
            self.current = None;
            self.stats.reps_discarded += 1;
        }

        FrameAnalysis {
            frame,
            state: self.state,
            usable: false,
            rep: None,
            rep_count: self.rep_count,
            angles,
            violated: Vec::new(),
        }
    }

    pub fn state(&self) -> ExerciseState {
        self.state
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn profile(&self) -> &ExerciseProfile {
        &self.profile
    }

    pub fn unusable_reset(&self) -> u32 {
        self.unusable_reset
    }

    pub fn stats(&self) -> &AnalyzerStats {
        &self.stats
    }

    pub fn violations(&self) -> &ViolationLog {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<FormViolation> {
        self.violations.into_records()
    }

    /// Back to READY with all counters and records cleared
    pub fn reset(&mut self) {
        self.state = ExerciseState::Ready;
        self.current = None;
        self.shallow_flagged = false;
        self.rep_count = 0;
        self.consecutive_unusable = 0;
        self.violations = ViolationLog::new();
        self.stats = AnalyzerStats::default();
    }
}
