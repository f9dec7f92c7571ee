//! End-to-end Scenario Suite
//!
//! Runs synthetic streams through full sessions and checks the observable
//! behaviour of the pipeline:
//! - Repetition counting at any cadence
//! - Hysteresis against measurement noise
//! - Detection failure and occlusion recovery
//! - Repetition quality and violation intervals
//! - Feedback ranking and report shape

use repform_analyzer::ExerciseRegistry;
use repform_core::{ExerciseState, Frame, RepEvent, RepformResult};
use repform_runtime::{AnalysisSession, FrameOutcome, SessionConfig, SessionReport};

// ============================================================================
// SCENARIO RUNNER
// ============================================================================

/// Per-frame outcomes and the final report of one scenario
pub struct ScenarioRun {
    pub outcomes: Vec<FrameOutcome>,
    pub report: RepformResult<SessionReport>,
}

impl ScenarioRun {
    /// Repetitions in emission order
    pub fn reps(&self) -> Vec<RepEvent> {
        self.outcomes.iter().filter_map(|o| o.rep).collect()
    }

    /// Frames on which the state changed, starting from READY
    pub fn state_changes(&self) -> usize {
        let mut previous = ExerciseState::Ready;
        let mut changes = 0;
        for outcome in &self.outcomes {
            if outcome.state != previous {
                changes += 1;
                previous = outcome.state;
            }
        }
        changes
    }

    pub fn final_state(&self) -> ExerciseState {
        self.outcomes
            .last()
            .map(|o| o.state)
            .unwrap_or(ExerciseState::Ready)
    }
}

/// Run `frames` through a fresh session with the built-in exercises
pub fn run_scenario(exercise: &str, config: &SessionConfig, frames: &[Frame]) -> RepformResult<ScenarioRun> {
    let mut session = AnalysisSession::start_with(&ExerciseRegistry::default(), config, exercise)?;

    let mut outcomes = Vec::with_capacity(frames.len());
    for frame in frames {
        outcomes.push(session.process(frame)?);
    }

    Ok(ScenarioRun {
        outcomes,
        report: session.finalize(),
    })
}

/// Run with the default configuration
pub fn run_default(exercise: &str, frames: &[Frame]) -> RepformResult<ScenarioRun> {
    run_scenario(exercise, &SessionConfig::default(), frames)
}
