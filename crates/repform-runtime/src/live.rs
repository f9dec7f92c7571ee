//! Live session - one session shared between a capture thread and readers
//!
//! The capture side pushes frames as they arrive; any number of readers
//! poll the latest outcome and progress for display. Finishing takes the
//! session out, after which pushes fail with [`RepformError::SessionClosed`].

use std::sync::Arc;

use parking_lot::Mutex;
use repform_analyzer::ExerciseRegistry;
use repform_core::{Frame, RepformError, RepformResult};

use crate::{AnalysisSession, FrameOutcome, SessionConfig, SessionProgress, SessionReport};

struct LiveState {
    session: Option<AnalysisSession>,
    latest: Option<FrameOutcome>,
    progress: SessionProgress,
}

/// Cloneable handle to a shared session
#[derive(Clone)]
pub struct LiveSession {
    inner: Arc<Mutex<LiveState>>,
}

impl LiveSession {
    pub fn new(session: AnalysisSession) -> Self {
        let progress = session.progress();
        Self {
            inner: Arc::new(Mutex::new(LiveState {
                session: Some(session),
                latest: None,
                progress,
            })),
        }
    }

    pub fn start(exercise_type: &str) -> RepformResult<Self> {
        AnalysisSession::start(exercise_type).map(Self::new)
    }

    pub fn start_with(
        registry: &ExerciseRegistry,
        config: &SessionConfig,
        exercise_type: &str,
    ) -> RepformResult<Self> {
        AnalysisSession::start_with(registry, config, exercise_type).map(Self::new)
    }

    /// Process one captured frame
    pub fn push(&self, frame: &Frame) -> RepformResult<FrameOutcome> {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        let session = state.session.as_mut().ok_or(RepformError::SessionClosed)?;

        let outcome = session.process(frame)?;
        state.progress = session.progress();
        state.latest = Some(outcome.clone());
        Ok(outcome)
    }

    /// Outcome of the most recent frame
    pub fn latest(&self) -> Option<FrameOutcome> {
        self.inner.lock().latest.clone()
    }

    pub fn progress(&self) -> SessionProgress {
        self.inner.lock().progress.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.lock().session.is_none()
    }

    /// Stop the session and build its report. Only the first call succeeds.
    pub fn finish(&self) -> RepformResult<SessionReport> {
        let session = self
            .inner
            .lock()
            .session
            .take()
            .ok_or(RepformError::SessionClosed)?;
        session.finalize()
    }
}
