//! Session pool - many independent sessions in parallel
//!
//! Frame processing is CPU-bound, so each session runs on tokio's blocking
//! pool. A semaphore bounds how many run at once; each job owns its session
//! and its frames outright.

use std::sync::Arc;
use std::thread;

use repform_analyzer::ExerciseRegistry;
use repform_core::{Frame, RepformError, RepformResult};
use tokio::sync::Semaphore;

use crate::{AnalysisSession, SessionConfig, SessionReport};

/// One queued analysis: an exercise and the frames of its video
#[derive(Debug, Clone)]
pub struct SessionJob {
    pub exercise_type: String,
    pub frames: Vec<Frame>,
}

impl SessionJob {
    pub fn new(exercise_type: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            exercise_type: exercise_type.into(),
            frames,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionPool {
    registry: Arc<ExerciseRegistry>,
    config: Arc<SessionConfig>,
    permits: Arc<Semaphore>,
    limit: usize,
}

impl SessionPool {
    /// Pool bounded by the machine's available parallelism
    pub fn new(registry: ExerciseRegistry, config: SessionConfig) -> Self {
        let limit = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::with_limit(registry, config, limit)
    }

    pub fn with_limit(registry: ExerciseRegistry, config: SessionConfig, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Maximum sessions running at once
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run one session to completion
    pub async fn analyze(&self, job: SessionJob) -> RepformResult<SessionReport> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RepformError::Worker(e.to_string()))?;

        let registry = Arc::clone(&self.registry);
        let config = Arc::clone(&self.config);

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut session = AnalysisSession::start_with(&registry, &config, &job.exercise_type)?
                .with_expected_frames(job.frames.len() as u64);
            session.process_all(&job.frames)?;
            session.finalize()
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "session worker failed");
                Err(RepformError::Worker(e.to_string()))
            }
        }
    }

    /// Run every job; results come back in job order
    pub async fn analyze_all(&self, jobs: Vec<SessionJob>) -> Vec<RepformResult<SessionReport>> {
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let pool = self.clone();
                tokio::spawn(async move { pool.analyze(job).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(RepformError::Worker(e.to_string())),
            });
        }
        results
    }
}

impl Default for SessionPool {
    fn default() -> Self {
        Self::new(ExerciseRegistry::default(), SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repform_core::{FrameIndex, Landmark, LandmarkId, Position3D};

    fn knee(index: u64, degrees: f32) -> Frame {
        let rad = degrees.to_radians();
        let lm = |id, x, y| Landmark::new(id, Position3D::planar(x, y), 0.9);
        Frame::new(FrameIndex::new(index))
            .with_landmark(lm(LandmarkId::RightHip, 0.5, 0.3))
            .with_landmark(lm(LandmarkId::RightKnee, 0.5, 0.5))
            .with_landmark(lm(
                LandmarkId::RightAnkle,
                0.5 + 0.2 * rad.sin(),
                0.5 - 0.2 * rad.cos(),
            ))
    }

    fn squats(reps: usize) -> Vec<Frame> {
        let mut angles = vec![170.0];
        for _ in 0..reps {
            angles.extend([140.0, 100.0, 140.0, 170.0]);
        }
        angles
            .into_iter()
            .enumerate()
            .map(|(i, a)| knee(i as u64, a))
            .collect()
    }

    #[tokio::test]
    async fn test_analyze_single() {
        let pool = SessionPool::default();
        assert!(pool.limit() >= 1);

        let report = pool.analyze(SessionJob::new("squat", squats(3))).await.unwrap();
        assert_eq!(report.total_reps, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_analyze_all_keeps_order() {
        let pool = SessionPool::with_limit(ExerciseRegistry::default(), SessionConfig::default(), 2);

        let jobs = vec![
            SessionJob::new("squat", squats(1)),
            SessionJob::new("lunge", squats(1)),
            SessionJob::new("squats", squats(4)),
            SessionJob::new("squat", squats(2)),
        ];
        let results = pool.analyze_all(jobs).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().total_reps, 1);
        assert!(matches!(results[1], Err(RepformError::UnknownExercise(_))));
        assert_eq!(results[2].as_ref().unwrap().total_reps, 4);
        assert_eq!(results[3].as_ref().unwrap().total_reps, 2);
    }
}
