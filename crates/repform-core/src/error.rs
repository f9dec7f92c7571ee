//! Error types for REPFORM

use thiserror::Error;

use crate::FrameIndex;

/// Degenerate input to an angle computation.
///
/// Never fatal: the affected angle is treated as unusable for that frame.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("Coincident points: two of the three landmarks share a position")]
    CoincidentPoints,

    #[error("Non-finite landmark coordinate")]
    NonFinite,
}

/// Core REPFORM errors
#[derive(Error, Debug)]
pub enum RepformError {
    // Configuration errors
    #[error("Unknown exercise type: {0}")]
    UnknownExercise(String),

    #[error("Analyzer not configured: no exercise profile given")]
    Unconfigured,

    #[error("Invalid configuration for {exercise}: {reason}")]
    InvalidConfig { exercise: String, reason: String },

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Failed to serialize configuration: {0}")]
    ConfigSave(String),

    // Stream errors
    #[error("Frame {got} out of order: last processed frame was {last}")]
    FrameOutOfOrder { last: FrameIndex, got: FrameIndex },

    #[error("Session already finalized")]
    SessionClosed,

    #[error("Session worker failed: {0}")]
    Worker(String),

    // Detection errors
    #[error("No usable frames detected ({frames_processed} frames processed)")]
    NoDetection { frames_processed: u64 },
}

impl RepformError {
    /// Fatal configuration problem, raised before any frame is processed.
    /// Writing a configuration out is not part of this family.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RepformError::UnknownExercise(_)
                | RepformError::Unconfigured
                | RepformError::InvalidConfig { .. }
                | RepformError::ConfigLoad(_)
        )
    }
}

/// Build an [`RepformError::InvalidConfig`] for the named exercise
pub fn invalid_config(exercise: &str, reason: impl Into<String>) -> RepformError {
    RepformError::InvalidConfig {
        exercise: exercise.to_string(),
        reason: reason.into(),
    }
}

/// Result type for REPFORM operations
pub type RepformResult<T> = Result<T, RepformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_family() {
        assert!(RepformError::Unconfigured.is_configuration());
        assert!(RepformError::UnknownExercise("burpee".into()).is_configuration());
        assert!(!RepformError::NoDetection { frames_processed: 3 }.is_configuration());
    }

    #[test]
    fn test_config_save_is_not_a_load_failure() {
        let err = RepformError::ConfigSave("unsupported value".into());
        assert!(!err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Failed to serialize configuration: unsupported value"
        );
    }

    #[test]
    fn test_error_context_in_message() {
        let err = RepformError::FrameOutOfOrder {
            last: FrameIndex::new(9),
            got: FrameIndex::new(4),
        };
        let msg = err.to_string();
        assert!(msg.contains('9') && msg.contains('4'));

        let err = invalid_config("squat", "margin must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for squat: margin must be positive"
        );
    }
}
