//! Exercise state - the position of the mover within a repetition cycle

use std::fmt;

use serde::{Deserialize, Serialize};

/// Repetition cycle state
///
/// READY → UP → DESCENDING → DOWN → ASCENDING → UP (one repetition)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseState {
    /// No valid top position seen yet, or reset after occlusion
    #[default]
    Ready,
    /// At or above the up threshold
    Up,
    /// Falling toward the down threshold
    Descending,
    /// Bottom of the repetition reached
    Down,
    /// Rising back toward the up threshold
    Ascending,
}

impl ExerciseState {
    /// Is a repetition in progress (started but not completed)?
    pub fn in_rep(self) -> bool {
        matches!(
            self,
            ExerciseState::Descending | ExerciseState::Down | ExerciseState::Ascending
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseState::Ready => "ready",
            ExerciseState::Up => "up",
            ExerciseState::Descending => "descending",
            ExerciseState::Down => "down",
            ExerciseState::Ascending => "ascending",
        }
    }
}

impl fmt::Display for ExerciseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
