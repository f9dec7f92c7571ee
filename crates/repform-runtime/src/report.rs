//! Session report

use repform_core::{FormViolation, RepEvent};
use repform_feedback::RuleSummary;
use serde::Serialize;

/// Final summary of one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    /// Canonical exercise name
    pub exercise_type: String,
    pub total_reps: u32,
    /// Mean repetition quality, 0.0 when no repetition was counted
    pub average_form_score: f32,
    /// Clean usable frames / usable frames
    pub form_accuracy: f32,
    pub frames_processed: u64,
    pub frames_skipped: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f32>,
    /// Every violation interval, ordered by start frame
    pub violations: Vec<FormViolation>,
    /// Counted repetitions in order
    pub timeline: Vec<RepEvent>,
    /// Most persistent problems, ranked
    pub feedback: Vec<RuleSummary>,
}

impl SessionReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_json_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Corrective cues, most persistent first
    pub fn cues(&self) -> Vec<&'static str> {
        self.feedback.iter().map(|s| s.message).collect()
    }
}
