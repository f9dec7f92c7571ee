//! Feedback aggregation

use std::collections::HashMap;

use repform_core::{FormViolation, FrameIndex, RuleId, Severity};
use serde::Serialize;

/// Default number of ranked feedback entries
pub const DEFAULT_TOP_K: usize = 5;

/// Everything one rule contributed to a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSummary {
    pub rule: RuleId,
    pub severity: Severity,
    pub message: &'static str,
    /// Number of separate violation intervals
    pub occurrences: usize,
    /// Frames covered by all intervals
    pub total_frames: u64,
    pub first_frame: FrameIndex,
    pub last_frame: FrameIndex,
}

impl RuleSummary {
    fn from_violation(v: &FormViolation) -> Self {
        Self {
            rule: v.rule,
            severity: v.severity,
            message: v.message,
            occurrences: 1,
            total_frames: v.duration_frames(),
            first_frame: v.start_frame,
            last_frame: v.end_frame,
        }
    }

    fn absorb(&mut self, v: &FormViolation) {
        self.occurrences += 1;
        self.total_frames += v.duration_frames();
        self.severity = self.severity.max(v.severity);
        self.first_frame = self.first_frame.min(v.start_frame);
        self.last_frame = self.last_frame.max(v.end_frame);
    }
}

/// Aggregated session feedback
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackReport {
    /// Ranked rules, most persistent first
    pub top: Vec<RuleSummary>,
    /// Every violation record, closed, ordered by start frame
    pub violations: Vec<FormViolation>,
}

impl FeedbackReport {
    /// Corrective cues in ranking order
    pub fn cues(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.top.iter().map(|s| s.message)
    }
}

/// Ranks violations into the top-K feedback entries
#[derive(Debug, Clone, Copy)]
pub struct FeedbackAggregator {
    top_k: usize,
}

impl FeedbackAggregator {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Close, group and rank the session's violations.
    ///
    /// Open records are closed at `last_frame`. Groups rank by total frames
    /// descending, then by severity descending, then by rule id.
    pub fn summarize(&self, violations: Vec<FormViolation>, last_frame: FrameIndex) -> FeedbackReport {
        let mut violations = violations;
        for v in violations.iter_mut().filter(|v| v.is_open()) {
            v.extend_to(last_frame);
            v.close();
        }
        violations.sort_by_key(|v| (v.start_frame, v.rule));

        let mut groups: HashMap<RuleId, RuleSummary> = HashMap::new();
        for v in &violations {
            groups
                .entry(v.rule)
                .and_modify(|s| s.absorb(v))
                .or_insert_with(|| RuleSummary::from_violation(v));
        }

        let mut top: Vec<RuleSummary> = groups.into_values().collect();
        top.sort_by(|a, b| {
            b.total_frames
                .cmp(&a.total_frames)
                .then(b.severity.cmp(&a.severity))
                .then(a.rule.cmp(&b.rule))
        });
        top.truncate(self.top_k);

        FeedbackReport { top, violations }
    }
}

impl Default for FeedbackAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}
