//! Session records: repetitions and form violations
//!
//! Both are produced incrementally while frames are processed and collected
//! into the final report. A [`RepEvent`] is immutable once created; a
//! [`FormViolation`] grows while its rule keeps firing and is frozen when it
//! closes.

use std::fmt;

use serde::Serialize;

use crate::{FrameIndex, RuleId};

/// One completed repetition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepEvent {
    /// 1-based sequence index within the session
    #[serde(rename = "rep_index")]
    pub index: u32,
    /// Frame of the UP → DESCENDING transition that opened the cycle
    pub start_frame: FrameIndex,
    /// Frame of the ASCENDING → UP transition that closed the cycle
    pub end_frame: FrameIndex,
    /// Fraction of usable frames in the cycle with clean form [0.0 - 1.0]
    #[serde(rename = "quality_score")]
    pub quality: f32,
}

impl RepEvent {
    /// Create a repetition record.
    ///
    /// `end_frame` must be strictly after `start_frame`; quality is clamped to [0, 1].
    pub fn new(index: u32, start_frame: FrameIndex, end_frame: FrameIndex, quality: f32) -> Self {
        debug_assert!(end_frame > start_frame, "rep must span at least two frames");
        Self {
            index,
            start_frame,
            end_frame,
            quality: quality.clamp(0.0, 1.0),
        }
    }

    /// Inclusive frame count of the repetition
    pub fn duration_frames(&self) -> u64 {
        self.start_frame.span_to(self.end_frame)
    }
}

/// Violation severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous interval during which one form rule fired
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormViolation {
    pub rule: RuleId,
    pub severity: Severity,
    /// Corrective cue shown to the user
    pub message: &'static str,
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
    #[serde(skip)]
    open: bool,
}

impl FormViolation {
    /// Open a new violation at `frame`
    pub fn open(rule: RuleId, severity: Severity, message: &'static str, frame: FrameIndex) -> Self {
        Self {
            rule,
            severity,
            message,
            start_frame: frame,
            end_frame: frame,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Extend an open violation through `frame`. Closed records are left unchanged.
    pub fn extend_to(&mut self, frame: FrameIndex) {
        if self.open && frame > self.end_frame {
            self.end_frame = frame;
        }
    }

    /// Close the violation; no further extension happens
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Inclusive frame count of the violation
    pub fn duration_frames(&self) -> u64 {
        self.start_frame.span_to(self.end_frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rep_quality_clamped() {
        let rep = RepEvent::new(1, FrameIndex::new(4), FrameIndex::new(8), 1.4);
        assert_eq!(rep.quality, 1.0);
        assert_eq!(rep.duration_frames(), 5);
    }

    #[test]
    fn test_violation_lifecycle() {
        let mut v = FormViolation::open(
            RuleId::new("hip_sag"),
            Severity::Error,
            "Keep body straight",
            FrameIndex::new(10),
        );
        assert!(v.is_open());

        v.extend_to(FrameIndex::new(12));
        assert_eq!(v.duration_frames(), 3);

        v.close();
        v.extend_to(FrameIndex::new(20));
        assert_eq!(v.end_frame, FrameIndex::new(12));
        assert!(!v.is_open());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }
}
