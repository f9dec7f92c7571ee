//! Violation log - one contiguous record per firing interval
//!
//! Each rule has at most one open record. A frame where the rule fires opens
//! a record or extends the open one; the first evaluated frame where it does
//! not fire closes it. Frames where the rule could not be evaluated leave the
//! record as it is.

use std::collections::HashMap;

use repform_core::{FormViolation, FrameIndex, RuleId, Severity};

use crate::FormRule;

#[derive(Debug, Clone, Default)]
pub struct ViolationLog {
    /// Rule → index of its open record
    open: HashMap<RuleId, usize>,
    records: Vec<FormViolation>,
}

impl ViolationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rule outcome for `frame`
    pub fn observe(&mut self, rule: &FormRule, outcome: Option<bool>, frame: FrameIndex) {
        match outcome {
            Some(true) => self.fire(rule.id, rule.severity, rule.message, frame),
            Some(false) => self.clear(rule.id),
            None => {}
        }
    }

    /// Open or extend the record for `rule`
    pub fn fire(&mut self, rule: RuleId, severity: Severity, message: &'static str, frame: FrameIndex) {
        if let Some(&idx) = self.open.get(&rule) {
            self.records[idx].extend_to(frame);
            return;
        }
        self.open.insert(rule, self.records.len());
        self.records
            .push(FormViolation::open(rule, severity, message, frame));
    }

    /// Close the open record for `rule`, if any
    pub fn clear(&mut self, rule: RuleId) {
        if let Some(idx) = self.open.remove(&rule) {
            self.records[idx].close();
        }
    }

    /// Record a single-frame occurrence
    pub fn record_once(&mut self, rule: RuleId, severity: Severity, message: &'static str, frame: FrameIndex) {
        self.fire(rule, severity, message, frame);
        self.clear(rule);
    }

    pub fn is_open(&self, rule: RuleId) -> bool {
        self.open.contains_key(&rule)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// All records (open and closed) in opening order
    pub fn records(&self) -> &[FormViolation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<FormViolation> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> FormRule {
        FormRule::at_least(
            "hip_sag",
            "body_alignment",
            160.0,
            Severity::Error,
            "Keep body straight",
        )
    }

    fn f(i: u64) -> FrameIndex {
        FrameIndex::new(i)
    }

    #[test]
    fn test_sustained_violation_single_record() {
        let mut log = ViolationLog::new();
        let rule = rule();

        for i in 10..20 {
            log.observe(&rule, Some(true), f(i));
        }

        assert_eq!(log.len(), 1);
        let v = &log.records()[0];
        assert_eq!(v.start_frame, f(10));
        assert_eq!(v.end_frame, f(19));
        assert_eq!(v.duration_frames(), 10);
        assert!(v.is_open());
    }

    #[test]
    fn test_gap_starts_new_record() {
        let mut log = ViolationLog::new();
        let rule = rule();

        log.observe(&rule, Some(true), f(0));
        log.observe(&rule, Some(true), f(1));
        log.observe(&rule, Some(false), f(2));
        log.observe(&rule, Some(true), f(3));

        assert_eq!(log.len(), 2);
        assert!(!log.records()[0].is_open());
        assert_eq!(log.records()[0].end_frame, f(1));
        assert_eq!(log.records()[1].start_frame, f(3));
        assert_eq!(log.open_count(), 1);
    }

    #[test]
    fn test_unevaluated_frame_keeps_record_open() {
        let mut log = ViolationLog::new();
        let rule = rule();

        log.observe(&rule, Some(true), f(0));
        log.observe(&rule, None, f(1));
        log.observe(&rule, Some(true), f(2));

        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].end_frame, f(2));
    }

    #[test]
    fn test_record_once() {
        let mut log = ViolationLog::new();
        let id = RuleId::new("insufficient_depth");

        log.record_once(id, Severity::Warning, "Go deeper", f(7));

        assert_eq!(log.len(), 1);
        assert!(!log.is_open(id));
        assert_eq!(log.records()[0].duration_frames(), 1);
    }
}
