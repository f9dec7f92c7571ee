//! Exercise profiles - the per-variant parameter tables
//!
//! Every exercise shares the same state machine; what differs is data:
//! which angle drives the cycle, where its thresholds sit, and which
//! secondary rules grade form. Adding an exercise means building a new
//! [`ExerciseProfile`] and registering it, nothing more.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use repform_core::{invalid_config, ExerciseState, LandmarkId, RepformResult, RuleId, Severity};
use repform_geometry::{AngleSet, AngleSpec, LandmarkSource};
use serde::{Deserialize, Serialize};

/// Heel raised above the toe by more than this fraction of shin length
const HEEL_LIFT_TOLERANCE: f32 = 0.15;

/// Primary angle thresholds with hysteresis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Bottom of the repetition (degrees)
    pub down: f32,
    /// Top of the repetition (degrees)
    pub up: f32,
    /// Hysteresis margin (degrees, strictly positive)
    pub margin: f32,
}

impl Thresholds {
    pub fn new(down: f32, up: f32, margin: f32) -> Self {
        Self { down, up, margin }
    }

    /// Angle at or below which UP turns into DESCENDING
    #[inline]
    pub fn descend_entry(&self) -> f32 {
        self.down + self.margin
    }

    /// Angle at or above which DOWN turns into ASCENDING
    #[inline]
    pub fn ascend_entry(&self) -> f32 {
        self.up - self.margin
    }

    /// The two hysteresis bands must not overlap, or one frame could
    /// complete a whole cycle.
    pub fn validate(&self, exercise: &str) -> RepformResult<()> {
        let values = [self.down, self.up, self.margin];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid_config(exercise, "thresholds must be finite"));
        }
        if self.margin <= 0.0 {
            return Err(invalid_config(exercise, "hysteresis margin must be positive"));
        }
        if !(0.0..=180.0).contains(&self.down) || !(0.0..=180.0).contains(&self.up) {
            return Err(invalid_config(exercise, "thresholds must lie in [0, 180]"));
        }
        if self.down >= self.up {
            return Err(invalid_config(
                exercise,
                format!("down threshold {} must be below up threshold {}", self.down, self.up),
            ));
        }
        if self.descend_entry() >= self.ascend_entry() {
            return Err(invalid_config(
                exercise,
                format!(
                    "margin {} too wide for thresholds {}..{}",
                    self.margin, self.down, self.up
                ),
            ));
        }
        Ok(())
    }
}

/// What a rule sees of the current frame
pub struct RuleInput<'a> {
    pub angles: &'a AngleSet,
    pub landmarks: &'a dyn LandmarkSource,
    /// State before this frame's transitions
    pub state: ExerciseState,
}

/// Custom rule body: `Some(true)` when violated, `None` when not evaluable
pub type RulePredicate = Arc<dyn Fn(&RuleInput<'_>) -> Option<bool> + Send + Sync>;

/// Secondary rule check
#[derive(Clone)]
pub enum RuleCheck {
    /// Violated when the angle falls below `min`
    AtLeast { angle: &'static str, min: f32 },
    /// Violated when the angle rises above `max`
    AtMost { angle: &'static str, max: f32 },
    /// Violated outside `[min, max]`
    Within {
        angle: &'static str,
        min: f32,
        max: f32,
    },
    Custom(RulePredicate),
}

impl RuleCheck {
    /// Evaluate; `None` when the inputs are not available this frame
    pub fn violated(&self, input: &RuleInput<'_>) -> Option<bool> {
        match self {
            RuleCheck::AtLeast { angle, min } => input.angles.degrees(angle).map(|a| a < *min),
            RuleCheck::AtMost { angle, max } => input.angles.degrees(angle).map(|a| a > *max),
            RuleCheck::Within { angle, min, max } => input
                .angles
                .degrees(angle)
                .map(|a| a < *min || a > *max),
            RuleCheck::Custom(predicate) => predicate(input),
        }
    }

    /// Angle this check reads, if it is an angle range check
    pub fn angle(&self) -> Option<&'static str> {
        match self {
            RuleCheck::AtLeast { angle, .. }
            | RuleCheck::AtMost { angle, .. }
            | RuleCheck::Within { angle, .. } => Some(*angle),
            RuleCheck::Custom(_) => None,
        }
    }
}

impl fmt::Debug for RuleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCheck::AtLeast { angle, min } => write!(f, "{} >= {}", angle, min),
            RuleCheck::AtMost { angle, max } => write!(f, "{} <= {}", angle, max),
            RuleCheck::Within { angle, min, max } => write!(f, "{} in [{}, {}]", angle, min, max),
            RuleCheck::Custom(_) => f.write_str("custom"),
        }
    }
}

/// A secondary form rule
#[derive(Debug, Clone)]
pub struct FormRule {
    pub id: RuleId,
    pub severity: Severity,
    /// Corrective cue shown when the rule fires
    pub message: &'static str,
    pub check: RuleCheck,
}

impl FormRule {
    pub fn at_least(
        id: &'static str,
        angle: &'static str,
        min: f32,
        severity: Severity,
        message: &'static str,
    ) -> Self {
        Self {
            id: RuleId::new(id),
            severity,
            message,
            check: RuleCheck::AtLeast { angle, min },
        }
    }

    pub fn at_most(
        id: &'static str,
        angle: &'static str,
        max: f32,
        severity: Severity,
        message: &'static str,
    ) -> Self {
        Self {
            id: RuleId::new(id),
            severity,
            message,
            check: RuleCheck::AtMost { angle, max },
        }
    }

    pub fn within(
        id: &'static str,
        angle: &'static str,
        min: f32,
        max: f32,
        severity: Severity,
        message: &'static str,
    ) -> Self {
        Self {
            id: RuleId::new(id),
            severity,
            message,
            check: RuleCheck::Within { angle, min, max },
        }
    }

    pub fn custom<F>(id: &'static str, severity: Severity, message: &'static str, predicate: F) -> Self
    where
        F: Fn(&RuleInput<'_>) -> Option<bool> + Send + Sync + 'static,
    {
        Self {
            id: RuleId::new(id),
            severity,
            message,
            check: RuleCheck::Custom(Arc::new(predicate)),
        }
    }

    /// Replace the single limit of an `AtLeast`/`AtMost` check
    fn set_limit(&mut self, limit: f32) -> bool {
        match &mut self.check {
            RuleCheck::AtLeast { min, .. } => *min = limit,
            RuleCheck::AtMost { max, .. } => *max = limit,
            RuleCheck::Within { .. } | RuleCheck::Custom(_) => return false,
        }
        true
    }
}

/// Per-exercise overrides from session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f32>,
    /// Rule id → new limit for single-limit angle rules
    pub rule_limits: HashMap<String, f32>,
}

/// One exercise variant: primary angle, thresholds and form rules
#[derive(Debug, Clone)]
pub struct ExerciseProfile {
    /// Canonical registry name
    pub name: &'static str,
    /// Alternative names accepted by the registry
    pub aliases: Vec<&'static str>,
    /// Angle whose threshold crossings drive the state machine
    pub primary: AngleSpec,
    pub thresholds: Thresholds,
    /// Angles read by secondary rules
    pub secondary: Vec<AngleSpec>,
    pub rules: Vec<FormRule>,
}

impl ExerciseProfile {
    pub fn new(name: &'static str, primary: AngleSpec, thresholds: Thresholds) -> Self {
        Self {
            name,
            aliases: Vec::new(),
            primary,
            thresholds,
            secondary: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&'static str]) -> Self {
        self.aliases.extend_from_slice(aliases);
        self
    }

    pub fn with_angle(mut self, spec: AngleSpec) -> Self {
        self.secondary.push(spec);
        self
    }

    pub fn with_rule(mut self, rule: FormRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Push-up: elbow drives the cycle; elbow flare and hip sag are graded
    pub fn pushup() -> Self {
        ExerciseProfile::new(
            "pushup",
            AngleSpec::new(
                "elbow",
                LandmarkId::RightShoulder,
                LandmarkId::RightElbow,
                LandmarkId::RightWrist,
            ),
            Thresholds::new(90.0, 160.0, 5.0),
        )
        .with_aliases(&["push-up", "push-ups", "pushups"])
        .with_angle(AngleSpec::new(
            "shoulder",
            LandmarkId::RightElbow,
            LandmarkId::RightShoulder,
            LandmarkId::RightHip,
        ))
        .with_angle(AngleSpec::new(
            "body_alignment",
            LandmarkId::RightShoulder,
            LandmarkId::RightHip,
            LandmarkId::RightKnee,
        ))
        .with_rule(FormRule::at_most(
            "elbow_flare",
            "shoulder",
            45.0,
            Severity::Warning,
            "Keep elbows closer to body - don't flare them out",
        ))
        .with_rule(FormRule::at_least(
            "hip_sag",
            "body_alignment",
            160.0,
            Severity::Error,
            "Keep body straight - avoid hip sagging",
        ))
    }

    /// Squat: knee drives the cycle; chest posture and heel contact are graded
    pub fn squat() -> Self {
        ExerciseProfile::new(
            "squat",
            AngleSpec::new(
                "knee",
                LandmarkId::RightHip,
                LandmarkId::RightKnee,
                LandmarkId::RightAnkle,
            ),
            Thresholds::new(110.0, 160.0, 5.0),
        )
        .with_aliases(&["squats"])
        .with_angle(AngleSpec::new(
            "hip",
            LandmarkId::RightShoulder,
            LandmarkId::RightHip,
            LandmarkId::RightKnee,
        ))
        .with_rule(FormRule::at_least(
            "chest_drop",
            "hip",
            45.0,
            Severity::Warning,
            "Keep chest up - maintain proud posture",
        ))
        .with_rule(FormRule::custom(
            "heel_lift",
            Severity::Error,
            "Keep heels on the ground",
            heel_lifted,
        ))
    }

    /// Landmarks a frame must carry to be usable: the primary triplet
    pub fn required_landmarks(&self) -> Vec<LandmarkId> {
        self.primary.landmarks().to_vec()
    }

    /// Every angle to compute per frame, primary first
    pub fn angle_specs(&self) -> Vec<AngleSpec> {
        std::iter::once(self.primary)
            .chain(self.secondary.iter().copied())
            .collect()
    }

    pub fn rule(&self, id: &str) -> Option<&FormRule> {
        self.rules.iter().find(|r| r.id.as_str() == id)
    }

    /// Check thresholds and that every angle rule reads a computed angle
    pub fn validate(&self) -> RepformResult<()> {
        self.thresholds.validate(self.name)?;

        let specs = self.angle_specs();
        for rule in &self.rules {
            if let Some(angle) = rule.check.angle() {
                if !specs.iter().any(|s| s.name == angle) {
                    return Err(invalid_config(
                        self.name,
                        format!("rule {} reads unknown angle {}", rule.id, angle),
                    ));
                }
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if self.rules[..i].iter().any(|r| r.id == rule.id) {
                return Err(invalid_config(
                    self.name,
                    format!("duplicate rule id {}", rule.id),
                ));
            }
        }

        Ok(())
    }

    /// Apply session overrides, then re-validate
    pub fn apply_override(&mut self, overrides: &ProfileOverride) -> RepformResult<()> {
        if let Some(down) = overrides.down_threshold {
            self.thresholds.down = down;
        }
        if let Some(up) = overrides.up_threshold {
            self.thresholds.up = up;
        }
        if let Some(margin) = overrides.margin {
            self.thresholds.margin = margin;
        }

        for (id, &limit) in &overrides.rule_limits {
            let exercise = self.name;
            let rule = self
                .rules
                .iter_mut()
                .find(|r| r.id.as_str() == id.as_str())
                .ok_or_else(|| invalid_config(exercise, format!("unknown rule {}", id)))?;
            if !rule.set_limit(limit) {
                return Err(invalid_config(
                    exercise,
                    format!("rule {} has no adjustable limit", id),
                ));
            }
        }

        self.validate()
    }
}

/// Heel raised relative to the toe, scaled by shin length so the check is
/// independent of distance to the camera. Image y grows downward.
fn heel_lifted(input: &RuleInput<'_>) -> Option<bool> {
    let lm = input.landmarks;
    let knee = lm.landmark(LandmarkId::RightKnee)?;
    let ankle = lm.landmark(LandmarkId::RightAnkle)?;
    let heel = lm.landmark(LandmarkId::RightHeel)?;
    let toe = lm.landmark(LandmarkId::RightFootIndex)?;

    let shin = knee.position.distance(&ankle.position);
    if shin <= f32::EPSILON {
        return None;
    }

    let rise = toe.position.y - heel.position.y;
    Some(rise > HEEL_LIFT_TOLERANCE * shin)
}
