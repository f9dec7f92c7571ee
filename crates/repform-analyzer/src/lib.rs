//! REPFORM Analyzer - From per-frame angles to repetitions and violations
//!
//! This crate implements the exercise analysis pipeline for one stream:
//! - Landmark validation against a confidence floor
//! - Exercise profiles: primary angle, thresholds, secondary form rules
//! - The repetition state machine with hysteresis and occlusion reset
//! - Contiguous violation tracking
//! - The exercise registry resolving names to profiles

pub mod validator;
pub mod profile;
pub mod violations;
pub mod machine;
pub mod registry;

pub use validator::*;
pub use profile::*;
pub use violations::*;
pub use machine::*;
pub use registry::*;
