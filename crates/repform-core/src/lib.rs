//! REPFORM Core - Fundamental types and primitives
//!
//! This crate defines the core types shared by every stage of the analysis
//! pipeline:
//! - Identifiers (LandmarkId, FrameIndex, RuleId)
//! - Landmarks and frames as delivered by the pose estimator
//! - Exercise state and the records a session produces (RepEvent, FormViolation)
//! - Error taxonomy

pub mod id;
pub mod landmark;
pub mod state;
pub mod event;
pub mod error;

pub use id::*;
pub use landmark::*;
pub use state::*;
pub use event::*;
pub use error::*;
