//! REPFORM Runtime - Sessions and their execution
//!
//! This crate drives the analysis pipeline for whole videos and live feeds:
//! 1. Resolve the exercise and apply session configuration
//! 2. Feed frames in order through the exercise analyzer
//! 3. Aggregate violations into feedback
//! 4. Assemble the session report
//!
//! Sessions are independent; [`SessionPool`] runs many of them on tokio's
//! blocking pool and [`LiveSession`] shares one between a capture thread and
//! a reader.

pub mod config;
pub mod session;
pub mod report;
pub mod pool;
pub mod live;
pub mod telemetry;

pub use config::*;
pub use session::*;
pub use report::*;
pub use pool::*;
pub use live::*;
pub use telemetry::*;
