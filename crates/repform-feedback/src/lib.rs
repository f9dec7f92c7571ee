//! REPFORM Feedback - Turning violation records into corrective cues
//!
//! The aggregator runs once at the end of a session:
//! - Still-open violations are closed at the last processed frame
//! - Records are grouped per rule and ranked by how long the rule fired
//! - The top entries become the session's feedback

pub mod aggregator;

pub use aggregator::*;
