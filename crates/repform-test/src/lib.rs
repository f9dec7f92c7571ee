//! REPFORM Test Harness - Synthetic sessions and pipeline validation
//!
//! This crate provides:
//! - A seeded pose simulator realising target joint angles as landmarks
//! - Angle trajectories for repetition scenarios
//! - End-to-end scenario tests over the full session pipeline

pub mod simulator;
pub mod integration;

pub use simulator::*;
pub use integration::*;
