//! REPFORM Geometry - Joint angles from landmark triplets
//!
//! Pure computation, no state:
//! - Angle at a vertex from three landmarks ([`joint_angle`])
//! - Named angle definitions and per-frame angle sets ([`AngleSpec`], [`AngleSet`])

pub mod angle;
pub mod angles;

pub use angle::*;
pub use angles::*;
