//! # Choreo-Core
//!
//! Core types for comparing two choreography performances captured as
//! per-frame 2D body landmarks: the landmark vocabulary, frame poses, pose
//! sequences, focus-area filtering and joint-angle geometry.

pub mod error;
pub mod geometry;
pub mod kinematics;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use kinematics::*;
pub use types::*;
