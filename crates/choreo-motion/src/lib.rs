//! # Choreo-Motion
//!
//! Motion comparison engine for two choreography performances.
//!
//! ## Pipeline
//!
//! 1. **Encode** each retained frame into a fixed-length vector
//! 2. **Align** the two vector sequences with Dynamic Time Warping
//! 3. **Score** pose, timing and coordinate-distance similarity along the path
//! 4. **Analyze** movement velocity, smoothness and tempo
//! 5. **Synthesize** timestamped feedback
//!
//! The [`ComparisonEngine`] runs the whole pipeline and combines the scores:
//!
//! ```text
//! overall = 0.40·pose + 0.25·timing + 0.20·angle + 0.15·smoothness
//! ```
//!
//! The engine is synchronous and holds no mutable state, so comparisons can
//! run in parallel on shared references.

pub mod comparison;
pub mod dtw;
pub mod encoder;
pub mod feedback;
pub mod movement;
pub mod report;
pub mod similarity;

pub use comparison::*;
pub use dtw::*;
pub use encoder::*;
pub use feedback::*;
pub use movement::*;
pub use report::*;
pub use similarity::*;
