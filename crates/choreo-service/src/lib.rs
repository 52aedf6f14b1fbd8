//! # Choreo-Service
//!
//! Caller-side glue around the comparison engine.
//!
//! - Loads pose-sequence JSON files
//! - Enforces the maximum sequence length before alignment
//! - Runs the engine on a blocking thread, then the coach
//! - Persists reports behind the [`ReportStore`] interface
//!
//! Configuration comes from a file and `CHOREO_*` environment variables.

pub mod config;
pub mod error;
pub mod service;
pub mod store;

pub use crate::config::*;
pub use error::*;
pub use service::*;
pub use store::*;
