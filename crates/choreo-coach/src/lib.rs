//! # Choreo-Coach
//!
//! Natural-language coaching feedback for comparison reports.
//!
//! ## Flow
//!
//! ```text
//! ComparisonReport
//!     ↓
//! [prompts]  → dance-instructor prompt with scores + feedback points
//!     ↓
//! [CompletionBackend]  → OpenAI-compatible chat completion
//!     ↓
//! CoachFeedback (generated, or deterministic fallback on any failure)
//! ```

pub mod agent;
pub mod client;
pub mod coach;
pub mod prompts;

pub use agent::*;
pub use client::*;
pub use coach::*;
pub use prompts::*;
