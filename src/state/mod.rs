//! State module for tracking pipeline progress
//!
//! # Components
//!
//! - `Stage`: where one (domain, crawler) unit of work is in the pipeline
//! - `StageTracker`: validates stage transitions as the pipeline advances
//! - `HostState`: per-host request timing used by the rate limiter

mod host_state;
mod stage;

// Re-export main types
pub use host_state::HostState;
pub use stage::{Stage, StageTracker};
