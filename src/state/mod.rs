//! State module for tracking crawl progress
//!
//! This module provides the lifecycle state machine of a crawl pipeline.
//!
//! # Components
//!
//! - `PipelineState`: Tracks a run through idle, discovery, extraction, and its terminal outcome

mod pipeline_state;

// Re-export main types
pub use pipeline_state::PipelineState;
