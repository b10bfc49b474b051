/// Pipeline state definitions for tracking a crawl run
///
/// A pipeline starts `Idle`, passes through `Discovering` and `Extracting`,
/// and ends in exactly one terminal state. Terminal states are final: a new
/// run requires a new pipeline.
use std::fmt;

/// Represents the current state of a crawl pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    // ===== Initial State =====
    /// Pipeline has been built but `run` has not been called
    Idle,

    // ===== Active States =====
    /// Search result pages are being fetched for item links
    Discovering,

    /// Item pages are being resolved and records written
    Extracting,

    // ===== Terminal States =====
    /// Run finished normally (possibly with zero records)
    Completed,

    /// Run stopped at the caller's request
    Cancelled,

    /// Run aborted on an unrecoverable error
    Failed,
}

impl PipelineState {
    /// Returns true if this is a terminal state (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Returns true if the pipeline is doing work
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Discovering | Self::Extracting)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// ```text
    /// Idle -> Discovering -> Extracting -> Completed
    ///              |              |-----> Cancelled
    ///              |              '-----> Failed
    ///              |-> Completed (no links found)
    ///              |-> Cancelled
    ///              '-> Failed
    /// ```
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        match self {
            Self::Idle => matches!(next, Self::Discovering),
            Self::Discovering => matches!(
                next,
                Self::Extracting | Self::Completed | Self::Cancelled | Self::Failed
            ),
            Self::Extracting => matches!(next, Self::Completed | Self::Cancelled | Self::Failed),
            Self::Completed | Self::Cancelled | Self::Failed => false,
        }
    }

    /// Short lowercase label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Extracting => "extracting",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
