//! crates/job_board_core/src/error.rs
//!
//! Errors surfaced by the mutating operations of the core. Query operations
//! never return these; they degrade to safe defaults instead.

use crate::ports::PortError;

/// A failed page fetch. Recoverable by retrying; loaded items are never lost.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("Failed to load jobs. Please check your internet connection and try again. ({0})")]
    TransientFetch(#[source] PortError),
}

impl FeedError {
    /// The message shown next to the retry affordance.
    pub fn user_message(&self) -> &'static str {
        match self {
            FeedError::TransientFetch(_) => {
                "Failed to load jobs. Please check your internet connection and try again."
            }
        }
    }
}

/// A bookmark mutation that could not be confirmed by the persistent medium.
#[derive(Debug, thiserror::Error)]
pub enum BookmarkError {
    #[error("Bookmark storage failed: {0}")]
    Persistence(#[from] PortError),

    #[error("Bookmark could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}
