//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use job_board_core::{BookmarkStore, FeedController, ThemeContext};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// There is a single feed session per process: every client of the bridge
/// sees the same list, the same bookmarks and the same color scheme.
#[derive(Clone)]
pub struct AppState {
    pub feed: FeedController,
    pub bookmarks: Arc<BookmarkStore>,
    pub theme: ThemeContext,
}
