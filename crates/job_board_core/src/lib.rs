pub mod bookmarks;
pub mod domain;
pub mod error;
pub mod feed;
pub mod identity;
pub mod ports;
pub mod theme;

#[cfg(test)]
pub(crate) mod test_support;

pub use bookmarks::BookmarkStore;
pub use domain::{BookmarkEntry, ColorScheme, JobRecord, Palette};
pub use error::{BookmarkError, FeedError};
pub use feed::{FeedController, FeedSession, FeedSnapshot, FeedView, FetchOutcome, LoadingPhase};
pub use identity::IdentityResolver;
pub use ports::{JobFeedService, KeyValueStore, PortError, PortResult, PreferenceService};
pub use theme::ThemeContext;
