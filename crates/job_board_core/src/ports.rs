//! crates/job_board_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the client core.
//! These traits form the boundary of the hexagonal architecture, so the feed
//! session, bookmark store and theme context never depend on a concrete
//! network client, key/value medium or preference store.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ColorScheme;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external collaborators (network, disk).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait JobFeedService: Send + Sync {
    /// Fetches one page of raw job records. Pages are 1-based and hold at most
    /// the feed's fixed page size; ordering inside a page is preserved.
    async fn fetch_page(&self, page: u32) -> PortResult<Vec<Value>>;
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;

    /// Returns every entry whose key starts with `prefix`, in the medium's own order.
    async fn get_all_under_prefix(&self, prefix: &str) -> PortResult<Vec<(String, Vec<u8>)>>;
}

#[async_trait]
pub trait PreferenceService: Send + Sync {
    /// The scheme the user picked last, if one was ever stored.
    async fn read_scheme(&self) -> PortResult<Option<ColorScheme>>;

    async fn write_scheme(&self, scheme: ColorScheme) -> PortResult<()>;

    /// The device-level default, used when nothing was stored.
    async fn system_scheme(&self) -> PortResult<Option<ColorScheme>>;
}
