pub mod file_store;
pub mod http_feed;
pub mod memory_store;
pub mod preferences;

pub use file_store::FileKeyValueStore;
pub use http_feed::HttpJobFeed;
pub use memory_store::InMemoryKeyValueStore;
pub use preferences::FilePreferenceStore;
