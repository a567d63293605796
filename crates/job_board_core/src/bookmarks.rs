//! crates/job_board_core/src/bookmarks.rs
//!
//! The durable bookmark set. One key per bookmarked identity
//! (`bookmark:<identity>`) in a `KeyValueStore`; the value is a serialized
//! `BookmarkEntry`. The store keeps no cache of its own, so what it reports is
//! always what the medium has confirmed.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{parse_timestamp, BookmarkEntry, JobRecord};
use crate::error::BookmarkError;
use crate::identity::IdentityResolver;
use crate::ports::KeyValueStore;

pub const BOOKMARK_PREFIX: &str = "bookmark:";

pub fn bookmark_key(identity: &str) -> String {
    format!("{}{}", BOOKMARK_PREFIX, identity)
}

pub struct BookmarkStore {
    medium: Arc<dyn KeyValueStore>,
    /// Serializes mutations per identity; entries are dropped once uncontended.
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl BookmarkStore {
    pub fn new(medium: Arc<dyn KeyValueStore>) -> Self {
        Self {
            medium,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `identity` is bookmarked. An unavailable medium reads as "no".
    pub async fn is_bookmarked(&self, identity: &str) -> bool {
        match self.medium.get(&bookmark_key(identity)).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                warn!(%identity, error = %e, "bookmark lookup failed, reporting not bookmarked");
                false
            }
        }
    }

    /// Flips the bookmark state of `record` and returns the new state.
    ///
    /// Toggles of the same identity run one at a time; the returned state is
    /// only reported after the medium confirmed the write.
    pub async fn toggle(&self, record: &JobRecord) -> Result<bool, BookmarkError> {
        let identity = record.identity.as_str();
        self.with_identity_lock(identity, self.flip(record)).await
    }

    /// Removes the bookmark of `identity`; `Ok(false)` if there was none.
    pub async fn remove(&self, identity: &str) -> Result<bool, BookmarkError> {
        self.with_identity_lock(identity, self.take(identity)).await
    }

    pub async fn get(&self, identity: &str) -> Option<JobRecord> {
        let key = bookmark_key(identity);
        match self.medium.get(&key).await {
            Ok(Some(bytes)) => decode_entry(&key, &bytes).map(|(_, record)| record),
            Ok(None) => None,
            Err(e) => {
                warn!(%identity, error = %e, "bookmark read failed");
                None
            }
        }
    }

    /// Every bookmarked record, oldest bookmark first.
    ///
    /// Each record carries a resolved identity, and no identity appears twice.
    /// Entries that cannot be decoded are skipped; an unavailable medium
    /// yields an empty list.
    pub async fn list_all(&self) -> Vec<JobRecord> {
        let entries = match self.medium.get_all_under_prefix(BOOKMARK_PREFIX).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "listing bookmarks failed, showing none");
                return Vec::new();
            }
        };

        let mut decoded: Vec<(Option<DateTime<Utc>>, JobRecord)> = entries
            .iter()
            .filter_map(|(key, bytes)| decode_entry(key, bytes))
            .collect();
        // Stable: entries without a timestamp keep the medium's order.
        decoded.sort_by_key(|(bookmarked_at, _)| *bookmarked_at);

        let mut seen = HashSet::new();
        decoded
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| seen.insert(record.identity.clone()))
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.list_all().await.len()
    }

    async fn flip(&self, record: &JobRecord) -> Result<bool, BookmarkError> {
        let identity = record.identity.as_str();
        let key = bookmark_key(identity);
        if self.medium.get(&key).await?.is_some() {
            self.medium.remove(&key).await?;
            info!(%identity, "bookmark removed");
            return Ok(false);
        }
        let bytes = serde_json::to_vec(&BookmarkEntry::new(record.clone()))?;
        self.medium.set(&key, bytes).await?;
        info!(%identity, "bookmark added");
        Ok(true)
    }

    async fn take(&self, identity: &str) -> Result<bool, BookmarkError> {
        let key = bookmark_key(identity);
        if self.medium.get(&key).await?.is_none() {
            return Ok(false);
        }
        self.medium.remove(&key).await?;
        info!(%identity, "bookmark removed");
        Ok(true)
    }

    async fn with_identity_lock<T, F>(&self, identity: &str, work: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(identity.to_string()).or_default().clone()
        };
        let result = {
            let _guard = lock.lock().await;
            work.await
        };

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map and this call still hold it: nobody is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(identity);
        }
        result
    }
}

/// Decodes a stored value into its bookmark time and record.
///
/// Accepts the `BookmarkEntry` envelope as well as a bare record written by
/// older versions. The key the entry is stored under is its identity, so
/// listing, lookups and toggles agree; only a key without a usable suffix
/// falls back to the record's own fields.
fn decode_entry(key: &str, bytes: &[u8]) -> Option<(Option<DateTime<Utc>>, JobRecord)> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            warn!(%key, error = %e, "skipping undecodable bookmark");
            return None;
        }
    };

    let (raw, bookmarked_at) = match value {
        Value::Object(mut object) if object.get("record").is_some_and(Value::is_object) => {
            let bookmarked_at = object.get("bookmarkedAt").and_then(parse_timestamp);
            (object.shift_remove("record").unwrap_or(Value::Null), bookmarked_at)
        }
        other => (other, None),
    };
    if !raw.is_object() {
        warn!(%key, "skipping bookmark that is not a job record");
        return None;
    }

    let stored_under = key
        .strip_prefix(BOOKMARK_PREFIX)
        .filter(|identity| !identity.trim().is_empty());
    let identity = match (stored_under, IdentityResolver::declared(&raw)) {
        (Some(stored), Some(declared)) if declared != stored => {
            debug!(%key, %declared, "bookmark record declares a different identity than its key");
            stored.to_string()
        }
        (Some(stored), _) => stored.to_string(),
        (None, Some(declared)) => declared,
        (None, None) => IdentityResolver::resolve_stateless(&raw),
    };
    Some((bookmarked_at, JobRecord::from_raw(raw, identity)))
}
