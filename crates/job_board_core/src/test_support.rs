//! In-process fakes for the ports, shared by the unit tests of this crate.

use std::collections::{HashMap, VecDeque};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::domain::ColorScheme;
use crate::ports::{JobFeedService, KeyValueStore, PortError, PortResult, PreferenceService};

/// Raw records `{prefix}{n}` for every `n` in `range`.
pub(crate) fn jobs(prefix: &str, range: RangeInclusive<u32>) -> Vec<Value> {
    range
        .map(|n| json!({ "id": format!("{}{}", prefix, n), "title": format!("Job {}{}", prefix, n) }))
        .collect()
}

/// Serves queued responses per page; an empty page once a queue runs dry.
#[derive(Default)]
pub(crate) struct ScriptedFeed {
    responses: Mutex<HashMap<u32, VecDeque<PortResult<Vec<Value>>>>>,
    gates: Mutex<HashMap<u32, Arc<Notify>>>,
    calls: AtomicUsize,
}

impl ScriptedFeed {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, page: u32, response: PortResult<Vec<Value>>) {
        self.responses
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .push_back(response);
    }

    /// Holds the next fetch of `page` until the returned handle is notified.
    pub(crate) fn gate(&self, page: u32) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(page, gate.clone());
        gate
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobFeedService for ScriptedFeed {
    async fn fetch_page(&self, page: u32) -> PortResult<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(&page);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .get_mut(&page)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Insertion-ordered key/value medium with switchable failures.
#[derive(Default)]
pub(crate) struct MemoryKv {
    entries: Mutex<Vec<(String, Vec<u8>)>>,
    pub(crate) fail_reads: AtomicBool,
    pub(crate) fail_writes: AtomicBool,
}

impl MemoryKv {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_raw(&self, key: &str, value: Value) {
        let bytes = serde_json::to_vec(&value).unwrap();
        self.entries.lock().unwrap().push((key.to_string(), bytes));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn check(&self, flag: &AtomicBool) -> PortResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("medium offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> PortResult<Option<Vec<u8>>> {
        self.check(&self.fail_reads)?;
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> PortResult<()> {
        self.check(&self.fail_writes)?;
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key.to_string(), value)),
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.check(&self.fail_writes)?;
        self.entries.lock().unwrap().retain(|(k, _)| k != key);
        Ok(())
    }

    async fn get_all_under_prefix(&self, prefix: &str) -> PortResult<Vec<(String, Vec<u8>)>> {
        self.check(&self.fail_reads)?;
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct MemoryPreferences {
    pub(crate) stored: Mutex<Option<ColorScheme>>,
    pub(crate) system: Option<ColorScheme>,
    pub(crate) fail: AtomicBool,
}

#[async_trait]
impl PreferenceService for MemoryPreferences {
    async fn read_scheme(&self) -> PortResult<Option<ColorScheme>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("preferences offline".to_string()));
        }
        Ok(*self.stored.lock().unwrap())
    }

    async fn write_scheme(&self, scheme: ColorScheme) -> PortResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("preferences offline".to_string()));
        }
        *self.stored.lock().unwrap() = Some(scheme);
        Ok(())
    }

    async fn system_scheme(&self) -> PortResult<Option<ColorScheme>> {
        Ok(self.system)
    }
}
