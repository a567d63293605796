//! crates/job_board_core/src/feed.rs
//!
//! The paginated job feed: a synchronous state machine (`FeedSession`) that
//! owns the cursor, the loading phase and the merged list, and an async
//! driver (`FeedController`) that runs page fetches against a
//! `JobFeedService` without holding the session lock across the network call.
//!
//! Every request carries the session generation it was issued under. A
//! refresh bumps the generation, so a page that was still in flight when the
//! refresh started is discarded on arrival instead of being merged.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::domain::JobRecord;
use crate::error::FeedError;
use crate::identity::IdentityResolver;
use crate::ports::{JobFeedService, PortResult};

/// Page size the feed serves; a shorter page means the feed is exhausted.
pub const DEFAULT_PAGE_SIZE: usize = 10;

//=========================================================================================
// State Types
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadingPhase {
    Idle,
    Loading,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// `load_more`: merge behind the existing items.
    Append,
    /// `refresh`: replace the items wholesale.
    Replace,
}

/// A page fetch issued by the session. Hand it back to [`FeedSession::complete`]
/// together with the fetch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub kind: FetchKind,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum FetchOutcome {
    /// The guard refused the request (already busy, or nothing left to load).
    Skipped,
    Applied { added: usize, total: usize },
    /// The response belonged to a request superseded by a refresh.
    Stale,
}

/// Observable state, published after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub items: Vec<JobRecord>,
    pub page: u32,
    pub has_more: bool,
    pub phase: LoadingPhase,
    pub last_error: Option<String>,
}

/// What the list screen should show for the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FeedView {
    /// Nothing loaded yet and a fetch is running: full-screen spinner.
    InitialLoading,
    /// Nothing loaded and the last fetch failed: message plus retry.
    InitialError { message: String },
    Empty { message: String },
    #[serde(rename_all = "camelCase")]
    Populated {
        loading_footer: bool,
        refreshing: bool,
        error: Option<String>,
    },
}

//=========================================================================================
// FeedSession
//=========================================================================================

#[derive(Debug)]
pub struct FeedSession {
    page_size: usize,
    page: u32,
    items: Vec<JobRecord>,
    index: HashSet<String>,
    has_more: bool,
    phase: LoadingPhase,
    last_error: Option<FeedError>,
    resolver: IdentityResolver,
    generation: u64,
    /// Cursor state from before the running refresh, restored if it fails.
    before_refresh: Option<(u32, bool)>,
}

impl Default for FeedSession {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FeedSession {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
            items: Vec::new(),
            index: HashSet::new(),
            has_more: true,
            phase: LoadingPhase::Idle,
            last_error: None,
            resolver: IdentityResolver::new(),
            generation: 0,
            before_refresh: None,
        }
    }

    pub fn items(&self) -> &[JobRecord] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn phase(&self) -> LoadingPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&FeedError> {
        self.last_error.as_ref()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.index.contains(identity)
    }

    pub fn record(&self, identity: &str) -> Option<&JobRecord> {
        if !self.contains(identity) {
            return None;
        }
        self.items.iter().find(|record| record.identity == identity)
    }

    /// Starts fetching the next page. Returns `None` while another fetch is
    /// running or once the feed is exhausted.
    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if self.phase != LoadingPhase::Idle || !self.has_more {
            debug!(phase = ?self.phase, has_more = self.has_more, "load_more ignored");
            return None;
        }
        self.phase = LoadingPhase::Loading;
        self.last_error = None;
        Some(PageRequest {
            page: self.page,
            kind: FetchKind::Append,
            generation: self.generation,
        })
    }

    /// Starts a pull-to-refresh. Always allowed; supersedes any running fetch.
    pub fn begin_refresh(&mut self) -> PageRequest {
        self.generation += 1;
        if self.before_refresh.is_none() {
            self.before_refresh = Some((self.page, self.has_more));
        }
        self.has_more = true;
        self.page = 1;
        self.phase = LoadingPhase::Refreshing;
        self.last_error = None;
        PageRequest {
            page: 1,
            kind: FetchKind::Replace,
            generation: self.generation,
        }
    }

    /// Applies the result of `request`.
    ///
    /// On failure the items are left untouched and the error is both recorded
    /// in `last_error` and returned.
    pub fn complete(
        &mut self,
        request: &PageRequest,
        result: PortResult<Vec<Value>>,
    ) -> Result<FetchOutcome, FeedError> {
        let expected_phase = match request.kind {
            FetchKind::Append => LoadingPhase::Loading,
            FetchKind::Replace => LoadingPhase::Refreshing,
        };
        if request.generation != self.generation || self.phase != expected_phase {
            debug!(
                page = request.page,
                kind = ?request.kind,
                "discarding response of a superseded request"
            );
            return Ok(FetchOutcome::Stale);
        }

        let before_refresh = self.before_refresh.take();
        self.phase = LoadingPhase::Idle;

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                if let Some((page, has_more)) = before_refresh {
                    self.page = page;
                    self.has_more = has_more;
                }
                let error = FeedError::TransientFetch(e);
                warn!(page = request.page, error = %error, "job page fetch failed");
                self.last_error = Some(error.clone());
                return Err(error);
            }
        };

        let received = raw.len();
        if request.kind == FetchKind::Replace && received == 0 {
            // An empty first page ends the feed but keeps what is on screen.
            if let Some((page, _)) = before_refresh {
                self.page = page;
            }
            self.has_more = false;
            self.last_error = None;
            info!(total = self.items.len(), "refresh returned no jobs, keeping the current list");
            return Ok(FetchOutcome::Applied {
                added: 0,
                total: self.items.len(),
            });
        }
        if request.kind == FetchKind::Replace {
            self.resolver.clear_history();
            self.index.clear();
            self.items.clear();
        }
        let mut added = 0;
        for value in raw {
            let record = self.resolver.attach(value);
            if self.index.insert(record.identity.clone()) {
                self.items.push(record);
                added += 1;
            }
        }

        self.has_more = received >= self.page_size;
        if received > 0 {
            self.page = request.page + 1;
        }
        self.last_error = None;

        info!(
            page = request.page,
            received,
            added,
            dropped = received - added,
            total = self.items.len(),
            has_more = self.has_more,
            "applied job page"
        );
        Ok(FetchOutcome::Applied {
            added,
            total: self.items.len(),
        })
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            page: self.page,
            has_more: self.has_more,
            phase: self.phase,
            last_error: self.last_error.as_ref().map(|e| e.user_message().to_string()),
        }
    }

    pub fn view(&self) -> FeedView {
        let error = self.last_error.as_ref().map(|e| e.user_message().to_string());
        if self.items.is_empty() {
            return match (self.phase, error) {
                (LoadingPhase::Idle, Some(message)) => FeedView::InitialError { message },
                (LoadingPhase::Idle, None) => FeedView::Empty {
                    message: "No jobs available".to_string(),
                },
                _ => FeedView::InitialLoading,
            };
        }
        FeedView::Populated {
            loading_footer: self.phase == LoadingPhase::Loading,
            refreshing: self.phase == LoadingPhase::Refreshing,
            error,
        }
    }
}

//=========================================================================================
// FeedController
//=========================================================================================

/// Drives one [`FeedSession`] against a [`JobFeedService`]. Clones share the session.
#[derive(Clone)]
pub struct FeedController {
    session: Arc<Mutex<FeedSession>>,
    feed: Arc<dyn JobFeedService>,
    updates: Arc<watch::Sender<FeedSnapshot>>,
}

impl FeedController {
    pub fn new(feed: Arc<dyn JobFeedService>, page_size: usize) -> Self {
        let session = FeedSession::new(page_size);
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            session: Arc::new(Mutex::new(session)),
            feed,
            updates: Arc::new(updates),
        }
    }

    /// Fetches the next page and merges it. A no-op while busy or exhausted.
    pub async fn load_more(&self) -> Result<FetchOutcome, FeedError> {
        let request = {
            let mut session = self.session.lock().await;
            match session.begin_load_more() {
                Some(request) => {
                    self.publish(&session);
                    request
                }
                None => return Ok(FetchOutcome::Skipped),
            }
        };
        self.run(request).await
    }

    /// Refetches page 1 and replaces the list once it arrives.
    pub async fn refresh(&self) -> Result<FetchOutcome, FeedError> {
        let request = {
            let mut session = self.session.lock().await;
            let request = session.begin_refresh();
            self.publish(&session);
            request
        };
        self.run(request).await
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn view(&self) -> FeedView {
        self.session.lock().await.view()
    }

    /// Snapshot and view taken under one lock, so they always agree.
    pub async fn current(&self) -> (FeedSnapshot, FeedView) {
        let session = self.session.lock().await;
        (session.snapshot(), session.view())
    }

    pub async fn record(&self, identity: &str) -> Option<JobRecord> {
        self.session.lock().await.record(identity).cloned()
    }

    async fn run(&self, request: PageRequest) -> Result<FetchOutcome, FeedError> {
        debug!(page = request.page, kind = ?request.kind, "fetching job page");
        let result = self.feed.fetch_page(request.page).await;

        let mut session = self.session.lock().await;
        let outcome = session.complete(&request, result);
        if !matches!(outcome, Ok(FetchOutcome::Stale)) {
            self.publish(&session);
        }
        outcome
    }

    fn publish(&self, session: &FeedSession) {
        self.updates.send_replace(session.snapshot());
    }
}
