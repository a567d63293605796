//! services/api/src/adapters/http_feed.rs
//!
//! The adapter for the remote job feed. It implements the `JobFeedService`
//! port from the `core` crate over plain HTTP + JSON using `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use job_board_core::{JobFeedService, PortError, PortResult};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

/// Keys under which a feed may wrap its job list.
const LIST_KEYS: &[&str] = &["jobs", "results", "data"];

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `JobFeedService` port against an HTTP endpoint.
#[derive(Clone)]
pub struct HttpJobFeed {
    client: Client,
    feed_url: String,
    page_size: usize,
}

impl HttpJobFeed {
    /// Creates a new `HttpJobFeed` around an existing client.
    pub fn new(client: Client, feed_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            client,
            feed_url: feed_url.into(),
            page_size,
        }
    }

    /// Creates a new `HttpJobFeed` with its own client and request timeout.
    pub fn with_timeout(
        feed_url: impl Into<String>,
        page_size: usize,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, feed_url, page_size))
    }
}

//=========================================================================================
// `JobFeedService` Trait Implementation
//=========================================================================================

#[async_trait]
impl JobFeedService for HttpJobFeed {
    async fn fetch_page(&self, page: u32) -> PortResult<Vec<Value>> {
        debug!(page, url = %self.feed_url, "requesting job page");
        let resp = self
            .client
            .get(&self.feed_url)
            .query(&[("page", page.to_string()), ("limit", self.page_size.to_string())])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp.text().await.unwrap_or_default();
            error!(
                page,
                %status,
                error_body = %error_body,
                "job feed rejected the page request"
            );
            return Err(PortError::Unexpected(format!("job feed returned {}", status)));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("job feed sent invalid JSON: {}", e)))?;
        let jobs = extract_jobs(body)?;
        debug!(page, count = jobs.len(), "received job page");
        Ok(jobs)
    }
}

/// Pulls the job list out of a response body: either a bare array or an
/// object carrying the array under one of [`LIST_KEYS`].
pub fn extract_jobs(body: Value) -> PortResult<Vec<Value>> {
    match body {
        Value::Array(jobs) => Ok(jobs),
        Value::Object(mut object) => LIST_KEYS
            .iter()
            .find_map(|key| match object.shift_remove(*key) {
                Some(Value::Array(jobs)) => Some(jobs),
                _ => None,
            })
            .ok_or_else(|| PortError::Unexpected("job feed response has no job list".to_string())),
        other => Err(PortError::Unexpected(format!(
            "job feed response is not a list: {}",
            other
        ))),
    }
}
