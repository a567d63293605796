pub mod rest;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use rest::{
    bookmark_status_handler, job_detail_handler, list_bookmarks_handler, list_jobs_handler,
    load_more_handler, refresh_handler, remove_bookmark_handler, set_theme_handler,
    theme_handler, toggle_bookmark_handler, toggle_theme_handler,
};
use state::AppState;

/// Builds the API router. The UI shell may be served from any local origin.
pub fn router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    Router::new()
        .route("/jobs", get(list_jobs_handler))
        .route("/jobs/more", post(load_more_handler))
        .route("/jobs/refresh", post(refresh_handler))
        .route("/jobs/{identity}", get(job_detail_handler))
        .route("/bookmarks", get(list_bookmarks_handler))
        .route("/bookmarks/toggle", post(toggle_bookmark_handler))
        .route(
            "/bookmarks/{identity}",
            get(bookmark_status_handler).delete(remove_bookmark_handler),
        )
        .route("/theme", get(theme_handler).put(set_theme_handler))
        .route("/theme/toggle", post(toggle_theme_handler))
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKeyValueStore;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use job_board_core::{
        BookmarkStore, ColorScheme, FeedController, JobFeedService, PortError, PortResult,
        ThemeContext,
    };
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    /// Two pages of two jobs each, then nothing.
    #[derive(Default)]
    struct TwoPageFeed {
        offline: AtomicBool,
    }

    #[async_trait]
    impl JobFeedService for TwoPageFeed {
        async fn fetch_page(&self, page: u32) -> PortResult<Vec<Value>> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(PortError::Unavailable("offline".to_string()));
            }
            Ok(match page {
                1 => vec![
                    json!({ "id": "a", "title": "Plumber", "phone": "555-0101" }),
                    json!({ "_id": "b", "title": "Welder" }),
                ],
                2 => vec![json!({ "uniqueId": "c" }), json!({ "id": "d" })],
                _ => Vec::new(),
            })
        }
    }

    fn app(feed: Arc<TwoPageFeed>) -> Router {
        let state = AppState {
            feed: FeedController::new(feed, 2),
            bookmarks: Arc::new(BookmarkStore::new(Arc::new(InMemoryKeyValueStore::new()))),
            theme: ThemeContext::new(ColorScheme::Light),
        };
        router(Arc::new(state))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    #[tokio::test]
    async fn paging_through_the_feed() {
        let app = app(Arc::new(TwoPageFeed::default()));

        let (status, body) = call(&app, "POST", "/jobs/more", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"]["outcome"], "applied");
        assert_eq!(body["feed"]["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["feed"]["view"]["state"], "populated");

        call(&app, "POST", "/jobs/more", None).await;
        let (_, body) = call(&app, "POST", "/jobs/more", None).await;
        assert_eq!(body["feed"]["hasMore"], false);

        let (_, body) = call(&app, "GET", "/jobs", None).await;
        let ids: Vec<_> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn offline_feed_answers_service_unavailable() {
        let feed = Arc::new(TwoPageFeed::default());
        feed.offline.store(true, Ordering::SeqCst);
        let app = app(feed.clone());

        let (status, body) = call(&app, "POST", "/jobs/more", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.as_str().unwrap().starts_with("Failed to load jobs."));

        let (_, body) = call(&app, "GET", "/jobs", None).await;
        assert_eq!(body["view"]["state"], "initialError");

        feed.offline.store(false, Ordering::SeqCst);
        let (status, _) = call(&app, "POST", "/jobs/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn job_detail_and_bookmarking() {
        let app = app(Arc::new(TwoPageFeed::default()));
        call(&app, "POST", "/jobs/more", None).await;

        let (status, body) = call(&app, "GET", "/jobs/a", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contactLabel"], "Call: 555-0101");
        assert_eq!(body["bookmarked"], false);

        let (status, body) = call(&app, "POST", "/bookmarks/toggle", Some(json!({ "id": "a" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bookmarked"], true);

        let (_, body) = call(&app, "GET", "/bookmarks", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["items"][0]["title"], "Plumber");
        assert!(body["emptyMessage"].is_null());

        let (_, body) = call(&app, "GET", "/bookmarks/a", None).await;
        assert_eq!(body["bookmarked"], true);

        let (status, _) = call(&app, "DELETE", "/bookmarks/a", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, "GET", "/bookmarks", None).await;
        assert_eq!(body["emptyMessage"], "No bookmarked jobs yet.\nBookmark jobs to see them here!");
    }

    #[tokio::test]
    async fn unknown_or_anonymous_jobs_are_rejected() {
        let app = app(Arc::new(TwoPageFeed::default()));

        let (status, _) = call(&app, "GET", "/jobs/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, "POST", "/bookmarks/toggle", Some(json!({ "title": "?" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, "DELETE", "/bookmarks/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bookmarked_job_detail_is_served_when_not_loaded() {
        let app = app(Arc::new(TwoPageFeed::default()));
        let (status, body) = call(
            &app,
            "POST",
            "/bookmarks/toggle",
            Some(json!({ "id": "gone", "title": "Archived" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bookmarked"], true);

        let (status, body) = call(&app, "GET", "/jobs/gone", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["record"]["title"], "Archived");
        assert_eq!(body["bookmarked"], true);
    }

    #[tokio::test]
    async fn theme_toggle_and_set() {
        let app = app(Arc::new(TwoPageFeed::default()));

        let (_, body) = call(&app, "GET", "/theme", None).await;
        assert_eq!(body["scheme"], "light");
        assert_eq!(body["palette"]["primary"], "#007AFF");

        let (_, body) = call(&app, "POST", "/theme/toggle", None).await;
        assert_eq!(body["scheme"], "dark");
        assert_eq!(body["dark"], true);

        let (status, body) = call(&app, "PUT", "/theme", Some(json!({ "scheme": "light" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scheme"], "light");

        let (status, _) = call(&app, "PUT", "/theme", Some(json!({ "scheme": "sepia" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
