//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use job_board_core::{
    ColorScheme, FeedSnapshot, FeedView, FetchOutcome, IdentityResolver, JobRecord, LoadingPhase,
    Palette, ThemeContext,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

pub const EMPTY_BOOKMARKS_MESSAGE: &str = "No bookmarked jobs yet.\nBookmark jobs to see them here!";
const BOOKMARK_FAILED_MESSAGE: &str = "Could not update the bookmark. Please try again.";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_jobs_handler,
        load_more_handler,
        refresh_handler,
        job_detail_handler,
        list_bookmarks_handler,
        bookmark_status_handler,
        remove_bookmark_handler,
        toggle_bookmark_handler,
        theme_handler,
        set_theme_handler,
        toggle_theme_handler,
    ),
    components(
        schemas(
            FeedResponse,
            FetchResponse,
            JobDetailResponse,
            InfoEntry,
            BookmarksResponse,
            BookmarkStatusResponse,
            ThemeResponse,
            SetThemeRequest,
        )
    ),
    tags(
        (name = "Job Board API", description = "Local bridge between a UI shell and the job board client core.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The feed as the list screen needs it: the records plus what to render.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    #[schema(value_type = Object)]
    view: FeedView,
    #[schema(value_type = Vec<Object>)]
    items: Vec<JobRecord>,
    page: u32,
    has_more: bool,
    #[schema(value_type = String)]
    phase: LoadingPhase,
    error: Option<String>,
}

impl FeedResponse {
    fn new(snapshot: FeedSnapshot, view: FeedView) -> Self {
        Self {
            view,
            items: snapshot.items,
            page: snapshot.page,
            has_more: snapshot.has_more,
            phase: snapshot.phase,
            error: snapshot.last_error,
        }
    }
}

/// What a fetch did, and the feed afterwards.
#[derive(Serialize, ToSchema)]
pub struct FetchResponse {
    #[schema(value_type = Object)]
    outcome: FetchOutcome,
    feed: FeedResponse,
}

#[derive(Serialize, ToSchema)]
pub struct InfoEntry {
    name: String,
    value: String,
}

/// A single posting with everything the detail screen derives from it.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobDetailResponse {
    #[schema(value_type = Object)]
    record: JobRecord,
    bookmarked: bool,
    premium: bool,
    views: u64,
    applications: u64,
    total_shares: u64,
    cover_image: Option<String>,
    call_window: Option<String>,
    contact_label: Option<String>,
    whatsapp_link: Option<String>,
    info: Vec<InfoEntry>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarksResponse {
    #[schema(value_type = Vec<Object>)]
    items: Vec<JobRecord>,
    count: usize,
    /// Set only when there is nothing to show.
    empty_message: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BookmarkStatusResponse {
    identity: String,
    bookmarked: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ThemeResponse {
    scheme: String,
    dark: bool,
    #[schema(value_type = Object)]
    palette: Palette,
}

impl ThemeResponse {
    fn from_context(theme: &ThemeContext) -> Self {
        let scheme = theme.scheme();
        Self {
            scheme: scheme.as_str().to_string(),
            dark: scheme == ColorScheme::Dark,
            palette: Palette::for_scheme(scheme),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SetThemeRequest {
    /// `light` or `dark`.
    scheme: String,
}

//=========================================================================================
// Feed Handlers
//=========================================================================================

/// The current feed state.
#[utoipa::path(
    get,
    path = "/jobs",
    responses(
        (status = 200, description = "Current feed snapshot and view", body = FeedResponse)
    )
)]
pub async fn list_jobs_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let (snapshot, view) = app_state.feed.current().await;
    Json(FeedResponse::new(snapshot, view))
}

/// Fetch and append the next page. A no-op while another fetch runs or the feed is exhausted.
#[utoipa::path(
    post,
    path = "/jobs/more",
    responses(
        (status = 200, description = "Page fetched, skipped or discarded", body = FetchResponse),
        (status = 503, description = "The feed could not be reached; loaded jobs are kept")
    )
)]
pub async fn load_more_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let outcome = app_state.feed.load_more().await;
    fetch_response(&app_state, outcome).await
}

/// Refetch the first page and replace the list with it.
#[utoipa::path(
    post,
    path = "/jobs/refresh",
    responses(
        (status = 200, description = "Feed replaced, or the response was superseded", body = FetchResponse),
        (status = 503, description = "The feed could not be reached; the previous list is kept")
    )
)]
pub async fn refresh_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let outcome = app_state.feed.refresh().await;
    fetch_response(&app_state, outcome).await
}

async fn fetch_response(
    app_state: &AppState,
    outcome: Result<FetchOutcome, job_board_core::FeedError>,
) -> Result<Json<FetchResponse>, (StatusCode, String)> {
    match outcome {
        Ok(outcome) => {
            let (snapshot, view) = app_state.feed.current().await;
            Ok(Json(FetchResponse {
                outcome,
                feed: FeedResponse::new(snapshot, view),
            }))
        }
        Err(e) => {
            warn!(error = %e, "job page fetch failed");
            Err((StatusCode::SERVICE_UNAVAILABLE, e.user_message().to_string()))
        }
    }
}

/// One posting from the loaded feed, or from the bookmarks if it is no longer loaded.
#[utoipa::path(
    get,
    path = "/jobs/{identity}",
    responses(
        (status = 200, description = "The posting and its derived details", body = JobDetailResponse),
        (status = 404, description = "Neither loaded nor bookmarked")
    ),
    params(
        ("identity" = String, Path, description = "The identity assigned to the posting.")
    )
)]
pub async fn job_detail_handler(
    State(app_state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record = find_record(&app_state, &identity)
        .await
        .ok_or_else(|| not_found(&identity))?;
    let bookmarked = app_state.bookmarks.is_bookmarked(&identity).await;
    Ok(Json(job_detail(record, bookmarked)))
}

fn job_detail(record: JobRecord, bookmarked: bool) -> JobDetailResponse {
    let info = record
        .additional_info
        .as_ref()
        .map(|info| info.info_entries())
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| InfoEntry { name, value })
        .collect();
    JobDetailResponse {
        bookmarked,
        premium: record.is_premium(),
        views: record.views(),
        applications: record.applications(),
        total_shares: record.total_shares(),
        cover_image: record.cover_image().map(|image| image.url.clone()),
        call_window: record.call_window(),
        contact_label: record.contact_label(),
        whatsapp_link: record.whatsapp_link().map(str::to_string),
        info,
        record,
    }
}

//=========================================================================================
// Bookmark Handlers
//=========================================================================================

/// Every bookmarked posting, oldest bookmark first.
#[utoipa::path(
    get,
    path = "/bookmarks",
    responses(
        (status = 200, description = "Bookmarked postings", body = BookmarksResponse)
    )
)]
pub async fn list_bookmarks_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let items = app_state.bookmarks.list_all().await;
    let empty_message = items
        .is_empty()
        .then(|| EMPTY_BOOKMARKS_MESSAGE.to_string());
    Json(BookmarksResponse {
        count: items.len(),
        items,
        empty_message,
    })
}

/// Whether a posting is bookmarked.
#[utoipa::path(
    get,
    path = "/bookmarks/{identity}",
    responses(
        (status = 200, description = "Bookmark state", body = BookmarkStatusResponse)
    ),
    params(
        ("identity" = String, Path, description = "The identity assigned to the posting.")
    )
)]
pub async fn bookmark_status_handler(
    State(app_state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> impl IntoResponse {
    let bookmarked = app_state.bookmarks.is_bookmarked(&identity).await;
    Json(BookmarkStatusResponse {
        identity,
        bookmarked,
    })
}

/// Remove a bookmark.
#[utoipa::path(
    delete,
    path = "/bookmarks/{identity}",
    responses(
        (status = 200, description = "Bookmark removed", body = BookmarkStatusResponse),
        (status = 404, description = "Not bookmarked"),
        (status = 503, description = "The removal could not be stored")
    ),
    params(
        ("identity" = String, Path, description = "The identity assigned to the posting.")
    )
)]
pub async fn remove_bookmark_handler(
    State(app_state): State<Arc<AppState>>,
    Path(identity): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match app_state.bookmarks.remove(&identity).await {
        Ok(true) => Ok(Json(BookmarkStatusResponse {
            identity,
            bookmarked: false,
        })),
        Ok(false) => Err(not_found(&identity)),
        Err(e) => {
            error!(%identity, error = %e, "failed to remove bookmark");
            Err((StatusCode::SERVICE_UNAVAILABLE, BOOKMARK_FAILED_MESSAGE.to_string()))
        }
    }
}

/// Flip the bookmark state of a posting.
///
/// The body is the job as the client holds it. Its declared identity picks the
/// loaded or bookmarked copy when there is one; otherwise the body itself is stored.
#[utoipa::path(
    post,
    path = "/bookmarks/toggle",
    request_body(content = Object, description = "The raw job record."),
    responses(
        (status = 200, description = "New bookmark state", body = BookmarkStatusResponse),
        (status = 400, description = "The record declares no identity"),
        (status = 503, description = "The change could not be stored; the state is unchanged")
    )
)]
pub async fn toggle_bookmark_handler(
    State(app_state): State<Arc<AppState>>,
    Json(raw): Json<Value>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let identity = IdentityResolver::declared(&raw).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "The job record has no id, _id or uniqueId".to_string(),
        )
    })?;
    let record = match find_record(&app_state, &identity).await {
        Some(record) => record,
        None => JobRecord::from_raw(raw, identity.clone()),
    };

    match app_state.bookmarks.toggle(&record).await {
        Ok(bookmarked) => Ok(Json(BookmarkStatusResponse {
            identity,
            bookmarked,
        })),
        Err(e) => {
            error!(%identity, error = %e, "failed to toggle bookmark");
            Err((StatusCode::SERVICE_UNAVAILABLE, BOOKMARK_FAILED_MESSAGE.to_string()))
        }
    }
}

//=========================================================================================
// Theme Handlers
//=========================================================================================

/// The active color scheme and its palette.
#[utoipa::path(
    get,
    path = "/theme",
    responses(
        (status = 200, description = "Active scheme", body = ThemeResponse)
    )
)]
pub async fn theme_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ThemeResponse::from_context(&app_state.theme))
}

/// Select a color scheme explicitly.
#[utoipa::path(
    put,
    path = "/theme",
    request_body = SetThemeRequest,
    responses(
        (status = 200, description = "Active scheme", body = ThemeResponse),
        (status = 400, description = "Unknown scheme")
    )
)]
pub async fn set_theme_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SetThemeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let scheme = payload
        .scheme
        .parse::<ColorScheme>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    app_state.theme.set(scheme).await;
    Ok(Json(ThemeResponse::from_context(&app_state.theme)))
}

/// Switch between light and dark.
#[utoipa::path(
    post,
    path = "/theme/toggle",
    responses(
        (status = 200, description = "The scheme after the switch", body = ThemeResponse)
    )
)]
pub async fn toggle_theme_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    app_state.theme.toggle().await;
    Json(ThemeResponse::from_context(&app_state.theme))
}

//=========================================================================================
// Helpers
//=========================================================================================

async fn find_record(app_state: &AppState, identity: &str) -> Option<JobRecord> {
    match app_state.feed.record(identity).await {
        Some(record) => Some(record),
        None => app_state.bookmarks.get(identity).await,
    }
}

fn not_found(identity: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("No job with identity '{}'", identity))
}
