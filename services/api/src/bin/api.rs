//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FileKeyValueStore, FilePreferenceStore, HttpJobFeed, InMemoryKeyValueStore},
    config::{Config, StorageKind},
    error::ApiError,
    web::{rest::ApiDoc, router, state::AppState},
};
use axum::Router;
use job_board_core::{BookmarkStore, FeedController, KeyValueStore, ThemeContext};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const BOOKMARKS_FILE: &str = "bookmarks.json";

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let feed_adapter = Arc::new(HttpJobFeed::with_timeout(
        config.feed_url.clone(),
        config.page_size,
        config.feed_timeout,
    )?);

    let medium: Arc<dyn KeyValueStore> = match config.storage {
        StorageKind::File => {
            let path = config.data_dir.join(BOOKMARKS_FILE);
            Arc::new(FileKeyValueStore::open(path).await?)
        }
        StorageKind::Memory => {
            warn!("Bookmarks are kept in memory and will be lost on exit.");
            Arc::new(InMemoryKeyValueStore::new())
        }
    };

    let preferences = Arc::new(FilePreferenceStore::new(
        config.data_dir.clone(),
        config.system_color_scheme,
    ));

    // --- 3. Build the Client Core & Shared AppState ---
    let theme = ThemeContext::load(preferences).await;
    let bookmarks = Arc::new(BookmarkStore::new(medium));
    let feed = FeedController::new(feed_adapter, config.page_size);

    let app_state = Arc::new(AppState {
        feed: feed.clone(),
        bookmarks,
        theme,
    });

    // The first page is requested right away, as the list screen would on mount.
    tokio::spawn(async move {
        if let Err(e) = feed.load_more().await {
            warn!(error = %e, "initial job page could not be loaded");
        }
    });

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
