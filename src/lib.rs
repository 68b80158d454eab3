// lib.rs - FastFlix backend: catalog, comments, collections, live rooms,
// admin console and the natural-language search agent.
pub mod agent;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod llm_client;
pub mod middleware;
pub mod models;
pub mod services;

use axum::Router;

/// Shared state handed to every handler through `Extension<Arc<AppState>>`.
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
    /// Outbound client for the playlist and media proxies.
    pub http: reqwest::Client,
    /// `None` when no LLM key is configured.
    pub search_agent: Option<agent::SqlAgent>,
}

/// Every API route, without the global layers.
pub fn api_routes() -> Router {
    Router::new()
        .merge(handlers::auth::auth_routes())
        .merge(handlers::videos::video_routes())
        .merge(handlers::vod::vod_routes())
        .merge(handlers::comments::comment_routes())
        .merge(handlers::collection::collection_routes())
        .merge(handlers::live::live_routes())
        .merge(handlers::admin::admin_routes())
        .merge(handlers::ai_search::ai_search_routes())
}
