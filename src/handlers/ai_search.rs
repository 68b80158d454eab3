use crate::error::{api_error, bad_request, ApiResult};
use crate::models::search::{SearchRequest, SearchResponse};
use crate::AppState;
use axum::{extract::Extension, http::StatusCode, routing::post, Json, Router};
use std::sync::Arc;

pub fn ai_search_routes() -> Router {
    Router::new().route("/ai-search/search", post(search))
}

/// Answers a natural-language question about the catalog with rows fetched
/// through a generated, guarded SELECT.
async fn search(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(bad_request("question is required"));
    }

    let agent = state.search_agent.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "AI search is not configured",
        )
    })?;

    tracing::info!("AI search: {}", question);
    let response = agent.search(question).await;

    if response.success {
        tracing::info!(
            rows = response.data.len(),
            corrected = response.sql_v2.is_some(),
            "AI search answered"
        );
    } else {
        tracing::warn!(
            error = response.error.as_deref().unwrap_or(""),
            "AI search failed"
        );
    }

    Ok(Json(response))
}
