use crate::error::{api_error, bad_request, db_error, not_found, ApiError, ApiResult};
use crate::models::response::{ApiResponse, Paging};
use crate::models::vod::*;
use crate::services::{catalog, display_time, m3u8};
use crate::AppState;
use axum::{
    body::Body,
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::io::ReaderStream;

const PAGE_SIZE: i64 = 12;
const DEFAULT_IMAGE: &str = "default.jpg";

const UPSTREAM_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const UPSTREAM_REFERER: &str = "https://example.com/";

pub fn vod_routes() -> Router {
    Router::new()
        .route("/vod/vod_list", get(vod_list))
        .route("/vod/vod_detail", get(vod_detail))
        .route("/vod/proxy/m3u8", get(proxy_m3u8))
        .route("/vod/proxy/file", get(proxy_file))
        .route("/vod/imgs/:img_name", get(get_image))
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Only http and https URLs can be proxied")]
    UnsupportedScheme,
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("Upstream returned {0}")]
    UpstreamStatus(u16),
    #[error("Invalid playlist: {0}")]
    Playlist(String),
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::UnsupportedScheme => bad_request(err.to_string()),
            _ => {
                tracing::warn!("Proxy error: {}", err);
                api_error(StatusCode::BAD_GATEWAY, err.to_string())
            }
        }
    }
}

async fn vod_list(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<VodListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<VodItem>>>> {
    let paging = Paging::new(params.page, Some(PAGE_SIZE), PAGE_SIZE, PAGE_SIZE);
    let movtype = params.movtype.unwrap_or(0);
    let keyword = params
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let type_ids: Option<Vec<i32>> = match movtype {
        0 => None,
        other => catalog::type_ids_for_movtype(other).map(<[i32]>::to_vec),
    };

    let items = sqlx::query_as::<_, VodItem>(
        "SELECT id AS vod_id, vod_pic, vod_name, vod_remarks FROM vod_details \
         WHERE ($1::int[] IS NULL OR type_id = ANY($1)) \
           AND ($2::text IS NULL OR vod_name ILIKE '%' || $2 || '%') \
         ORDER BY vod_time DESC NULLS LAST, id DESC \
         OFFSET $3 LIMIT $4",
    )
    .bind(type_ids)
    .bind(keyword)
    .bind(paging.offset())
    .bind(paging.per_page)
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    tracing::debug!("vod_list movtype={} page={} -> {} items", movtype, paging.page, items.len());

    Ok(Json(ApiResponse::ok("success", items)))
}

async fn vod_detail(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<VodDetailQuery>,
) -> ApiResult<Json<VodDetailResponse>> {
    let vod = sqlx::query_as::<_, VodDetail>(
        "SELECT id, vod_name, vod_pic, vod_remarks, type_id, type_name, vod_content, vod_play_url, vod_time \
         FROM vod_details WHERE id = $1",
    )
    .bind(params.vod_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(db_error)?
    .ok_or_else(|| not_found("Video not found"))?;

    let data = VodDetailData {
        id: vod.id,
        vod_name: vod.vod_name.unwrap_or_default(),
        vod_pic: vod.vod_pic.unwrap_or_default(),
        vod_remarks: vod.vod_remarks.unwrap_or_default(),
        type_id: vod.type_id.unwrap_or(0),
        type_name: vod.type_name.unwrap_or_default(),
        vod_content: catalog::strip_markup(vod.vod_content.as_deref().unwrap_or("")),
        vod_play_url: catalog::parse_play_urls(vod.vod_play_url.as_deref().unwrap_or("")),
        vod_time: vod
            .vod_time
            .as_ref()
            .map(|t| display_time::format_local(t, display_time::DATETIME)),
    };

    Ok(Json(VodDetailResponse {
        code: 200,
        data,
        msg: "success".to_string(),
    }))
}

fn upstream_url(raw: &str) -> Result<reqwest::Url, ProxyError> {
    let url = reqwest::Url::parse(raw.trim()).map_err(|_| ProxyError::UnsupportedScheme)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ProxyError::UnsupportedScheme),
    }
}

async fn fetch_upstream(
    state: &AppState,
    url: reqwest::Url,
    timeout: Duration,
) -> Result<reqwest::Response, ProxyError> {
    let response = state
        .http
        .get(url)
        .header(header::USER_AGENT, UPSTREAM_USER_AGENT)
        .header(header::REFERER, UPSTREAM_REFERER)
        .timeout(timeout)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ProxyError::UpstreamStatus(response.status().as_u16()));
    }
    Ok(response)
}

async fn proxy_m3u8(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ProxyQuery>,
) -> Result<Response, ApiError> {
    let url = upstream_url(&params.url)?;
    tracing::info!("Proxying playlist {}", url);

    let playlist_url = url.to_string();
    let content = fetch_upstream(&state, url, Duration::from_secs(10))
        .await?
        .text()
        .await
        .map_err(ProxyError::from)?;

    let rewritten = m3u8::rewrite_playlist(&content, &playlist_url).map_err(ProxyError::Playlist)?;

    Ok(([(header::CONTENT_TYPE, m3u8::PLAYLIST_CONTENT_TYPE)], rewritten).into_response())
}

async fn proxy_file(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ProxyQuery>,
) -> Result<Response, ApiError> {
    let url = upstream_url(&params.url)?;
    let content_type = m3u8::content_type_for(url.as_str());
    tracing::debug!("Proxying file {} as {}", url, content_type);

    let upstream = fetch_upstream(&state, url, Duration::from_secs(30)).await?;
    let body = Body::from_stream(upstream.bytes_stream());

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

/// Plain file names only: no separators, no parent references.
fn is_safe_image_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

fn image_content_type(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

async fn get_image(
    Extension(state): Extension<Arc<AppState>>,
    Path(img_name): Path<String>,
) -> Result<Response, ApiError> {
    if !is_safe_image_name(&img_name) {
        return Err(bad_request("Invalid image name"));
    }

    let dir = PathBuf::from(&state.config.static_dir).join("imgs");
    let requested = dir.join(&img_name);
    let path = if tokio::fs::metadata(&requested).await.map(|m| m.is_file()).unwrap_or(false) {
        requested
    } else {
        tracing::debug!("Image {} not found, serving default", img_name);
        dir.join(DEFAULT_IMAGE)
    };

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        tracing::warn!("Failed to open image {}: {}", path.display(), e);
        not_found("Image not found")
    })?;

    let body = Body::from_stream(ReaderStream::new(file));
    Ok(([(header::CONTENT_TYPE, image_content_type(&path))], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_names() {
        assert!(is_safe_image_name("poster-1.jpg"));
        assert!(!is_safe_image_name("../secrets.env"));
        assert!(!is_safe_image_name("a/b.jpg"));
        assert!(!is_safe_image_name("a\\b.jpg"));
        assert!(!is_safe_image_name(""));
    }

    #[test]
    fn test_only_http_urls_are_proxied() {
        assert!(upstream_url("https://cdn.example.com/a.ts").is_ok());
        assert!(matches!(upstream_url("file:///etc/passwd"), Err(ProxyError::UnsupportedScheme)));
        assert!(matches!(upstream_url("not a url"), Err(ProxyError::UnsupportedScheme)));
    }

    #[test]
    fn test_proxy_errors_map_to_statuses() {
        let (status, _) = ApiError::from(ProxyError::UnsupportedScheme);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = ApiError::from(ProxyError::UpstreamStatus(404));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type(std::path::Path::new("x/a.PNG")), "image/png");
        assert_eq!(image_content_type(std::path::Path::new("x/default.jpg")), "image/jpeg");
    }
}
