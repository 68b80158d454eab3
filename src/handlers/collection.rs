use crate::error::{bad_request, db_error, ApiResult};
use crate::middleware::auth::auth_middleware;
use crate::models::auth::User;
use crate::models::collection::*;
use crate::models::response::{ApiResponse, Paging};
use crate::services::collection_list;
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn collection_routes() -> Router {
    Router::new()
        .route("/collection/show", get(show_collection))
        .route("/collection/is_collection", get(is_collection))
        .route("/collection/add", post(add_collection))
        .route("/collection/remove", delete(remove_collection))
        .route_layer(axum::middleware::from_fn(auth_middleware))
}

async fn load_collection(state: &AppState, user_id: i32) -> ApiResult<Option<UserCollection>> {
    sqlx::query_as::<_, UserCollection>(
        "SELECT id, user_id, movdetail_id_list FROM user_collections WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(db_error)
}

async fn show_collection(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<CollectionShowQuery>,
) -> ApiResult<Json<ApiResponse<CollectionData>>> {
    let paging = Paging::new(params.page, params.per_page, 12, 100);

    let ids = load_collection(&state, user.id)
        .await?
        .map(|c| collection_list::parse_ids(&c.movdetail_id_list))
        .unwrap_or_default();

    let (page_ids, has_more) = collection_list::page(&ids, paging.page, paging.per_page);

    let mut found = sqlx::query_as::<_, CollectionItem>(
        "SELECT id AS vod_id, vod_pic, vod_name, vod_remarks, type_name FROM vod_details WHERE id = ANY($1)",
    )
    .bind(page_ids.to_vec())
    .fetch_all(&state.pool)
    .await
    .map_err(db_error)?;

    // Keep the order the user saved them in
    found.sort_by_key(|item| page_ids.iter().position(|id| *id == item.vod_id));

    Ok(Json(ApiResponse::ok(
        "Collected videos",
        CollectionData {
            collections: found,
            pagination: CollectionPagination {
                current_page: paging.page,
                per_page: paging.per_page,
                total: ids.len() as i64,
                has_more,
            },
        },
    )))
}

async fn is_collection(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(params): Query<CollectionVodQuery>,
) -> ApiResult<Json<ApiResponse<i32>>> {
    let collected = load_collection(&state, user.id)
        .await?
        .map(|c| collection_list::contains(&c.movdetail_id_list, params.vod_id))
        .unwrap_or(false);

    if collected {
        Ok(Json(ApiResponse::ok("Video is in your collection", 1)))
    } else {
        Ok(Json(ApiResponse::ok("Video is not in your collection", 0)))
    }
}

/// Creates the user's row if missing so there is always something to lock.
const ENSURE_COLLECTION_SQL: &str = "INSERT INTO user_collections (user_id, movdetail_id_list) \
     VALUES ($1, '') ON CONFLICT (user_id) DO NOTHING";

/// Serializes concurrent edits of one user's id list.
const LOCK_COLLECTION_SQL: &str =
    "SELECT id, user_id, movdetail_id_list FROM user_collections WHERE user_id = $1 FOR UPDATE";

async fn add_collection(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<CollectionChange>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let mut tx = state.pool.begin().await.map_err(db_error)?;

    sqlx::query(ENSURE_COLLECTION_SQL)
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    let current = sqlx::query_as::<_, UserCollection>(LOCK_COLLECTION_SQL)
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

    let Some(updated) = collection_list::add(&current.movdetail_id_list, payload.vod_id) else {
        tx.commit().await.map_err(db_error)?;
        return Ok(Json(ApiResponse::message("Video already collected")));
    };

    sqlx::query("UPDATE user_collections SET movdetail_id_list = $1 WHERE id = $2")
        .bind(&updated)
        .bind(current.id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::info!("User {} collected vod {}", user.id, payload.vod_id);
    Ok(Json(ApiResponse::message("Video collected")))
}

async fn remove_collection(
    Extension(state): Extension<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(payload): Json<CollectionChange>,
) -> ApiResult<Json<ApiResponse<Vec<i32>>>> {
    let mut tx = state.pool.begin().await.map_err(db_error)?;

    let current = sqlx::query_as::<_, UserCollection>(LOCK_COLLECTION_SQL)
        .bind(user.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .ok_or_else(|| bad_request("You have no collected videos"))?;

    let (updated, remaining) = collection_list::remove(&current.movdetail_id_list, payload.vod_id);

    sqlx::query("UPDATE user_collections SET movdetail_id_list = $1 WHERE id = $2")
        .bind(&updated)
        .bind(current.id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::info!("User {} removed vod {} from collection", user.id, payload.vod_id);
    Ok(Json(ApiResponse::ok("Video removed from collection", remaining)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_edits_lock_the_row() {
        assert!(LOCK_COLLECTION_SQL.ends_with("FOR UPDATE"));
        assert!(LOCK_COLLECTION_SQL.contains("WHERE user_id = $1"));
        // seeding never overwrites an existing list
        assert!(ENSURE_COLLECTION_SQL.contains("ON CONFLICT (user_id) DO NOTHING"));
    }

    #[test]
    fn test_sequential_adds_keep_every_id() {
        let first = collection_list::add("", 7).unwrap();
        let second = collection_list::add(&first, 9).unwrap();
        assert_eq!(collection_list::parse_ids(&second), vec![7, 9]);
        assert!(collection_list::add(&second, 7).is_none());
    }
}
