use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    extract::AppJson,
    state::AppState,
    users::repo_types::{Collection, Item},
};

use super::dto::{CreateAddress, CreateHistoryItem, CreateWishlistItem, DeletedResponse, NewItem};

pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/user/wishlist", get(list_wishlist).post(create_wishlist))
        .route("/user/wishlist/:id", delete(delete_wishlist))
        .route("/user/history", get(list_history).post(create_history))
        .route("/user/history/:id", delete(delete_history))
        .route("/user/addresses", get(list_addresses).post(create_address))
        .route("/user/addresses/:id", delete(delete_address))
}

// --- shared ---

async fn list(state: &AppState, user: &AuthUser, collection: Collection) -> ApiResult<Json<Vec<Item>>> {
    Ok(Json(state.store.list_items(user.id, collection).await?))
}

async fn create(
    state: &AppState,
    user: &AuthUser,
    body: impl NewItem,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let item = body.into_item(OffsetDateTime::now_utc())?;
    let item = state.store.append_item(user.id, item).await?;
    info!(user_id = %user.id, email = %user.email, item_id = %item.id(), collection = ?item.collection(), "item added");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn remove(
    state: &AppState,
    user: &AuthUser,
    collection: Collection,
    raw_id: &str,
) -> ApiResult<Json<DeletedResponse>> {
    // A malformed id can't name an existing item.
    let Ok(item_id) = Uuid::parse_str(raw_id) else {
        warn!(user_id = %user.id, id = %raw_id, "delete with malformed item id");
        return Err(ApiError::NotFound(format!("{} not found", collection.label())));
    };
    state.store.remove_item(user.id, collection, item_id).await?;
    info!(user_id = %user.id, email = %user.email, %item_id, ?collection, "item deleted");
    Ok(Json(DeletedResponse {
        message: format!("{} deleted successfully", collection.label()),
    }))
}

// --- wishlist ---

#[instrument(skip(state))]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Item>>> {
    list(&state, &user, Collection::Wishlist).await
}

#[instrument(skip(state, payload))]
pub async fn create_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateWishlistItem>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    create(&state, &user, payload).await
}

#[instrument(skip(state))]
pub async fn delete_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    remove(&state, &user, Collection::Wishlist, &id).await
}

// --- travel history ---

#[instrument(skip(state))]
pub async fn list_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Item>>> {
    list(&state, &user, Collection::History).await
}

#[instrument(skip(state, payload))]
pub async fn create_history(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateHistoryItem>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    create(&state, &user, payload).await
}

#[instrument(skip(state))]
pub async fn delete_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    remove(&state, &user, Collection::History, &id).await
}

// --- addresses ---

#[instrument(skip(state))]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Item>>> {
    list(&state, &user, Collection::Addresses).await
}

#[instrument(skip(state, payload))]
pub async fn create_address(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateAddress>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    create(&state, &user, payload).await
}

#[instrument(skip(state))]
pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    remove(&state, &user, Collection::Addresses, &id).await
}
