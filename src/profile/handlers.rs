use axum::{extract::State, routing::get, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        services::{check_email, normalize_email},
        AuthUser,
    },
    error::{ApiError, ApiResult},
    extract::AppJson,
    state::AppState,
    users::{repo_types::ProfilePatch, repo_types::User},
};

use super::dto::UpdateProfileRequest;

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/user/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<User>> {
    match state.store.find_by_id(user.id).await? {
        Some(u) => Ok(Json(u)),
        None => {
            warn!(user_id = %user.id, email = %user.email, "profile requested for unknown user");
            Err(ApiError::UserNotFound)
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let mut patch = ProfilePatch::from(payload);
    if let Some(email) = patch.email.take() {
        let email = normalize_email(&email);
        check_email(&email)?;
        patch.email = Some(email);
    }

    let updated = state.store.update_profile(user.id, patch).await?;
    info!(user_id = %updated.id, token_email = %user.email, email = %updated.email, "profile updated");
    Ok(Json(updated))
}
