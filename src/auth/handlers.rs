use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, PublicUser, RefreshRequest, SigninRequest, SignupRequest, SignupResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        services::{check_email, check_password, normalize_email, require_all},
    },
    error::{ApiError, ApiResult},
    extract::AppJson,
    state::AppState,
    users::{repo_types::NewUser, repo_types::User, StoreError},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/refresh", post(refresh))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupResponse>)> {
    let password = payload.password.filter(|p| !p.trim().is_empty());
    let [first_name, last_name, email, _] = require_all([
        ("firstName", payload.first_name),
        ("lastName", payload.last_name),
        ("email", payload.email),
        ("password", password.clone()),
    ])?;
    let password = password.unwrap_or_default();
    let email = normalize_email(&email);

    // Duplicate wins over every other validation failure.
    if state.store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::DuplicateEmail);
    }

    check_email(&email)?;
    check_password(&password)?;

    let password_hash = hash_password(&password)?;
    let user = match state
        .store
        .insert(NewUser {
            first_name,
            last_name,
            email,
            password_hash,
        })
        .await
    {
        Ok(u) => u,
        Err(StoreError::DuplicateEmail) => {
            warn!("email registered concurrently");
            return Err(ApiError::DuplicateEmail);
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully",
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SigninRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let password = payload.password.filter(|p| !p.is_empty());
    let [email, _] = require_all([("email", payload.email), ("password", password.clone())])?;
    let password = password.unwrap_or_default();
    let email = normalize_email(&email);

    let Some(user) = state.store.find_by_email(&email).await? else {
        warn!(email = %email, "signin unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "signin invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let response = issue_pair(&state, &user, "Login successful")?;
    info!(user_id = %user.id, email = %user.email, "user signed in");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let [token] = require_all([("refreshToken", payload.refresh_token)])?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::InvalidRefreshToken
    })?;

    let Some(user) = state.store.find_by_id(claims.sub).await? else {
        warn!(user_id = %claims.sub, "refresh for unknown user");
        return Err(ApiError::InvalidRefreshToken);
    };

    Ok(Json(issue_pair(&state, &user, "Token refreshed")?))
}

fn issue_pair(state: &AppState, user: &User, message: &'static str) -> ApiResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    Ok(AuthResponse {
        message,
        token: keys.sign_access(user.id, &user.email)?,
        refresh_token: keys.sign_refresh(user.id, &user.email)?,
        user: PublicUser::from(user),
    })
}
