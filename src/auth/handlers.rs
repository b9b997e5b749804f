use axum::{
    extract::{FromRef, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            is_valid_email, AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse,
            PublicUser, RegisterRequest, MIN_PASSWORD_LEN,
        },
        extractors::Bearer,
        services::AuthService,
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/change-password", patch(change_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.username.trim().is_empty() {
        warn!("empty username");
        return Err(ApiError::Validation("Username must not be empty".into()));
    }

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    let auth = AuthService::from_ref(&state);
    let (user, access_token) = auth.register(payload).await?;
    Ok(Json(AuthResponse::bearer(
        PublicUser::from(user),
        access_token,
    )))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let auth = AuthService::from_ref(&state);
    let (user, access_token) = auth.login(&payload.username, &payload.password).await?;
    Ok(Json(AuthResponse::bearer(
        PublicUser::from(user),
        access_token,
    )))
}

#[instrument(skip(state, token))]
pub async fn get_me(
    State(state): State<AppState>,
    Bearer(token): Bearer,
) -> Result<Json<PublicUser>, ApiError> {
    let auth = AuthService::from_ref(&state);
    let user = auth.current_user(&token).await?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, token, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Bearer(token): Bearer,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.new_password.len() < MIN_PASSWORD_LEN {
        warn!("new password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    let auth = AuthService::from_ref(&state);
    auth.change_password(&token, &payload.old_password, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password updated".into(),
    }))
}
