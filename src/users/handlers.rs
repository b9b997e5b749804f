use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{is_valid_email, PublicUser},
        extractors::AuthUser,
    },
    error::ApiError,
    state::AppState,
    users::dto::{Pagination, UserUpdate},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    // Negative paging values collapse to zero before they reach the store.
    let users = state
        .store
        .list(pagination.limit.max(0), pagination.offset.max(0))
        .await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .store
        .find_by_id(id)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<PublicUser>, ApiError> {
    let mut user = state
        .store
        .find_by_id(id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(ApiError::Validation("Invalid email".into()));
        }
        if email != user.email {
            if state.store.find_by_email(&email).await?.is_some() {
                warn!(email = %email, "email already registered");
                return Err(ApiError::DuplicateEmail);
            }
            user.email = email;
        }
    }
    if let Some(first_name) = payload.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = payload.last_name {
        user.last_name = last_name;
    }

    state.store.update(&user).await?;
    info!(user_id = %user.id, "user updated");
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(id).await?;
    info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
