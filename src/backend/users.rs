//! Users API
//!
//! - `GET /api/users` - every account, admins only
//! - `GET /api/users/{id}` - one account, self or admin
//! - `PATCH /api/users/{id}` - profile fields, self or admin
//!
//! Account storage lives in `auth::users`; these handlers only add access
//! checks on top.

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::auth::handlers::types::UserResponse;
use crate::backend::auth::users::{self, ProfileUpdate};
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;

/// `GET /api/users`
pub async fn list_users(
    AuthUser(user): AuthUser,
    State(pool): State<Option<PgPool>>,
) -> Result<Json<Vec<UserResponse>>, BackendError> {
    if !user.is_admin() {
        tracing::warn!(user_id = %user.user_id, "Non-admin asked for the user list");
        return Err(BackendError::Forbidden);
    }
    let pool = pool.ok_or_else(BackendError::no_database)?;
    let all = users::list_users(&pool).await?;
    Ok(Json(all.into_iter().map(UserResponse::from).collect()))
}

/// `GET /api/users/{id}`
pub async fn get_user(
    AuthUser(user): AuthUser,
    State(pool): State<Option<PgPool>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, BackendError> {
    if !user.can_manage(user_id) {
        return Err(BackendError::Forbidden);
    }
    let pool = pool.ok_or_else(BackendError::no_database)?;
    users::get_user_by_id(&pool, user_id)
        .await?
        .map(|record| Json(record.into()))
        .ok_or_else(|| BackendError::NotFound("User".to_string()))
}

/// `PATCH /api/users/{id}`
pub async fn update_user(
    AuthUser(user): AuthUser,
    State(pool): State<Option<PgPool>>,
    Path(user_id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, BackendError> {
    if !user.can_manage(user_id) {
        return Err(BackendError::Forbidden);
    }
    let pool = pool.ok_or_else(BackendError::no_database)?;
    let record = users::update_profile(&pool, user_id, &update)
        .await?
        .ok_or_else(|| BackendError::NotFound("User".to_string()))?;
    tracing::info!(%user_id, by = %user.user_id, "Profile updated");
    Ok(Json(record.into()))
}
