/**
 * Get Current User Handler
 *
 * `GET /api/auth/me` returns the account behind the request's token.
 */

use axum::{extract::State, response::Json};
use sqlx::PgPool;

use crate::backend::auth::handlers::types::UserResponse;
use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;

/// # Errors
///
/// * `401 Unauthorized` - no valid token
/// * `404 Not Found` - the token's user no longer exists
/// * `503 Service Unavailable` - database not configured
pub async fn get_me(
    AuthUser(user): AuthUser,
    State(pool): State<Option<PgPool>>,
) -> Result<Json<UserResponse>, BackendError> {
    let pool = pool.ok_or_else(BackendError::no_database)?;
    let record = get_user_by_id(&pool, user.user_id)
        .await?
        .ok_or_else(|| BackendError::NotFound("User".to_string()))?;
    Ok(Json(record.into()))
}
