/**
 * Login Handler
 *
 * `POST /api/auth/login`. Unknown emails and wrong passwords are reported as
 * field errors on `email` and `password` respectively.
 */
use axum::{extract::State, response::Json};
use bcrypt::verify;

use crate::backend::auth::handlers::types::{normalize_email, AuthResponse, LoginRequest};
use crate::backend::auth::users::get_user_by_email;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Login handler
///
/// # Errors
///
/// * `400 Bad Request` - unknown email or incorrect password
/// * `503 Service Unavailable` - database not configured
///
/// # Example Response
///
/// ```json
/// {
///   "user": { "id": "123e4567-e89b-12d3-a456-426614174000", "email": "user@example.com", "access": "USER" },
///   "accessToken": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9..."
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    let pool = state.require_db()?;
    let email = normalize_email(&request.email);

    let user = get_user_by_email(pool, &email).await?.ok_or_else(|| {
        tracing::warn!(%email, "Login for unknown email");
        BackendError::field("email", "Email does not exist")
    })?;

    if !verify(&request.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Invalid password");
        return Err(BackendError::field("password", "Incorrect password"));
    }

    let access_token = state.issue_token(&user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        user: user.into(),
        access_token,
    }))
}
