/**
 * Signup Handlers
 *
 * `POST /api/auth/signup` and `POST /api/auth/signup/verify`.
 *
 * # Flow
 *
 * 1. Validate email and password, check reCAPTCHA when configured
 * 2. Reject emails that already have an account
 * 3. Hash the password, mail a six digit code, keep a pending signup for two minutes
 * 4. Reply with a `signup-id` cookie scoped to the verify endpoint
 * 5. Verify consumes the pending signup, checks the code and creates the user
 */
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use bcrypt::{hash, DEFAULT_COST};

use crate::backend::auth::handlers::types::{
    normalize_email, AuthResponse, SignupRequest, SignupResponse, VerifyRequest,
};
use crate::backend::auth::users::{create_user, get_user_by_email};
use crate::backend::auth::verification::{generate_code, signup_cookie, signup_id_from_headers};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Message returned once the code has been mailed
pub const CODE_SENT_MESSAGE: &str = "Message with confirmation code has been sent successfully";

/// Signup handler
///
/// # Errors
///
/// * `400 Bad Request` - invalid fields, failed reCAPTCHA, email already registered
/// * `502 Bad Gateway` - reCAPTCHA service unreachable
/// * `503 Service Unavailable` - database not configured
/// * `500 Internal Server Error` - hashing or mail delivery failed
///
/// # Example Request
///
/// ```http
/// POST /api/auth/signup HTTP/1.1
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "securepassword123" }
/// ```
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<impl IntoResponse, BackendError> {
    if let Some(err) = BackendError::fields(request.validate()) {
        return Err(err);
    }

    if let (Some(token), Some(verifier)) = (request.grecaptcha.as_deref(), state.recaptcha.as_ref()) {
        let human = verifier.verify(token).await.map_err(|e| {
            tracing::error!(error = %e, "reCAPTCHA verification request failed");
            BackendError::handler(StatusCode::BAD_GATEWAY, "reCAPTCHA verification unavailable")
        })?;
        if !human {
            return Err(BackendError::field("grecaptcha", "reCAPTCHA verification failed"));
        }
    }

    let pool = state.require_db()?;
    let email = normalize_email(&request.email);
    if get_user_by_email(pool, &email).await?.is_some() {
        tracing::info!(%email, "Signup for an existing account");
        return Err(BackendError::field("email", "Email is already registered"));
    }

    let password_hash = hash(&request.password, DEFAULT_COST)?;
    let code = generate_code();
    state.mailer.send_code(&email, code).await?;

    let signup_id = state.signups.insert(email.clone(), password_hash, code);
    tracing::info!(%email, %signup_id, "Signup pending verification");

    let cookie = signup_cookie(signup_id, state.signups.ttl());
    Ok((
        [(SET_COOKIE, cookie)],
        Json(SignupResponse {
            status_code: StatusCode::OK.as_u16(),
            message: CODE_SENT_MESSAGE.to_string(),
        }),
    ))
}

/// Verification handler
///
/// The pending signup is consumed on lookup, so a wrong code means starting
/// over with a new signup request.
///
/// # Errors
///
/// * `400 Bad Request` - missing cookie, expired signup, wrong code
/// * `503 Service Unavailable` - database not configured
pub async fn verify_signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    let signup_id = signup_id_from_headers(&headers)
        .ok_or_else(|| BackendError::field("code", "Signup session not found"))?;
    let pending = state
        .signups
        .take(signup_id)
        .ok_or_else(|| BackendError::field("code", "Verification code has expired"))?;
    if pending.code != request.code {
        tracing::warn!(%signup_id, "Incorrect verification code");
        return Err(BackendError::field("code", "Incorrect verification code"));
    }

    let pool = state.require_db()?;
    let user = match create_user(pool, &pending.email, &pending.password_hash).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(BackendError::field("email", "Email is already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    let access_token = state.issue_token(&user)?;
    tracing::info!(user_id = %user.id, email = %user.email, "User created");

    Ok(Json(AuthResponse {
        user: user.into(),
        access_token,
    }))
}
