/**
 * Account API Routes
 *
 * ## Authentication
 * - `POST /api/auth/signup` - Start signup, mails a verification code
 * - `POST /api/auth/signup/verify` - Finish signup with the code
 * - `POST /api/auth/login` - Email/password login
 * - `GET /api/auth/me` - Current user (requires authentication)
 *
 * ## Users
 * - `GET /api/users` - All users (admin)
 * - `GET /api/users/{id}` - One user (self or admin)
 * - `PATCH /api/users/{id}` - Update profile (self or admin)
 */

use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::auth::{get_me, login, signup, verify_signup};
use crate::backend::server::state::AppState;
use crate::backend::users::{get_user, list_users, update_user};

/// Add the account routes to `router`
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/signup/verify", post(verify_signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(get_me))
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user).patch(update_user))
}
