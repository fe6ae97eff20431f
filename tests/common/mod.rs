//! Common test utilities and helpers
//!
//! - Application state and tokens without a database
//! - A recording writer that stands in for a client's socket
//! - Custom assertion macros

#![allow(dead_code)]

pub mod assertions;
pub mod clients;

pub use clients::*;

use axum::{body::Body, http::Request, response::Response};
use uuid::Uuid;

use chatline::backend::auth::sessions::ACCESS_USER;
use chatline::backend::server::{AppState, ServerConfig};

/// State with default configuration, no database and in-memory chat storage
pub fn test_state() -> AppState {
    AppState::new(ServerConfig::default(), None)
}

/// Session token for `user_id` with the given access role
pub fn token_for(state: &AppState, user_id: Uuid, access: &str) -> String {
    state
        .sessions
        .create_token(user_id, &format!("{user_id}@example.com"), access)
        .expect("Failed to create test token")
}

/// Session token for an ordinary user
pub fn user_token(state: &AppState, user_id: Uuid) -> String {
    token_for(state, user_id, ACCESS_USER)
}

/// Request with an optional bearer token and optional JSON body
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}

/// Pool for the disposable database in `DATABASE_URL`, migrated to the latest schema
pub async fn database_pool() -> sqlx::PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&url).await.expect("Failed to connect to database");
    sqlx::migrate!().run(&pool).await.expect("Failed to run migrations");
    pool
}

/// An email address no other test run uses
pub fn unique_email() -> String {
    format!("test_{}@example.com", Uuid::new_v4())
}
