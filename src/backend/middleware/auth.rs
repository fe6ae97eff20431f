/**
 * Authentication Middleware
 *
 * `identity_guard` runs for every request. When the request carries a valid
 * session token, from the `Authorization: Bearer` header or a `token` query
 * parameter, it attaches an `AuthenticatedUser` to the request extensions.
 * Requests without one pass through untouched; handlers that need an
 * identity ask for it with the `AuthUser` extractor, which rejects with 401.
 */

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::auth::sessions::{SessionKeys, ACCESS_ADMIN};
use crate::backend::error::BackendError;

/// Authenticated user data extracted from the session token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub access: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.access == ACCESS_ADMIN
    }

    /// Allowed to act on `user_id`'s account: the user themself or an admin
    pub fn can_manage(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.is_admin()
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Token from `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Token from `?token=<token>`, used by browser WebSocket clients
fn query_token(uri: &Uri) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
}

/// Identity middleware
///
/// Never rejects a request. An invalid token is logged and treated as no
/// token at all.
pub async fn identity_guard(
    State(sessions): State<SessionKeys>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).or_else(|| query_token(request.uri()));

    if let Some(token) = token {
        match sessions.verify_token(&token) {
            Ok(claims) => match claims.user_id() {
                Some(user_id) => {
                    request.extensions_mut().insert(AuthenticatedUser {
                        user_id,
                        email: claims.email,
                        access: claims.access,
                    });
                }
                None => tracing::warn!(sub = %claims.sub, "Token subject is not a user id"),
            },
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid session token"),
        }
    }

    next.run(request).await
}

/// Axum extractor for the authenticated user
///
/// Rejects with `401 Unauthorized` when `identity_guard` found no identity.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or(BackendError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
    use std::time::Duration;
    use tower::ServiceExt;

    fn keys() -> SessionKeys {
        SessionKeys::new("middleware-secret", Duration::from_secs(60))
    }

    async fn whoami(AuthUser(user): AuthUser) -> String {
        user.user_id.to_string()
    }

    fn app(keys: SessionKeys) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(keys, identity_guard))
    }

    async fn call(app: Router, request: axum::http::Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_bearer_token_identifies_user() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.create_token(user_id, "a@example.com", "USER").unwrap();
        let request = axum::http::Request::get("/whoami")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(app(keys), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user_id.to_string());
    }

    #[tokio::test]
    async fn test_query_token_identifies_user() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.create_token(user_id, "a@example.com", "USER").unwrap();
        let request = axum::http::Request::get(format!("/whoami?token={token}"))
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(app(keys), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user_id.to_string());
    }

    #[tokio::test]
    async fn test_missing_or_invalid_token_is_unauthorized() {
        let request = axum::http::Request::get("/whoami").body(Body::empty()).unwrap();
        let (status, _) = call(app(keys()), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = axum::http::Request::get("/whoami")
            .header(AUTHORIZATION, "Bearer invalid.token.here")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app(keys()), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("Authentication required"));
    }

    #[test]
    fn test_can_manage_self_or_as_admin() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "a@example.com".into(),
            access: "USER".into(),
        };
        assert!(user.can_manage(user.user_id));
        assert!(!user.can_manage(Uuid::new_v4()));

        let admin = AuthenticatedUser { access: ACCESS_ADMIN.into(), ..user };
        assert!(admin.can_manage(Uuid::new_v4()));
    }
}
