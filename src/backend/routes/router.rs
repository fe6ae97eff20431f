/**
 * Router Configuration
 *
 * # Route Order
 *
 * 1. Chat routes (WebSocket, chat listings)
 * 2. Account routes (auth, users)
 * 3. Fallback: files from the static directory, `index.html` for anything
 *    else so the SPA can handle client-side routes
 *
 * # Layers
 *
 * - `identity_guard` attaches the caller's identity when a valid token is present
 * - CORS for the configured origins, with credentials
 * - HTTP request tracing
 */

use std::path::Path;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::backend::middleware::auth::identity_guard;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::chat_routes::configure_chat_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new();
    let router = configure_chat_routes(router);
    let router = configure_api_routes(router);

    let router = router.fallback_service(spa_service(&app_state.config.static_dir));

    router
        .layer(from_fn_with_state(app_state.clone(), identity_guard))
        .layer(cors_layer(&app_state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Static files with `index.html` as the fallback
fn spa_service(static_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")))
}

/// CORS for the configured origins; invalid origins are skipped
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}
