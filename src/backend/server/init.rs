/**
 * Server Initialization
 *
 * 1. Connect to the database when one is configured
 * 2. Build `AppState`
 * 3. Start the pending-signup purge task
 * 4. Create the router
 */

use std::time::Duration;

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// How often expired pending signups are dropped
pub const SIGNUP_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Create and configure the Axum application
///
/// A missing or unreachable database does not prevent startup; the server
/// then runs with in-memory chat storage and without account endpoints.
pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("Initializing chat backend");

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    let db_pool = load_database(config.database_url.as_deref()).await;
    let app_state = AppState::new(config, db_pool);

    spawn_signup_purge(&app_state);

    let app = create_router(app_state);
    tracing::info!("Router configured");
    app
}

/// Periodically drop expired pending signups
fn spawn_signup_purge(app_state: &AppState) {
    let signups = app_state.signups.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SIGNUP_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = signups.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, "Purged expired pending signups");
            }
        }
    });
}
