/**
 * Application State Management
 *
 * `AppState` is the central state container handed to every handler. The
 * `FromRef` implementations let handlers extract only the part they need,
 * e.g. `State<Option<PgPool>>` or `State<DeliveryCoordinator>`.
 *
 * # Contents
 *
 * - configuration
 * - optional PostgreSQL pool (`None` when the database is not configured)
 * - session keys for signing and verifying tokens
 * - the delivery coordinator, which owns the connection registry and the
 *   message store
 * - pending signups, mailer and optional reCAPTCHA verifier
 *
 * Everything is cheap to clone; shared mutable pieces sit behind `Arc`.
 */

use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode};
use sqlx::PgPool;

use crate::backend::auth::mail::{LogMailer, Mailer, SmtpMailer};
use crate::backend::auth::recaptcha::RecaptchaVerifier;
use crate::backend::auth::sessions::SessionKeys;
use crate::backend::auth::users::User;
use crate::backend::auth::verification::PendingSignups;
use crate::backend::chat::{MemoryMessageStore, MessageStore, PgMessageStore};
use crate::backend::error::BackendError;
use crate::backend::realtime::{ConnectionRegistry, DeliveryCoordinator};
use crate::backend::server::config::ServerConfig;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,

    /// Database connection pool
    ///
    /// `None` if `DATABASE_URL` is not configured or the connection failed.
    /// Account endpoints answer 503 in that case; chat endpoints fall back to
    /// the in-memory store.
    pub db_pool: Option<PgPool>,

    pub sessions: SessionKeys,

    /// Live connections and message persistence
    pub realtime: DeliveryCoordinator,

    pub signups: Arc<PendingSignups>,

    pub mailer: Arc<dyn Mailer>,

    /// Set when `RECAPTCHA_SECRET` is configured
    pub recaptcha: Option<RecaptchaVerifier>,
}

impl AppState {
    /// Build state from configuration and an optional pool
    ///
    /// Picks the Postgres message store when a pool is available, the
    /// in-memory store otherwise, and SMTP mail when configured.
    pub fn new(config: ServerConfig, db_pool: Option<PgPool>) -> Self {
        let store: Arc<dyn MessageStore> = match &db_pool {
            Some(pool) => Arc::new(PgMessageStore::new(pool.clone())),
            None => {
                tracing::warn!("Chat messages are kept in memory only");
                Arc::new(MemoryMessageStore::new())
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.mail {
            Some(mail) => match SmtpMailer::new(mail) {
                Ok(mailer) => Arc::new(mailer),
                Err(e) => {
                    tracing::error!(error = %e, "Invalid SMTP configuration, logging codes instead");
                    Arc::new(LogMailer)
                }
            },
            None => Arc::new(LogMailer),
        };

        let recaptcha = config.recaptcha_secret.as_deref().map(RecaptchaVerifier::new);
        let sessions = SessionKeys::new(&config.jwt_secret, config.jwt_ttl());

        Self {
            config: Arc::new(config),
            db_pool,
            sessions,
            realtime: DeliveryCoordinator::new(Arc::new(ConnectionRegistry::new()), store),
            signups: Arc::new(PendingSignups::default()),
            mailer,
            recaptcha,
        }
    }

    /// Replace the message store
    pub fn with_message_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.realtime = DeliveryCoordinator::new(self.realtime.registry().clone(), store);
        self
    }

    /// Replace the mailer
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Replace the pending signup store
    pub fn with_signups(mut self, signups: Arc<PendingSignups>) -> Self {
        self.signups = signups;
        self
    }

    /// The database pool, or 503 when none is configured
    pub fn require_db(&self) -> Result<&PgPool, BackendError> {
        self.db_pool.as_ref().ok_or_else(|| {
            tracing::error!("Database not configured");
            BackendError::no_database()
        })
    }

    /// Session token for a freshly authenticated user
    pub fn issue_token(&self, user: &User) -> Result<String, BackendError> {
        self.sessions
            .create_token(user.id, &user.email, &user.access)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create token");
                BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
            })
    }
}

impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for DeliveryCoordinator {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.realtime.clone()
    }
}
