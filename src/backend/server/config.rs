/**
 * Server Configuration
 *
 * `ServerConfig` is assembled from, in increasing priority:
 *
 * 1. built-in defaults suitable for local development
 * 2. an optional TOML file (`--config <path>`)
 * 3. environment variables (a `.env` file is loaded first by the binary)
 * 4. command line flags (`--port`), applied by the binary
 *
 * # Environment Variables
 *
 * | Variable           | Field                |
 * |--------------------|----------------------|
 * | `SERVER_PORT`      | `port`               |
 * | `DATABASE_URL`     | `database_url`       |
 * | `JWT_SECRET`       | `jwt_secret`         |
 * | `JWT_TTL_SECS`     | `jwt_ttl_secs`       |
 * | `STATIC_DIR`       | `static_dir`         |
 * | `CORS_ORIGINS`     | `cors_origins` (comma separated) |
 * | `MAIL_HOST`        | `mail.host`          |
 * | `MAIL_PORT`        | `mail.port`          |
 * | `MAIL_LOGIN`       | `mail.login`         |
 * | `MAIL_PASSWORD`    | `mail.password`      |
 * | `RECAPTCHA_SECRET` | `recaptcha_secret`   |
 *
 * # Database
 *
 * The database stays optional: `load_database` logs failures and returns
 * `None`, and the server keeps running without database features.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

/// Secret used when `JWT_SECRET` is not provided. Fine for local runs only.
pub const DEV_JWT_SECRET: &str = "chatline-dev-secret-change-me";

/// Default session lifetime, 30 days
pub const DEFAULT_JWT_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// SMTP settings for mailing verification codes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MailConfig {
    pub host: String,
    #[serde(default = "default_mail_port")]
    pub port: u16,
    /// SMTP login, also used as the sender address
    pub login: String,
    pub password: String,
}

fn default_mail_port() -> u16 {
    587
}

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_secs: u64,
    /// SPA bundle and uploaded files
    pub static_dir: PathBuf,
    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Vec<String>,
    pub mail: Option<MailConfig>,
    pub recaptcha_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_ttl_secs: DEFAULT_JWT_TTL_SECS,
            static_dir: PathBuf::from(".static"),
            cors_origins: vec!["http://localhost:8000".to_string()],
            mail: None,
            recaptcha_secret: None,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&source)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style lookups
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = get("SERVER_PORT") {
            self.port = parse_value("SERVER_PORT", &port)?;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(ttl) = get("JWT_TTL_SECS") {
            self.jwt_ttl_secs = parse_value("JWT_TTL_SECS", &ttl)?;
        }
        if let Some(dir) = get("STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(secret) = get("RECAPTCHA_SECRET") {
            self.recaptcha_secret = Some(secret);
        }

        if let Some(host) = get("MAIL_HOST") {
            let port = match get("MAIL_PORT") {
                Some(port) => parse_value("MAIL_PORT", &port)?,
                None => self.mail.as_ref().map_or_else(default_mail_port, |m| m.port),
            };
            let login = get("MAIL_LOGIN")
                .or_else(|| self.mail.as_ref().map(|m| m.login.clone()))
                .ok_or(ConfigError::Missing("MAIL_LOGIN"))?;
            let password = get("MAIL_PASSWORD")
                .or_else(|| self.mail.as_ref().map(|m| m.password.clone()))
                .ok_or(ConfigError::Missing("MAIL_PASSWORD"))?;
            self.mail = Some(MailConfig {
                host,
                port,
                login,
                password,
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.jwt_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_TTL_SECS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn jwt_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt_ttl_secs)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Connect to PostgreSQL and run migrations
///
/// # Returns
///
/// - `Some(PgPool)` if the database is reachable
/// - `None` if no URL is configured or connecting fails
///
/// Migration failures are logged and the pool is still returned, since the
/// schema may already be current.
pub async fn load_database(database_url: Option<&str>) -> Option<PgPool> {
    let Some(database_url) = database_url else {
        tracing::warn!("DATABASE_URL not set. Database features will be disabled.");
        return None;
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Database features will be disabled.");
            return None;
        }
    };

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(()) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}
