//! Signup verification codes.
//!
//! Signup is two requests. The first stores a [`PendingSignup`] under a random
//! signup id, mails a six digit code and hands the id back in a short-lived
//! cookie scoped to the verify endpoint. The second presents the cookie and
//! the code; the pending entry is consumed whether or not the code matches.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::http::{header::COOKIE, HeaderMap};
use rand::Rng;
use uuid::Uuid;

/// Cookie carrying the signup id between the two signup requests
pub const SIGNUP_COOKIE: &str = "signup-id";

/// Path the signup cookie is scoped to
pub const VERIFY_PATH: &str = "/api/auth/signup/verify";

/// How long a pending signup (and its cookie) stays valid
pub const SIGNUP_TTL: Duration = Duration::from_secs(120);

/// Random code in `100000..=999999`
pub fn generate_code() -> u32 {
    rand::thread_rng().gen_range(100_000..=999_999)
}

/// `Set-Cookie` value for a signup id
pub fn signup_cookie(signup_id: Uuid, ttl: Duration) -> String {
    format!(
        "{SIGNUP_COOKIE}={signup_id}; Path={VERIFY_PATH}; Max-Age={}; HttpOnly; SameSite=Lax",
        ttl.as_secs()
    )
}

/// Read the signup id from the request's `Cookie` headers
pub fn signup_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SIGNUP_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// A signup waiting for its code
#[derive(Debug, Clone)]
pub struct PendingSignup {
    pub email: String,
    pub password_hash: String,
    pub code: u32,
    expires_at: Instant,
}

impl PendingSignup {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-memory pending signups with expiry
#[derive(Debug)]
pub struct PendingSignups {
    entries: Mutex<HashMap<Uuid, PendingSignup>>,
    ttl: Duration,
}

impl Default for PendingSignups {
    fn default() -> Self {
        Self::new(SIGNUP_TTL)
    }
}

impl PendingSignups {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, PendingSignup>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a signup and return its id
    pub fn insert(&self, email: String, password_hash: String, code: u32) -> Uuid {
        let id = Uuid::new_v4();
        let signup = PendingSignup {
            email,
            password_hash,
            code,
            expires_at: Instant::now() + self.ttl,
        };
        self.lock().insert(id, signup);
        id
    }

    /// Remove and return a signup if it has not expired
    pub fn take(&self, id: Uuid) -> Option<PendingSignup> {
        self.lock()
            .remove(&id)
            .filter(|signup| !signup.is_expired(Instant::now()))
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, signup| !signup.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_generated_codes_have_six_digits() {
        for _ in 0..1000 {
            let code = generate_code();
            assert!((100_000..=999_999).contains(&code), "{code}");
        }
    }

    #[test]
    fn test_take_consumes_entry() {
        let signups = PendingSignups::default();
        let id = signups.insert("a@example.com".into(), "hash".into(), 123456);

        let signup = signups.take(id).unwrap();
        assert_eq!(signup.email, "a@example.com");
        assert_eq!(signup.code, 123456);
        assert!(signups.take(id).is_none());
    }

    #[test]
    fn test_expired_entries_are_not_returned() {
        let signups = PendingSignups::new(Duration::ZERO);
        let id = signups.insert("a@example.com".into(), "hash".into(), 123456);
        assert!(signups.take(id).is_none());

        signups.insert("b@example.com".into(), "hash".into(), 654321);
        assert_eq!(signups.purge_expired(), 1);
        assert!(signups.is_empty());
    }

    #[test]
    fn test_cookie_round_trip() {
        let id = Uuid::new_v4();
        let cookie = signup_cookie(id, SIGNUP_TTL);
        assert!(cookie.contains("Path=/api/auth/signup/verify"));
        assert!(cookie.contains("Max-Age=120"));

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SIGNUP_COOKIE}={id}")).unwrap(),
        );
        assert_eq!(signup_id_from_headers(&headers), Some(id));
        assert_eq!(signup_id_from_headers(&HeaderMap::new()), None);
    }
}
